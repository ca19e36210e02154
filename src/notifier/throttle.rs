use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Suppresses repeats of the same key within a time window.
pub struct Throttle {
    window: Duration,
    last_seen: Mutex<HashMap<String, Instant>>,
}

impl Throttle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `true` and records the key if it was not seen within the window.
    pub fn allow(&self, key: &str) -> bool {
        if self.window.is_zero() {
            return true;
        }

        let now = Instant::now();
        // A panic while holding this lock leaves only timestamps behind
        let mut last_seen = self
            .last_seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(previous) = last_seen.get(key)
            && now.duration_since(*previous) < self.window
        {
            return false;
        }

        last_seen.retain(|_, seen| now.duration_since(*seen) < self.window);
        last_seen.insert(key.to_string(), now);
        true
    }
}
