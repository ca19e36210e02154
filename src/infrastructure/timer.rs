use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Single-shot, cancellable reconnect timer.
///
/// At most one delay is pending; scheduling again replaces it.
#[derive(Default)]
pub struct RetryTimer {
    pending: Option<JoinHandle<()>>,
}

impl RetryTimer {
    pub fn new() -> Self {
        Self { pending: None }
    }

    /// Runs `on_fire` after `delay` unless cancelled first
    pub fn schedule<F>(&mut self, delay: Duration, on_fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        tracing::debug!("Reconnect scheduled in {:?}", delay);
        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            on_fire();
        }));
    }

    /// Returns whether a pending delay was cancelled
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                tracing::debug!("Pending reconnect cancelled");
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}
