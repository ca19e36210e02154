// Subscriber notifier - short localized messages about what changed
mod locale;
mod throttle;

pub use locale::Locale;
pub use throttle::Throttle;

use crate::messaging::DataAction;
use crate::types::Result;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

/// A message for the host application's toast / notification area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
}

/// The host application's notification display.
///
/// Called synchronously from the dispatch path, so implementations should
/// hand the notification off and return.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<()>;
}

/// Writes notifications to the log. Used when the host supplies no display.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) -> Result<()> {
        tracing::info!("{}: {}", notification.title, notification.description);
        Ok(())
    }
}

/// Renders and delivers update and failure notifications.
pub struct UpdateNotifier {
    sink: Arc<dyn Notifier>,
    locale: Locale,
    throttle: Throttle,
    notify_updates: bool,
}

impl UpdateNotifier {
    pub fn new(sink: Arc<dyn Notifier>, locale: Locale, throttle_window: Duration) -> Self {
        Self {
            sink,
            locale,
            throttle: Throttle::new(throttle_window),
            notify_updates: true,
        }
    }

    /// Disables update notifications; the failure notification still goes out.
    pub fn without_update_notifications(mut self) -> Self {
        self.notify_updates = false;
        self
    }

    /// Returns whether a notification reached the display.
    pub fn notify_update(&self, resource: &str, action: &DataAction) -> bool {
        if !self.notify_updates {
            return false;
        }

        let throttle_key = format!("{}:{}", resource, action.as_str());
        if !self.throttle.allow(&throttle_key) {
            tracing::debug!("Throttled notification for {}", throttle_key);
            return false;
        }

        self.deliver(Notification {
            title: self.locale.update_title.clone(),
            description: self.locale.describe(resource, action),
        })
    }

    /// Tells the user real-time updates are unavailable. Never throttled.
    pub fn notify_failure(&self) -> bool {
        self.deliver(Notification {
            title: self.locale.failure_title.clone(),
            description: self.locale.failure_description.clone(),
        })
    }

    fn deliver(&self, notification: Notification) -> bool {
        match catch_unwind(AssertUnwindSafe(|| self.sink.notify(notification))) {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!("Failed to display notification: {}", e);
                false
            }
            Err(_) => {
                tracing::error!("Notification display panicked; notification dropped");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RealtimeError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        seen: Mutex<Vec<Notification>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notification: Notification) -> Result<()> {
            self.seen.lock().unwrap().push(notification);
            Ok(())
        }
    }

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn notify(&self, _: Notification) -> Result<()> {
            Err(RealtimeError::Notification("toast container unmounted".into()))
        }
    }

    struct PanickingNotifier;

    impl Notifier for PanickingNotifier {
        fn notify(&self, _: Notification) -> Result<()> {
            panic!("display blew up");
        }
    }

    #[test]
    fn test_update_notification_is_localized() {
        let sink = Arc::new(RecordingNotifier::default());
        let notifier = UpdateNotifier::new(sink.clone(), Locale::default(), Duration::ZERO);

        assert!(notifier.notify_update("products", &DataAction::Update));

        let seen = sink.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].description.contains("Produk"));
        assert!(seen[0].description.contains("diperbarui"));
    }

    #[test]
    fn test_repeated_updates_are_throttled() {
        let sink = Arc::new(RecordingNotifier::default());
        let notifier =
            UpdateNotifier::new(sink.clone(), Locale::default(), Duration::from_secs(60));

        assert!(notifier.notify_update("products", &DataAction::Update));
        assert!(!notifier.notify_update("products", &DataAction::Update));
        assert!(notifier.notify_update("products", &DataAction::Delete));
        assert_eq!(sink.seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_failure_notification_bypasses_throttle() {
        let sink = Arc::new(RecordingNotifier::default());
        let notifier =
            UpdateNotifier::new(sink.clone(), Locale::english(), Duration::from_secs(60));

        assert!(notifier.notify_failure());
        assert!(notifier.notify_failure());
        let seen = sink.seen.lock().unwrap();
        assert_eq!(seen[0].title, "Real-time connection lost");
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_display_errors_are_swallowed() {
        let notifier = UpdateNotifier::new(Arc::new(FailingNotifier), Locale::default(), Duration::ZERO);
        assert!(!notifier.notify_update("products", &DataAction::Create));
        assert!(!notifier.notify_failure());
    }

    #[test]
    fn test_display_panics_are_contained() {
        let notifier =
            UpdateNotifier::new(Arc::new(PanickingNotifier), Locale::default(), Duration::ZERO);
        assert!(!notifier.notify_update("products", &DataAction::Create));
    }

    #[test]
    fn test_update_notifications_can_be_disabled() {
        let sink = Arc::new(RecordingNotifier::default());
        let notifier = UpdateNotifier::new(sink.clone(), Locale::default(), Duration::ZERO)
            .without_update_notifications();

        assert!(!notifier.notify_update("products", &DataAction::Update));
        assert!(notifier.notify_failure());
        assert_eq!(sink.seen.lock().unwrap().len(), 1);
    }
}
