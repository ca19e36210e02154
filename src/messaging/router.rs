use crate::invalidation::{CacheInvalidator, invalidation_targets};
use crate::notifier::UpdateNotifier;
use crate::types::{DataUpdate, InboundMessage};
use std::sync::Arc;

/// Longest slice of a rejected frame that gets logged
const MALFORMED_PREVIEW_CHARS: usize = 200;

/// What the dispatcher did with a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Connected,
    AuthSuccess,
    DataUpdate { invalidated: usize, notified: bool },
    Unrecognized(String),
    Malformed,
}

/// Routes inbound frames to the cache and the notifier.
///
/// The only component that touches the cache. Never fails: malformed
/// frames are logged and dropped.
pub struct MessageDispatcher {
    cache: Arc<dyn CacheInvalidator>,
    notifier: UpdateNotifier,
}

impl MessageDispatcher {
    pub fn new(cache: Arc<dyn CacheInvalidator>, notifier: UpdateNotifier) -> Self {
        Self { cache, notifier }
    }

    pub fn notifier(&self) -> &UpdateNotifier {
        &self.notifier
    }

    /// Parses and routes one text frame.
    pub fn dispatch(&self, raw: &str) -> DispatchOutcome {
        match InboundMessage::parse(raw) {
            Ok(message) => {
                tracing::trace!("Dispatching {} frame", message.message_type());
                self.route(message)
            }
            Err(e) => {
                tracing::warn!(
                    "Dropping malformed frame ({} bytes): {} - Raw: {}",
                    raw.len(),
                    e,
                    preview(raw)
                );
                DispatchOutcome::Malformed
            }
        }
    }

    /// Routes an already parsed message.
    pub fn route(&self, message: InboundMessage) -> DispatchOutcome {
        match message {
            InboundMessage::Connected => {
                tracing::info!("Real-time channel acknowledged connection");
                DispatchOutcome::Connected
            }
            InboundMessage::AuthSuccess => {
                tracing::info!("Real-time channel authenticated");
                DispatchOutcome::AuthSuccess
            }
            InboundMessage::DataUpdate(update) => self.handle_data_update(&update),
            InboundMessage::Unrecognized(tag) => {
                tracing::debug!("Ignoring unrecognized message type: {}", tag);
                DispatchOutcome::Unrecognized(tag)
            }
        }
    }

    fn handle_data_update(&self, update: &DataUpdate) -> DispatchOutcome {
        let targets = invalidation_targets(update);
        tracing::debug!(
            "data_update resource={} action={} id={:?} -> {} cache keys",
            update.resource,
            update.action,
            update.id,
            targets.len()
        );

        for key in &targets {
            self.cache.invalidate(key);
        }

        let notified = self.notifier.notify_update(&update.resource, &update.action);

        DispatchOutcome::DataUpdate {
            invalidated: targets.len(),
            notified,
        }
    }
}

fn preview(raw: &str) -> &str {
    match raw.char_indices().nth(MALFORMED_PREVIEW_CHARS) {
        Some((end, _)) => &raw[..end],
        None => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invalidation::CacheKey;
    use crate::notifier::{Locale, Notification, Notifier};
    use crate::types::Result;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingCache {
        keys: Mutex<Vec<CacheKey>>,
    }

    impl CacheInvalidator for RecordingCache {
        fn invalidate(&self, key: &CacheKey) {
            self.keys.lock().unwrap().push(key.clone());
        }
    }

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

    fn dispatcher() -> (MessageDispatcher, Arc<RecordingCache>, Arc<RecordingNotifier>) {
        let cache = Arc::new(RecordingCache::default());
        let sink = Arc::new(RecordingNotifier::default());
        let notifier = UpdateNotifier::new(sink.clone(), Locale::default(), Duration::ZERO);
        (MessageDispatcher::new(cache.clone(), notifier), cache, sink)
    }

    #[test]
    fn test_product_update_invalidates_and_notifies() {
        let (dispatcher, cache, sink) = dispatcher();

        let outcome =
            dispatcher.dispatch(r#"{"type":"data_update","resource":"products","action":"update"}"#);

        assert_eq!(
            outcome,
            DispatchOutcome::DataUpdate {
                invalidated: 2,
                notified: true
            }
        );
        assert_eq!(
            *cache.keys.lock().unwrap(),
            vec![CacheKey::new("products"), CacheKey::new("dashboard")]
        );
        let seen = sink.seen.lock().unwrap();
        assert!(seen[0].description.contains("Produk"));
        assert!(seen[0].description.contains("diperbarui"));
    }

    #[test]
    fn test_unknown_resource_notifies_with_raw_name() {
        let (dispatcher, cache, sink) = dispatcher();

        let outcome =
            dispatcher.dispatch(r#"{"type":"data_update","resource":"invoices","action":"create"}"#);

        assert_eq!(
            outcome,
            DispatchOutcome::DataUpdate {
                invalidated: 0,
                notified: true
            }
        );
        assert!(cache.keys.lock().unwrap().is_empty());
        assert_eq!(sink.seen.lock().unwrap()[0].description, "invoices telah ditambahkan");
    }

    #[test]
    fn test_malformed_frames_are_dropped() {
        let (dispatcher, cache, sink) = dispatcher();

        for raw in ["", "{", "[]", r#"{"kind":"data_update"}"#, r#"{"type":"data_update"}"#] {
            assert_eq!(dispatcher.dispatch(raw), DispatchOutcome::Malformed, "{raw}");
        }
        assert!(cache.keys.lock().unwrap().is_empty());
        assert!(sink.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_preview_is_bounded() {
        let short = r#"{"type":"#;
        assert_eq!(preview(short), short);

        let long = "é".repeat(500);
        let logged = preview(&long);
        assert_eq!(logged.chars().count(), MALFORMED_PREVIEW_CHARS);
        assert!(long.starts_with(logged));
    }

    #[test]
    fn test_informational_and_unknown_frames_touch_nothing() {
        let (dispatcher, cache, sink) = dispatcher();

        assert_eq!(
            dispatcher.dispatch(r#"{"type":"connected"}"#),
            DispatchOutcome::Connected
        );
        assert_eq!(
            dispatcher.dispatch(r#"{"type":"auth_success"}"#),
            DispatchOutcome::AuthSuccess
        );
        assert_eq!(
            dispatcher.dispatch(r#"{"type":"typing","user":"x"}"#),
            DispatchOutcome::Unrecognized("typing".to_string())
        );
        assert!(cache.keys.lock().unwrap().is_empty());
        assert!(sink.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_messages_apply_in_arrival_order() {
        let (dispatcher, cache, _) = dispatcher();

        dispatcher.dispatch(r#"{"type":"data_update","resource":"roles","action":"update"}"#);
        dispatcher.dispatch(r#"{"type":"data_update","resource":"tenants","action":"delete"}"#);

        let keys: Vec<String> = cache
            .keys
            .lock()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(keys, vec!["roles", "users", "dashboard", "tenants", "dashboard"]);
    }
}
