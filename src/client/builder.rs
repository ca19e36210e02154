use super::driver::{ConnectionDriver, TransportSettings};
use super::{ConnectionManager, ConnectionMachine, ConnectionState, RealtimeClient, RetryPolicy};
use crate::endpoint::{EndpointConfig, LocationSource};
use crate::infrastructure::{RetryTimer, TaskManager};
use crate::invalidation::CacheInvalidator;
use crate::messaging::MessageDispatcher;
use crate::notifier::{Locale, Notifier, TracingNotifier, UpdateNotifier};
use crate::types::{
    AuthIdentity, DEFAULT_CONNECT_TIMEOUT, DEFAULT_NOTIFICATION_THROTTLE, HEARTBEAT_INTERVAL,
    RealtimeError, Result,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

#[derive(Debug, Clone)]
pub struct RealtimeClientOptions {
    pub endpoints: EndpointConfig,
    /// Sent as the `auth` frame on every open; `None` skips authentication
    pub identity: Option<AuthIdentity>,
    pub retry: RetryPolicy,
    pub connect_timeout: Option<Duration>,
    /// `None` disables the keepalive ping
    pub heartbeat_interval: Option<Duration>,
    pub notification_throttle: Duration,
    /// Toast on data updates; failure notifications are always shown
    pub notify_updates: bool,
    pub locale: Locale,
}

impl Default for RealtimeClientOptions {
    fn default() -> Self {
        Self {
            endpoints: EndpointConfig::default(),
            identity: None,
            retry: RetryPolicy::default(),
            connect_timeout: Some(Duration::from_millis(DEFAULT_CONNECT_TIMEOUT)),
            heartbeat_interval: Some(Duration::from_millis(HEARTBEAT_INTERVAL)),
            notification_throttle: Duration::from_millis(DEFAULT_NOTIFICATION_THROTTLE),
            notify_updates: true,
            locale: Locale::default(),
        }
    }
}

/// Builder for RealtimeClient that handles initialization
pub struct RealtimeClientBuilder {
    options: RealtimeClientOptions,
    location: Arc<dyn LocationSource>,
    cache: Arc<dyn CacheInvalidator>,
    notifier: Arc<dyn Notifier>,
}

impl RealtimeClientBuilder {
    /// Create a new builder
    pub fn new(
        options: RealtimeClientOptions,
        location: impl LocationSource + 'static,
        cache: Arc<dyn CacheInvalidator>,
    ) -> Result<Self> {
        if let Some(identity) = &options.identity
            && (identity.tenant_id.trim().is_empty() || identity.user_id.trim().is_empty())
        {
            return Err(RealtimeError::Auth(
                "tenant id and user id are required".to_string(),
            ));
        }

        if options.retry.max_attempts_per_endpoint == 0 {
            tracing::warn!("Retry limit is 0, each endpoint gets a single attempt");
        }

        Ok(Self {
            options,
            location: Arc::new(location),
            cache,
            notifier: Arc::new(TracingNotifier),
        })
    }

    /// Replace the sink that displays notifications
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Build the client and spawn the connection driver.
    ///
    /// Must be called from within a Tokio runtime. The client starts `Idle`;
    /// nothing is opened until [`RealtimeClient::connect`].
    pub fn build(self) -> RealtimeClient {
        let RealtimeClientOptions {
            endpoints,
            identity,
            retry,
            connect_timeout,
            heartbeat_interval,
            notification_throttle,
            notify_updates,
            locale,
        } = self.options;

        let mut notifier = UpdateNotifier::new(self.notifier, locale, notification_throttle);
        if !notify_updates {
            notifier = notifier.without_update_notifications();
        }

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);

        let driver = ConnectionDriver {
            machine: ConnectionMachine::new(retry),
            endpoints,
            location: self.location,
            identity,
            settings: TransportSettings {
                connect_timeout,
                heartbeat_interval,
            },
            connection: Arc::new(ConnectionManager::new()),
            dispatcher: Arc::new(MessageDispatcher::new(self.cache, notifier)),
            tasks: TaskManager::new(),
            retry_timer: RetryTimer::new(),
            commands: command_tx.downgrade(),
            state_tx,
        };
        tokio::spawn(driver.run(command_rx));

        RealtimeClient::from_parts(command_tx, state_rx)
    }
}
