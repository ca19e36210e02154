use super::driver::Command;
use super::{ConnectionEvent, ConnectionState, RealtimeClientBuilder, RealtimeClientOptions};
use crate::endpoint::LocationSource;
use crate::invalidation::CacheInvalidator;
use crate::types::{RealtimeError, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};

/// Handle to the real-time invalidation channel.
///
/// Cloning is cheap; every clone drives the same connection. The socket is
/// owned by a background task, so `connect` and `disconnect` return once the
/// request has been applied, not once the socket is open or closed.
///
/// # Example
///
/// ```no_run
/// use pos_realtime::{
///     AuthIdentity, CacheInvalidator, CacheKey, PageLocation, RealtimeClient,
///     RealtimeClientOptions,
/// };
/// use std::sync::Arc;
///
/// struct QueryCache;
///
/// impl CacheInvalidator for QueryCache {
///     fn invalidate(&self, key: &CacheKey) {
///         println!("stale: {key}");
///     }
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RealtimeClient::new(
///     RealtimeClientOptions {
///         identity: Some(AuthIdentity::new("tenant-1", "user-1")),
///         ..Default::default()
///     },
///     PageLocation::parse("https://pos.example.com")?,
///     Arc::new(QueryCache),
/// )?;
///
/// client.connect().await;
/// client.wait_for_state(pos_realtime::ConnectionState::Open).await?;
/// // ...
/// client.disconnect().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RealtimeClient {
    commands: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl RealtimeClient {
    /// Create a new client with the default tracing notifier.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        options: RealtimeClientOptions,
        location: impl LocationSource + 'static,
        cache: Arc<dyn CacheInvalidator>,
    ) -> Result<Self> {
        Ok(RealtimeClientBuilder::new(options, location, cache)?.build())
    }

    pub fn builder(
        options: RealtimeClientOptions,
        location: impl LocationSource + 'static,
        cache: Arc<dyn CacheInvalidator>,
    ) -> Result<RealtimeClientBuilder> {
        RealtimeClientBuilder::new(options, location, cache)
    }

    pub(crate) fn from_parts(
        commands: mpsc::UnboundedSender<Command>,
        state_rx: watch::Receiver<ConnectionState>,
    ) -> Self {
        Self { commands, state_rx }
    }

    /// Start connecting. A no-op while a connection is already in progress
    /// or open. From `Failed`, starts a fresh cycle.
    ///
    /// Returns the state right after the request was applied.
    pub async fn connect(&self) -> ConnectionState {
        self.request(ConnectionEvent::ConnectRequested).await
    }

    /// Close the connection and cancel any pending retry.
    ///
    /// Once this returns, `is_connected()` is false and no reconnect will
    /// happen until `connect` is called again.
    pub async fn disconnect(&self) -> ConnectionState {
        self.request(ConnectionEvent::DisconnectRequested).await
    }

    pub fn is_connected(&self) -> bool {
        *self.state_rx.borrow() == ConnectionState::Open
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Receiver that observes every state change
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Wait until the connection reaches `target`
    pub async fn wait_for_state(&self, target: ConnectionState) -> Result<()> {
        let mut state_rx = self.state_rx.clone();
        state_rx
            .wait_for(|state| *state == target)
            .await
            .map(|_| ())
            .map_err(|_| RealtimeError::Connection("connection driver stopped".to_string()))
    }

    /// Disconnect and stop the background driver. Every clone becomes inert.
    pub async fn shutdown(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self
            .commands
            .send(Command::Shutdown { ack: Some(ack_tx) })
            .is_err()
        {
            tracing::debug!("Connection driver already stopped");
            return;
        }
        if ack_rx.await.is_err() {
            tracing::debug!("Connection driver stopped before acknowledging shutdown");
        }
    }

    async fn request(&self, event: ConnectionEvent) -> ConnectionState {
        let (ack_tx, ack_rx) = oneshot::channel();
        let command = Command::Transition {
            event,
            ack: Some(ack_tx),
        };

        if self.commands.send(command).is_err() {
            tracing::warn!("Connection driver is not running");
            return self.state();
        }
        ack_rx.await.unwrap_or_else(|_| self.state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::PageLocation;
    use crate::invalidation::CacheKey;
    use crate::types::AuthIdentity;

    struct NullCache;

    impl CacheInvalidator for NullCache {
        fn invalidate(&self, _key: &CacheKey) {}
    }

    fn client() -> RealtimeClient {
        let options = RealtimeClientOptions {
            identity: Some(AuthIdentity::new("tenant-1", "user-1")),
            ..Default::default()
        };
        RealtimeClient::new(
            options,
            PageLocation::new(false, "localhost", Some(3000)),
            Arc::new(NullCache),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_disconnect_from_idle_stays_idle() {
        let client = client();
        assert_eq!(client.disconnect().await, ConnectionState::Idle);
        assert!(!client.is_connected());
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_requests_after_shutdown_are_ignored() {
        let client = client();
        client.shutdown().await;

        let other = client.clone();
        assert_eq!(other.connect().await, ConnectionState::Idle);
        assert!(
            other
                .wait_for_state(ConnectionState::Open)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_subscribers_see_state_changes() {
        let client = client();
        let mut states = client.subscribe_state();
        assert_eq!(*states.borrow_and_update(), ConnectionState::Idle);

        client.connect().await;
        states.changed().await.unwrap();
        assert_ne!(*states.borrow(), ConnectionState::Idle);

        client.shutdown().await;
    }
}
