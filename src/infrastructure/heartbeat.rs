use crate::client::ConnectionManager;
use crate::types::RealtimeError;
use crate::types::constants::HEARTBEAT_INTERVAL;
use std::sync::Weak;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time;

/// Keepalive for one transport.
///
/// Sends a WebSocket ping every interval. If nothing at all was received
/// since the previous ping, the connection is considered dead.
pub struct HeartbeatManager {
    interval: Option<Duration>,
    awaiting_reply: AtomicBool,
    connection: Weak<ConnectionManager>,
}

impl HeartbeatManager {
    pub fn new(connection: Weak<ConnectionManager>) -> Self {
        Self {
            interval: Some(Duration::from_millis(HEARTBEAT_INTERVAL)),
            awaiting_reply: AtomicBool::new(false),
            connection,
        }
    }

    /// `None` disables the keepalive
    pub fn with_interval(mut self, interval: Option<Duration>) -> Self {
        self.interval = interval.filter(|d| !d.is_zero());
        self
    }

    /// Records inbound traffic; any frame proves the peer is alive
    pub fn acknowledge(&self) {
        self.awaiting_reply.store(false, Ordering::SeqCst);
    }

    /// Runs until the connection is judged dead, returning the reason.
    ///
    /// Never returns when the keepalive is disabled.
    pub async fn run(&self) -> RealtimeError {
        let Some(period) = self.interval else {
            return std::future::pending().await;
        };

        let mut interval_timer = time::interval(period);
        interval_timer.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
        // The first tick completes immediately
        interval_timer.tick().await;

        loop {
            interval_timer.tick().await;

            let Some(connection) = self.connection.upgrade() else {
                return RealtimeError::NotConnected;
            };

            if self.awaiting_reply.swap(true, Ordering::SeqCst) {
                tracing::warn!("Heartbeat timed out after {:?}", period);
                return RealtimeError::Timeout;
            }

            if let Err(e) = connection.send_ping().await {
                tracing::error!("Heartbeat failed to send: {}", e);
                return e;
            }
            tracing::trace!("Sent heartbeat ping");
        }
    }
}
