use crate::types::{RealtimeError, Result};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Client WebSocket stream over plain TCP or TLS
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket factory for creating WebSocket connections
pub struct WebSocketFactory;

impl WebSocketFactory {
    /// Opens a WebSocket connection, giving up after `timeout` if one is set
    pub async fn create(url: &str, timeout: Option<Duration>) -> Result<WsStream> {
        tracing::debug!("Creating WebSocket connection to: {}", url);

        let handshake = connect_async(url);
        let (stream, response) = match timeout {
            Some(limit) => tokio::time::timeout(limit, handshake)
                .await
                .map_err(|_| RealtimeError::Timeout)??,
            None => handshake.await?,
        };

        tracing::debug!(
            "WebSocket handshake with {} completed: {}",
            url,
            response.status()
        );
        Ok(stream)
    }
}
