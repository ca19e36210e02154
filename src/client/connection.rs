use crate::types::{RealtimeError, Result, WS_CLOSE_NORMAL};
use crate::websocket::WsStream;
use futures::SinkExt;
use futures::stream::SplitSink;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

type WsWriter = SplitSink<WsStream, Message>;

/// Write half of the live transport.
///
/// Holds at most one writer; installing a new one only happens after the
/// previous transport was torn down.
pub struct ConnectionManager {
    ws_write: RwLock<Option<WsWriter>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            ws_write: RwLock::new(None),
        }
    }

    /// Sets the WebSocket write sink (called after successful connection)
    pub async fn set_writer(&self, writer: WsWriter) {
        let mut ws = self.ws_write.write().await;
        *ws = Some(writer);
    }

    /// Checks whether a transport is attached
    pub async fn has_writer(&self) -> bool {
        self.ws_write.read().await.is_some()
    }

    /// Serializes `frame` as JSON and sends it as a text frame
    pub async fn send_json<T: Serialize>(&self, frame: &T) -> Result<()> {
        let json = serde_json::to_string(frame)?;
        self.send(Message::Text(json.into())).await
    }

    /// Sends a keepalive ping
    pub async fn send_ping(&self) -> Result<()> {
        self.send(Message::Ping(Vec::new().into())).await
    }

    async fn send(&self, message: Message) -> Result<()> {
        let mut ws_guard = self.ws_write.write().await;
        match ws_guard.as_mut() {
            Some(ws) => {
                ws.send(message).await?;
                Ok(())
            }
            None => Err(RealtimeError::NotConnected),
        }
    }

    /// Sends a normal close frame and drops the writer
    pub async fn close(&self) -> Result<()> {
        let mut ws_guard = self.ws_write.write().await;
        let Some(mut ws) = ws_guard.take() else {
            return Ok(());
        };
        drop(ws_guard);

        let frame = CloseFrame {
            code: CloseCode::from(WS_CLOSE_NORMAL),
            reason: "client disconnect".into(),
        };
        ws.send(Message::Close(Some(frame))).await?;
        Ok(())
    }

    /// Drops the writer without a close handshake (transport already gone)
    pub async fn clear_writer(&self) {
        let mut ws = self.ws_write.write().await;
        *ws = None;
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
