// WebSocket transport construction
mod factory;

pub use factory::{WebSocketFactory, WsStream};
