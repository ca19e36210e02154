use thiserror::Error;

/// Errors that can occur inside the real-time channel.
///
/// None of these escape to the host application as panics: the driver logs
/// them and turns transport failures into state machine events.
#[derive(Error, Debug)]
pub enum RealtimeError {
    /// WebSocket protocol error (connection refused, invalid frame, etc.)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// General connection error with descriptive message
    #[error("Connection error: {0}")]
    Connection(String),

    /// No usable endpoint could be derived from the given input
    #[error("Endpoint resolution error: {0}")]
    Resolution(String),

    /// Inbound frame was valid JSON but not a valid channel message
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Missing or invalid caller identity
    #[error("Authentication error: {0}")]
    Auth(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing error (malformed endpoint URL)
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// The notification display collaborator rejected a notification
    #[error("Notification error: {0}")]
    Notification(String),

    /// Operation timed out (connect attempt or heartbeat)
    #[error("Timeout error")]
    Timeout,

    /// Attempted operation while not connected to the server
    #[error("Not connected")]
    NotConnected,
}

/// Convenience type alias for `Result<T, RealtimeError>`.
pub type Result<T> = std::result::Result<T, RealtimeError>;
