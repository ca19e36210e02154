use crate::types::constants::{actions, message_types};
use serde::{Deserialize, Serialize};

/// Type-safe inbound message tags
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Server acknowledged the socket
    Connected,

    /// Server accepted the auth frame
    AuthSuccess,

    /// A resource changed on the server
    DataUpdate,

    /// Any tag this client does not know about
    Unrecognized(String),
}

impl MessageType {
    /// Parse a wire tag into a MessageType
    pub fn parse(s: &str) -> Self {
        match s {
            message_types::CONNECTED => Self::Connected,
            message_types::AUTH_SUCCESS => Self::AuthSuccess,
            message_types::DATA_UPDATE => Self::DataUpdate,
            _ => Self::Unrecognized(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Connected => message_types::CONNECTED,
            Self::AuthSuccess => message_types::AUTH_SUCCESS,
            Self::DataUpdate => message_types::DATA_UPDATE,
            Self::Unrecognized(s) => s,
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What happened to a resource.
///
/// Verbs the server may add later are kept verbatim in `Other` so the
/// notifier can still show something.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataAction {
    Create,
    Update,
    Delete,
    Other(String),
}

impl DataAction {
    pub fn parse(s: &str) -> Self {
        match s {
            actions::CREATE => Self::Create,
            actions::UPDATE => Self::Update,
            actions::DELETE => Self::Delete,
            _ => Self::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Create => actions::CREATE,
            Self::Update => actions::UPDATE,
            Self::Delete => actions::DELETE,
            Self::Other(s) => s,
        }
    }
}

impl From<String> for DataAction {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<DataAction> for String {
    fn from(action: DataAction) -> Self {
        action.as_str().to_string()
    }
}

impl std::fmt::Display for DataAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
