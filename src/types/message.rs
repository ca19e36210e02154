use crate::messaging::{DataAction, MessageType};
use crate::types::{RealtimeError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A resource change pushed by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataUpdate {
    pub resource: String,
    pub action: DataAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<String>,
}

impl DataUpdate {
    pub fn new(resource: impl Into<String>, action: DataAction) -> Self {
        Self {
            resource: resource.into(),
            action,
            data: None,
            id: None,
            timestamp: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Looks up `field` in the payload, accepting strings and numbers.
    pub fn payload_field(&self, field: &str) -> Option<String> {
        self.data
            .as_ref()
            .and_then(|data| data.get(field))
            .and_then(scalar_to_string)
    }
}

/// A frame received from the server, classified by its `type` tag.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    Connected,
    AuthSuccess,
    DataUpdate(DataUpdate),
    Unrecognized(String),
}

impl InboundMessage {
    /// Parses a raw text frame.
    ///
    /// Unknown tags parse successfully as `Unrecognized`; only invalid JSON,
    /// a missing tag, or a malformed `data_update` body is an error.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| RealtimeError::Protocol("frame has no string `type` field".into()))?;

        Ok(match MessageType::parse(tag) {
            MessageType::Connected => Self::Connected,
            MessageType::AuthSuccess => Self::AuthSuccess,
            MessageType::DataUpdate => Self::DataUpdate(serde_json::from_value(value)?),
            MessageType::Unrecognized(tag) => Self::Unrecognized(tag),
        })
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Connected => MessageType::Connected,
            Self::AuthSuccess => MessageType::AuthSuccess,
            Self::DataUpdate(_) => MessageType::DataUpdate,
            Self::Unrecognized(tag) => MessageType::Unrecognized(tag.clone()),
        }
    }
}

/// Tenant and user the connection authenticates as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    pub tenant_id: String,
    pub user_id: String,
}

impl AuthIdentity {
    pub fn new(tenant_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// Frames sent by the client.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    Auth {
        #[serde(rename = "tenantId")]
        tenant_id: String,
        #[serde(rename = "userId")]
        user_id: String,
    },
}

impl From<&AuthIdentity> for OutboundMessage {
    fn from(identity: &AuthIdentity) -> Self {
        Self::Auth {
            tenant_id: identity.tenant_id.clone(),
            user_id: identity.user_id.clone(),
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_to_string))
}
