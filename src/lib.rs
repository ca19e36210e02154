//! # POS Realtime
//!
//! Keeps a client-side query cache fresh by listening to a WebSocket channel
//! on which the backend announces data changes.
//!
//! Each `data_update` names a resource and an action. The client maps it to
//! the cache keys that went stale, invalidates them, and shows a throttled
//! notification. The connection resolves its endpoint from configuration or
//! the page location, authenticates, and retries across candidate endpoints
//! until every one is exhausted.
//!
//! ## Example
//!
//! ```no_run
//! use pos_realtime::{
//!     AuthIdentity, CacheInvalidator, CacheKey, EndpointConfig, PageLocation, RealtimeClient,
//!     RealtimeClientOptions,
//! };
//! use std::sync::Arc;
//!
//! struct QueryCache;
//!
//! impl CacheInvalidator for QueryCache {
//!     fn invalidate(&self, key: &CacheKey) {
//!         println!("invalidate {key}");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RealtimeClient::new(
//!         RealtimeClientOptions {
//!             endpoints: EndpointConfig::from_env(),
//!             identity: Some(AuthIdentity::new("tenant-1", "user-1")),
//!             ..Default::default()
//!         },
//!         PageLocation::parse("http://localhost:5173")?,
//!         Arc::new(QueryCache),
//!     )?;
//!
//!     client.connect().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod endpoint;
pub mod infrastructure;
pub mod invalidation;
pub mod messaging;
pub mod notifier;
pub mod types;
pub mod websocket;

pub use client::{
    ConnectionState, RealtimeClient, RealtimeClientBuilder, RealtimeClientOptions, RetryPolicy,
};
pub use endpoint::{Endpoint, EndpointConfig, LocationSource, PageLocation};
pub use invalidation::{CacheInvalidator, CacheKey, invalidation_targets};
pub use messaging::{DataAction, DispatchOutcome, MessageDispatcher};
pub use notifier::{Locale, Notification, Notifier, TracingNotifier, UpdateNotifier};
pub use types::{AuthIdentity, DataUpdate, InboundMessage, RealtimeError, Result};
