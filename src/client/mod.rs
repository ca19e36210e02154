// Module declarations
mod builder;
mod client;
mod connection;
mod driver;
mod machine;

// Public API exports
pub use builder::{RealtimeClientBuilder, RealtimeClientOptions};
pub use client::RealtimeClient;
pub use connection::ConnectionManager;
pub use machine::{ConnectionEvent, ConnectionMachine, ConnectionState, Effect, RetryPolicy};
