use pos_realtime::{
    AuthIdentity, CacheInvalidator, CacheKey, EndpointConfig, PageLocation, RealtimeClient,
    RealtimeClientOptions,
};
use std::sync::Arc;

struct PrintingCache;

impl CacheInvalidator for PrintingCache {
    fn invalidate(&self, key: &CacheKey) {
        println!("🗑️  invalidate {}", key);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let origin = std::env::var("POS_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".into());

    // Create client
    let client = RealtimeClient::new(
        RealtimeClientOptions {
            endpoints: EndpointConfig::from_env(),
            identity: Some(AuthIdentity::new("tenant-demo", "user-demo")),
            ..Default::default()
        },
        PageLocation::parse(&origin)?,
        Arc::new(PrintingCache),
    )?;

    // Connect
    println!("Connecting from {}...", origin);
    client.connect().await;

    // Keep connection alive
    tokio::signal::ctrl_c().await?;

    // Disconnect
    println!("Disconnecting...");
    client.disconnect().await;
    client.shutdown().await;
    println!("Disconnected!");

    Ok(())
}
