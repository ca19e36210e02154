use pos_realtime::{
    AuthIdentity, CacheInvalidator, CacheKey, ConnectionState, EndpointConfig, PageLocation,
    RealtimeClient, RealtimeClientOptions,
};
use std::sync::Arc;
use std::time::Duration;

struct PrintingCache;

impl CacheInvalidator for PrintingCache {
    fn invalidate(&self, key: &CacheKey) {
        println!("🗑️  invalidate {}", key);
    }
}

/// Test reconnection behavior against a running POS backend
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing to see logs
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("🦀 Testing Reconnection with a POS backend\n");

    let origin = std::env::var("POS_ORIGIN").expect("POS_ORIGIN must be set in .env");
    let tenant_id = std::env::var("POS_TENANT_ID").expect("POS_TENANT_ID must be set in .env");
    let user_id = std::env::var("POS_USER_ID").expect("POS_USER_ID must be set in .env");

    println!("📡 Page origin: {}\n", origin);

    let client = RealtimeClient::new(
        RealtimeClientOptions {
            endpoints: EndpointConfig::from_env(),
            identity: Some(AuthIdentity::new(tenant_id, user_id)),
            ..Default::default()
        },
        PageLocation::parse(&origin)?,
        Arc::new(PrintingCache),
    )?;

    // Test 1: Connect and verify
    println!("✅ Test 1: Initial connection...");
    client.connect().await;
    tokio::time::timeout(
        Duration::from_secs(30),
        client.wait_for_state(ConnectionState::Open),
    )
    .await??;
    println!("✅ Connected successfully!\n");

    tokio::time::sleep(Duration::from_secs(2)).await;

    // Test 2: Manual disconnect should NOT trigger reconnection
    println!("✅ Test 2: Manual disconnect (should NOT auto-reconnect)...");
    client.disconnect().await;
    assert!(!client.is_connected(), "Should be disconnected");

    println!("⏳ Waiting 5 seconds to verify no auto-reconnect...");
    tokio::time::sleep(Duration::from_secs(5)).await;

    if client.state() == ConnectionState::Idle {
        println!("✅ Correctly stayed disconnected after manual disconnect!\n");
    } else {
        return Err("Should NOT reconnect after manual disconnect".into());
    }

    // Test 3: Reconnect and watch for drops
    println!("✅ Test 3: Testing automatic reconnection...");
    client.connect().await;
    client.wait_for_state(ConnectionState::Open).await?;
    println!("✅ Reconnected successfully\n");

    println!("💡 Restart the backend while this runs and watch the logs\n");

    let mut states = client.subscribe_state();
    let watch = async {
        while states.changed().await.is_ok() {
            let state = *states.borrow_and_update();
            println!("   state -> {}", state);
            if state == ConnectionState::Failed {
                println!("❌ Every endpoint exhausted");
                break;
            }
        }
    };
    let _ = tokio::time::timeout(Duration::from_secs(60), watch).await;

    client.disconnect().await;
    client.shutdown().await;
    println!("🎉 Reconnection test finished!");

    Ok(())
}
