use anyhow::Result;
use futures::future::join_all;
use hush_client::{HushClient, HushClientOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hush_integration_tests=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let options = HushClientOptions::from_env();
    tracing::info!("Hush Integration Tests");
    tracing::info!("   Server: {}", options.base_url);
    println!();

    let client = HushClient::with_options(options)?;
    anyhow::ensure!(client.health().await?, "server did not answer the health probe");

    // Run all tests
    test_basic_round_trip(&client).await?;
    test_view_exhaustion(&client).await?;
    test_no_ttl_retention(&client).await?;
    test_validation_rejected(&client).await?;
    test_concurrent_consumption(&client).await?;

    println!();
    tracing::info!("All tests passed!");

    Ok(())
}

/// Test submitting a secret and reading it back
async fn test_basic_round_trip(client: &HushClient) -> Result<()> {
    tracing::info!("Test: Basic Round Trip");

    let text = format!("round-trip-{}", Uuid::new_v4());
    let created = client.create_secret(&text, 2, 10).await?;

    anyhow::ensure!(
        created.remaining_views == 2,
        "fresh secret should carry all views"
    );
    anyhow::ensure!(
        created.expires_at.is_some(),
        "secret with a TTL should carry an expiry timestamp"
    );

    let fetched = client
        .fetch_secret(&created.hash)
        .await?
        .ok_or_else(|| anyhow::anyhow!("secret should be readable"))?;

    anyhow::ensure!(fetched.secret_text == text, "secret text should round-trip");
    anyhow::ensure!(
        fetched.remaining_views == 1,
        "one view should be consumed by the read"
    );

    tracing::info!("   ✓ Round trip works correctly");
    Ok(())
}

/// Test that the view limit makes a secret unreadable
async fn test_view_exhaustion(client: &HushClient) -> Result<()> {
    tracing::info!("Test: View Exhaustion");

    let text = format!("read-once-{}", Uuid::new_v4());
    let created = client.create_secret(&text, 1, 0).await?;

    let first = client.fetch_secret(&created.hash).await?;
    anyhow::ensure!(first.is_some(), "first read should succeed");

    let second = client.fetch_secret(&created.hash).await?;
    anyhow::ensure!(second.is_none(), "second read should find nothing");

    tracing::info!("   ✓ Secret burned after its only view");
    Ok(())
}

/// Test that a secret without TTL stays readable across views
async fn test_no_ttl_retention(client: &HushClient) -> Result<()> {
    tracing::info!("Test: No-TTL Retention");

    let text = format!("no-deadline-{}", Uuid::new_v4());
    let created = client.create_secret(&text, 3, 0).await?;
    anyhow::ensure!(
        created.expires_at.is_none(),
        "secret without TTL should carry no expiry"
    );

    for remaining in (0..3).rev() {
        let fetched = client
            .fetch_secret(&created.hash)
            .await?
            .ok_or_else(|| anyhow::anyhow!("read should succeed while views remain"))?;
        anyhow::ensure!(
            fetched.remaining_views == remaining,
            "views should count down one per read"
        );
    }

    tracing::info!("   ✓ Only the view limit applies");
    Ok(())
}

/// Test that invalid submissions are rejected
async fn test_validation_rejected(client: &HushClient) -> Result<()> {
    tracing::info!("Test: Validation");

    let text = format!("invalid-{}", Uuid::new_v4());
    let result = client.create_secret(&text, 0, 0).await;
    anyhow::ensure!(
        matches!(&result, Err(e) if e.is_rejected()),
        "zero views should be rejected"
    );

    tracing::info!("   ✓ Invalid submissions are rejected");
    Ok(())
}

/// Test concurrent reads of one secret - exactly the view limit may succeed
async fn test_concurrent_consumption(client: &HushClient) -> Result<()> {
    const VIEWS: u32 = 5;
    const CALLERS: usize = 20;

    tracing::info!(
        "Test: Concurrent Consumption ({} callers, {} views)",
        CALLERS,
        VIEWS
    );

    let text = format!("contested-{}", Uuid::new_v4());
    let created = client.create_secret(&text, VIEWS, 10).await?;

    let fetches = (0..CALLERS).map(|_| client.fetch_secret(&created.hash));
    let results = join_all(fetches).await;

    let mut successes = 0usize;
    let mut misses = 0usize;
    for result in results {
        match result? {
            Some(secret) => {
                anyhow::ensure!(
                    secret.remaining_views < VIEWS,
                    "every successful read reports a post-decrement count"
                );
                successes += 1;
            }
            None => misses += 1,
        }
    }

    anyhow::ensure!(
        successes == VIEWS as usize,
        "exactly the view limit may succeed (got {successes})"
    );
    anyhow::ensure!(
        misses == CALLERS - VIEWS as usize,
        "every extra caller must miss (got {misses})"
    );

    tracing::info!("   ✓ Views are never double-counted");
    Ok(())
}
