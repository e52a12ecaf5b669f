mod routes;

use hush_core::{Store, StoreConfig};
use routes::AppState;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hush_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Configuration from environment variables
    let host = std::env::var("HUSH_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("HUSH_PORT").unwrap_or_else(|_| "8080".to_string());
    let reap_interval: u64 = std::env::var("HUSH_REAP_INTERVAL")
        .unwrap_or_else(|_| "60".to_string())
        .parse()
        .unwrap_or(60);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    // Create the store with configuration
    let config = StoreConfig::default().with_reap_interval(Duration::from_secs(reap_interval));
    let store = Store::with_config(config);

    // Secrets are submitted by browser clients from arbitrary origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::router(AppState { store })
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Hush server listening on {}", addr);
    tracing::info!("   Reap interval: {}s", reap_interval);
    axum::serve(listener, app).await?;

    Ok(())
}
