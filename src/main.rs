use anyhow::{Context, Result};
use clap::Parser;
use container_lending::{
    adapters::connect_transaction_store,
    api::{handlers::AppState, router::create_router},
    application::lending::ServiceDependencies,
    config::{ServerConfig, mask_database_url},
};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenv().ok();

    // 設定は起動時に1回だけ読み込む
    let config = ServerConfig::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "container_lending=debug,tower_http=debug,axum=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Database URL: {}", mask_database_url(&config.database_url));
    if config.liff_id().is_none() {
        tracing::warn!("LIFF_ID is not configured - GET /liff will return 503");
    }

    // Initialize transaction store (runs migrations)
    let transaction_store =
        connect_transaction_store(&config.database_url, config.max_connections)
            .await
            .context("Failed to initialize transaction store")?;

    // Create service dependencies
    let service_deps = ServiceDependencies { transaction_store };

    // Create application state
    let app_state = Arc::new(AppState {
        service_deps,
        liff_id: config.liff_id().map(str::to_string),
    });

    // Create router
    let app = create_router(app_state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
