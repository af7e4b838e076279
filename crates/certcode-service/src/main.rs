//! Certcode Service - HTTP API for single-use certificate codes
//!
//! This is the main entry point for the certcode service.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use certcode_service::{create_router, AppState, HttpRenderer, ServiceConfig};
use certcode_store::CodeStore;

/// Pending certificates re-rendered at start-up.
const STARTUP_RECOVERY_LIMIT: usize = 1000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,certcode=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Certcode Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_dir = %config.data_dir,
        certificates_dir = %config.certificates_dir,
        renderer_url = %config.renderer_url,
        admin_configured = %config.admin_api_key.is_some(),
        "Service configuration loaded"
    );

    let store = open_store(&config)?;

    match store.stats() {
        Ok(stats) => tracing::info!(
            total = stats.total,
            unused = stats.unused,
            categories = stats.by_category.len(),
            "Code store ready"
        ),
        Err(e) => tracing::warn!(error = %e, "Could not read code statistics"),
    }

    tokio::fs::create_dir_all(&config.certificates_dir).await?;

    let renderer = HttpRenderer::new(
        config.renderer_url.clone(),
        config.renderer_api_key.clone(),
        Duration::from_secs(config.render_timeout_seconds),
    )?;

    // Build app state
    let state = AppState::new(store, Arc::new(renderer), config.clone());

    // Finish renders interrupted by a previous shutdown
    let redemption = state.redemption.clone();
    tokio::spawn(async move {
        if let Err(e) = redemption.recover_pending(STARTUP_RECOVERY_LIMIT).await {
            tracing::error!(error = %e, "Start-up render recovery failed");
        }
    });

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(feature = "rocksdb-backend")]
fn open_store(config: &ServiceConfig) -> Result<Arc<dyn CodeStore>, Box<dyn std::error::Error>> {
    tracing::info!(path = %config.data_dir, "Opening RocksDB store");
    Ok(Arc::new(certcode_store::RocksStore::open(&config.data_dir)?))
}

#[cfg(not(feature = "rocksdb-backend"))]
#[allow(clippy::unnecessary_wraps)]
fn open_store(_config: &ServiceConfig) -> Result<Arc<dyn CodeStore>, Box<dyn std::error::Error>> {
    tracing::warn!("Built without rocksdb-backend - codes are kept in memory and lost on restart");
    Ok(Arc::new(certcode_store::MemoryStore::new()))
}
