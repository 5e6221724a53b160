use countryfx_backend::config;
use countryfx_backend::module::country::{CountryStore, CountryUpdater, HttpSourceGateway};
use countryfx_backend::module::renderer::SummaryRenderer;
use countryfx_backend::service::{self, AppState};

use anyhow::{Context, Result};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::read_config()?;

    // Initialize logging
    let _logging_guard = countryfx_backend::logging::init_logging(
        &config.server.log_dir,
        "countryfx-backend",
        &config.server.log_level,
    )?;

    tracing::info!("CountryFX Backend starting...");
    tracing::info!("Database: {}", config.database.path.display());

    let store = CountryStore::open(&config.database.path)?;
    tracing::info!("Country store ready ({} records)", store.count()?);

    if let Some(parent) = config.artifact.path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create artifact directory {}", parent.display()))?;
    }

    let gateway = HttpSourceGateway::new(&config.sources)?;
    let renderer = SummaryRenderer::new(&config.artifact.path, &config.artifact.fonts_dir);
    let updater = Arc::new(CountryUpdater::new(Arc::new(gateway), store, renderer));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = service::router(AppState::new(updater, &config.artifact.path))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.server_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.server_address()))?;
    tracing::info!("HTTP server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("CountryFX Backend stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
