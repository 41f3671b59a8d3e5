use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use duel_lords_status::api;
use duel_lords_status::config::Config;
use duel_lords_status::error::AppError;
use duel_lords_status::indicator::SharedIndicator;
use duel_lords_status::metrics;
use duel_lords_status::poller::StatusPoller;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let config = Config::load();
    metrics::register_metrics();

    let indicator = SharedIndicator::new();
    let poller = Arc::new(StatusPoller::new(&config, indicator.clone())?);
    let handle = poller.spawn();

    let app = api::router(indicator).layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    tracing::info!("Status dashboard listening on {}", config.listen_addr());

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {e}");
            }
            tracing::info!("Shutting down");
        })
        .await;

    handle.shutdown().await;
    served?;
    Ok(())
}
