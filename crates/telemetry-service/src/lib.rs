//! Energy Log Service
//!
//! Runs the periodic sampler and exposes the log over HTTP:
//! `GET /read` drains unread records, `GET /status` reports the ring
//! counters, `POST /config` stores a small opaque payload.

use axum::{routing::get, Router};
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod config_store;
mod routes;
mod service;
mod settings;

pub use config_store::{ConfigStore, MAX_CONFIG_LEN};
pub use service::TelemetryService;
pub use settings::{SensorBackend, ServiceConfig, DEFAULT_CONFIG_NAME};

/// Service errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Create the application router
pub fn create_router(service: Arc<TelemetryService>) -> Router {
    Router::new()
        .route("/read", get(routes::read::read_log))
        .route("/status", get(routes::status::get_status))
        .route(
            "/config",
            get(routes::config::read_config).post(routes::config::write_config),
        )
        .route("/health", get(routes::status::health))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Initialize logging
pub fn init_logging() -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}

/// Run the sampler and HTTP server until Ctrl-C
pub async fn run_server(config: ServiceConfig) -> Result<(), ServiceError> {
    let service = Arc::new(TelemetryService::start(&config, config.sensor_set()));
    let app = create_router(Arc::clone(&service));

    info!("Starting telemetry server on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|source| ServiceError::Bind {
            addr: config.listen_addr.clone(),
            source,
        })?;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    service.shutdown().await;
    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl-C, running until killed: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
