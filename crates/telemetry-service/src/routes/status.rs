//! Status Routes

use axum::{extract::State, Json};
use ring_log::LogStatus;
use serde::Serialize;
use std::sync::Arc;

use crate::TelemetryService;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub sampling: bool,
    pub log: LogStatus,
}

/// Counter line; never consumes records
pub async fn get_status(State(service): State<Arc<TelemetryService>>) -> String {
    service.status()
}

/// Service health with the same counters in JSON
pub async fn health(State(service): State<Arc<TelemetryService>>) -> Json<HealthResponse> {
    let sampling = service.is_sampling();
    Json(HealthResponse {
        status: if sampling { "sampling" } else { "stopped" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: service.uptime().as_secs(),
        sampling,
        log: service.counters(),
    })
}
