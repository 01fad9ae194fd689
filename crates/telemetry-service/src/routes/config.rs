//! Config Routes

use axum::{body::Bytes, extract::State};
use std::sync::Arc;

use crate::TelemetryService;

/// Store a config payload, truncated to 128 bytes; responds with the count kept
pub async fn write_config(State(service): State<Arc<TelemetryService>>, body: Bytes) -> String {
    service.write_config(&body).to_string()
}

/// The config endpoint has nothing to read back
pub async fn read_config(State(service): State<Arc<TelemetryService>>) -> Vec<u8> {
    service.read_config()
}
