//! Log Read Route

use axum::extract::{Query, State};
use serde::Deserialize;
use std::sync::Arc;

use crate::TelemetryService;

/// Query parameters for the read endpoint
#[derive(Debug, Deserialize)]
pub struct ReadQuery {
    /// Upper bound on the returned text; defaults to a full ring
    pub max_bytes: Option<usize>,
}

/// Drain unread log records
pub async fn read_log(
    State(service): State<Arc<TelemetryService>>,
    Query(params): Query<ReadQuery>,
) -> String {
    match params.max_bytes {
        Some(max_bytes) => service.read(max_bytes),
        None => service.read_all(),
    }
}
