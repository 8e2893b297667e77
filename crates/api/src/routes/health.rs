//! Health Route

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::AppState;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub database: String,
}

/// `GET /health`
///
/// 503 when the store does not answer a trivial query.
pub async fn health_handler(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let (status, code, database) = match state.repository.ping().await {
        Ok(()) => ("healthy", StatusCode::OK, "ok"),
        Err(e) => {
            warn!("Health check failed: {}", e);
            ("degraded", StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            version: state.version.clone(),
            uptime_seconds: state.start_time.elapsed().as_secs(),
            database: database.to_string(),
        }),
    )
}
