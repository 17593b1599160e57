//! Health endpoint: process uptime plus the in-memory metrics snapshot.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use heimdall_core::MetricsSnapshot;

use crate::AppState;

/// Body of the health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the process can answer at all.
    pub status: &'static str,
    /// Current counters, including uptime.
    #[serde(flatten)]
    pub metrics: MetricsSnapshot,
}

/// `GET /health` — liveness plus metrics.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        metrics: state.metrics().snapshot(),
    })
}
