//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (record store reachable)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Returns 200 when the record store answers a health check.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    match state.adapter.store().health_check().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Record store not ready");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// GET /health
///
/// Full health status. The dashboard still serves (zero-filled) data when
/// the store is down, so that case is "degraded" rather than an error.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let store = state.adapter.store();
    let store_ok = store.health_check().await.is_ok();

    Json(HealthResponse {
        status: if store_ok { "healthy" } else { "degraded" }.to_string(),
        store: if store_ok { "ok" } else { "error" }.to_string(),
        store_kind: store.name().to_string(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
