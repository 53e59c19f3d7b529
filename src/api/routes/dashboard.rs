//! Dashboard Routes
//!
//! Read endpoints that feed the dashboard cards.
//!
//! - GET /api/v1/dashboard - All projections from one fetch
//! - GET /api/v1/today - Today's raw record
//! - GET /api/v1/oura - Sleep, readiness and activity scores
//! - GET /api/v1/nutrition - Macros for the day
//! - GET /api/v1/vitals - Quick vitals
//! - GET /api/v1/history?days=N - Recent days for charts

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::adapter::{DashboardSnapshot, FetchOutcome};
use crate::api::dto::{HistoryParams, HistoryPoint, HistoryResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::projections::{NutritionMetrics, OuraMetrics, QuickVitals};
use crate::store::HealthMetricRecord;

/// GET /api/v1/dashboard
///
/// Never fails; `source` tells the client whether the store was reachable.
pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardSnapshot> {
    Json(state.adapter.snapshot().await)
}

/// GET /api/v1/today
pub async fn get_today(State(state): State<Arc<AppState>>) -> ApiResult<Json<HealthMetricRecord>> {
    today_record(&state).await.map(Json)
}

/// GET /api/v1/oura
pub async fn get_oura(State(state): State<Arc<AppState>>) -> ApiResult<Json<OuraMetrics>> {
    let record = today_record(&state).await?;
    Ok(Json(state.adapter.to_oura_metrics(&record)))
}

/// GET /api/v1/nutrition
pub async fn get_nutrition(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<NutritionMetrics>> {
    let record = today_record(&state).await?;
    Ok(Json(state.adapter.to_nutrition_metrics(&record)))
}

/// GET /api/v1/vitals
pub async fn get_vitals(State(state): State<Arc<AppState>>) -> ApiResult<Json<QuickVitals>> {
    let record = today_record(&state).await?;
    Ok(Json(state.adapter.to_quick_vitals(&record)))
}

/// GET /api/v1/history
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> ApiResult<Json<HistoryResponse>> {
    let days = params.days.unwrap_or(state.config.history_days);
    if days == 0 || days > state.config.max_history_days {
        return Err(ApiError::Validation(format!(
            "days must be between 1 and {}",
            state.config.max_history_days
        )));
    }

    let records = state.adapter.try_fetch_historical(days).await?;

    Ok(Json(HistoryResponse {
        days,
        points: records.iter().map(HistoryPoint::from).collect(),
    }))
}

async fn today_record(state: &AppState) -> ApiResult<HealthMetricRecord> {
    match state.adapter.fetch_today().await {
        FetchOutcome::Found(record) => Ok(record),
        FetchOutcome::Empty => Err(ApiError::NotFound("No health metrics recorded".into())),
        FetchOutcome::Failed(e) => Err(ApiError::Store(e)),
    }
}
