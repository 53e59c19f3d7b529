//! Record Routes
//!
//! Pass-through writes to the record store.
//!
//! - POST /api/v1/records - Create a record
//! - PATCH /api/v1/records/:id - Update fields of a record

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::store::HealthMetricRecord;

/// POST /api/v1/records
pub async fn create_record(
    State(state): State<Arc<AppState>>,
    Json(record): Json<HealthMetricRecord>,
) -> ApiResult<(StatusCode, Json<HealthMetricRecord>)> {
    if record.is_empty() {
        return Err(ApiError::Validation("record has no fields".into()));
    }

    let created = state.adapter.try_create_record(&record).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/v1/records/:id
pub async fn update_record(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(partial): Json<HealthMetricRecord>,
) -> ApiResult<Json<HealthMetricRecord>> {
    if partial.is_empty() {
        return Err(ApiError::Validation("update has no fields".into()));
    }

    let updated = state.adapter.try_update_record(&id, &partial).await?;
    Ok(Json(updated))
}
