//! Data Transfer Objects
//!
//! Request and response types for the API endpoints that are not plain
//! projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::projections::{parse_date, parse_int};
use crate::store::HealthMetricRecord;

// ============================================
// HISTORY DTOs
// ============================================

/// Query string for `GET /api/v1/history`
#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    /// Number of recent records (defaults to the configured history)
    #[serde(default)]
    pub days: Option<usize>,
}

/// History response, newest first
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub days: usize,
    pub points: Vec<HistoryPoint>,
}

/// One charted day
#[derive(Debug, Serialize, PartialEq)]
pub struct HistoryPoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub calories: i64,
    pub sleep_score: i64,
    pub readiness_score: i64,
}

impl From<&HealthMetricRecord> for HistoryPoint {
    fn from(record: &HealthMetricRecord) -> Self {
        Self {
            id: record.id.clone(),
            date: parse_date(record.date.as_ref()),
            calories: parse_int(record.calories.as_ref()),
            sleep_score: parse_int(record.sleep_score.as_ref()),
            readiness_score: parse_int(record.readiness_score.as_ref()),
        }
    }
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy or degraded
    pub status: String,
    /// Record store status
    pub store: String,
    /// Record store backend name
    pub store_kind: String,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}
