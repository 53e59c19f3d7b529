//! Record Store Boundary
//!
//! The dashboard reads its data from a remote record store owned by a
//! low-code platform. This module narrows that dependency to one trait with
//! three capabilities (query, create, update) so the adapter can run against
//! the real HTTP store or an in-process fake.
//!
//! - [`HttpRecordStore`]: OData-style REST store
//! - [`MemoryStore`]: In-process store for tests, demos and offline use

mod http;
mod memory;
mod record;

pub use http::{HttpRecordStore, HttpStoreConfig};
pub use memory::MemoryStore;
pub use record::{Field, FieldValue, HealthMetricRecord, HISTORY_FIELDS, TODAY_FIELDS};

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{StoreConfig, StoreKind};

/// Common trait for all record stores
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short name used in log fields
    fn name(&self) -> &str;

    /// Fetch up to `options.top` records with the selected columns
    async fn query(&self, options: &QueryOptions) -> StoreResult<Vec<HealthMetricRecord>>;

    /// Persist a new record and return it as stored
    async fn create(&self, record: &HealthMetricRecord) -> StoreResult<HealthMetricRecord>;

    /// Apply the present fields of `partial` to record `id`
    async fn update(
        &self,
        id: &str,
        partial: &HealthMetricRecord,
    ) -> StoreResult<HealthMetricRecord>;

    /// Check that the store is reachable
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Parameters of a store query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// Columns to return, in request order
    pub select: Vec<Field>,
    /// Row cap
    pub top: usize,
    /// Explicit ordering; `None` leaves ordering to the store
    pub order_by: Option<OrderBy>,
}

impl QueryOptions {
    /// Create query options for the given columns and row cap
    pub fn new(select: &[Field], top: usize) -> Self {
        Self {
            select: select.to_vec(),
            top,
            order_by: None,
        }
    }

    /// Builder method: set ordering
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }
}

/// Sort order for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: Field,
    pub descending: bool,
}

impl OrderBy {
    /// Most recent date first
    pub fn date_desc() -> Self {
        Self {
            field: Field::Date,
            descending: true,
        }
    }
}

/// Errors that can occur when talking to a record store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record store unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode store response: {0}")]
    Decode(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record rejected: {0}")]
    Rejected(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Build the record store described by the configuration
pub fn from_config(config: &StoreConfig) -> StoreResult<Arc<dyn RecordStore>> {
    match config.kind {
        StoreKind::Http => {
            let store = HttpRecordStore::new(HttpStoreConfig {
                base_url: config.url.clone(),
                entity_set: config.entity_set.clone(),
                column_prefix: config.column_prefix.clone(),
                token: config.token.clone(),
                request_timeout_ms: config.request_timeout_ms,
            })?;
            Ok(Arc::new(store))
        }
        StoreKind::Memory => Ok(Arc::new(MemoryStore::with_sample_days(
            chrono::Local::now(),
            config.sample_days,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_options_builder() {
        let options = QueryOptions::new(&HISTORY_FIELDS, 7).order_by(OrderBy::date_desc());
        assert_eq!(options.top, 7);
        assert_eq!(options.select.len(), 4);
        assert_eq!(options.order_by, Some(OrderBy::date_desc()));
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::Api {
            status: 401,
            message: "unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "API error 401: unauthorized");
        assert_eq!(StoreError::Timeout.to_string(), "Request timeout");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: StoreError = json_err.into();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[tokio::test]
    async fn test_memory_store_from_config() {
        let config = StoreConfig {
            kind: StoreKind::Memory,
            sample_days: 3,
            ..StoreConfig::default()
        };
        let store = from_config(&config).unwrap();
        assert_eq!(store.name(), "memory");

        let rows = store
            .query(&QueryOptions::new(&TODAY_FIELDS, 10))
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
    }
}
