//! # Pulseboard
//!
//! Health dashboard backend - reads daily health records from a remote
//! record store and turns them into dashboard-ready cards.
//!
//! ## Features
//!
//! - **Today's record**: picks the row dated today in local time, falling
//!   back to the most recent row
//! - **Projections**: Oura scores, nutrition macros and quick vitals
//! - **Honest placeholders**: metrics the store lacks are reported as
//!   unavailable instead of invented
//! - **History**: recent days for trend charts
//! - **Writes**: pass-through create and update
//!
//! ## Modules
//!
//! - [`store`]: Record store trait, HTTP and in-memory backends
//! - [`adapter`]: The metrics adapter
//! - [`projections`]: Card types and column parsing
//! - [`api`]: REST API server with Axum
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pulseboard::adapter::MetricsAdapter;
//! use pulseboard::store::{HealthMetricRecord, MemoryStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryStore::with_records(vec![HealthMetricRecord::new()
//!         .id("r1")
//!         .date("2026-10-16")
//!         .sleep_score("82")
//!         .calories("1850")]));
//!
//!     let adapter = MetricsAdapter::new(store);
//!
//!     if let Some(record) = adapter.fetch_today_record().await {
//!         let oura = adapter.to_oura_metrics(&record);
//!         println!("Sleep score: {}", oura.sleep_score);
//!     }
//! }
//! ```

pub mod adapter;
pub mod api;
pub mod config;
pub mod projections;
pub mod store;

// Re-export top-level types for convenience
pub use adapter::{
    AdapterConfig, DashboardSnapshot, DayWindow, FetchOutcome, MetricsAdapter, SnapshotSource,
};

pub use projections::{
    MacroProgress, NutritionGoals, NutritionMetrics, OuraMetrics, PlaceholderPolicy, QuickVitals,
    Reading, StressLevel,
};

pub use store::{
    FieldValue, HealthMetricRecord, HttpRecordStore, MemoryStore, RecordStore, StoreError,
    StoreResult,
};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{
    ApiConfig as ConfigApiConfig, Config, ConfigError, DashboardConfig, LoadedConfig,
    LoggingConfig, StoreConfig, StoreKind,
};
