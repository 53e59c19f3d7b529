//! Metrics Adapter
//!
//! Bridges the remote record store to dashboard projections.
//!
//! ## Data Flow
//!
//! 1. Query the store for the most recent rows (fixed column subset)
//! 2. Pick the row dated today in local time, else the first row
//! 3. Project the row into [`OuraMetrics`], [`NutritionMetrics`] and
//!    [`QuickVitals`]
//!
//! The adapter holds no per-call state: every call builds its own request,
//! nothing is cached, and concurrent calls cannot interfere.
//!
//! ## Failure handling
//!
//! The `fetch_*_record` / `fetch_historical` / `create_record` /
//! `update_record` operations never fail: store errors are logged and come
//! back as `None` or an empty list, so a dashboard always has something to
//! render. Callers that need to tell "no data" from "store down" use
//! [`MetricsAdapter::fetch_today`] (a [`FetchOutcome`]) or the `try_*`
//! variants instead.

mod window;

pub use window::{select_today, DayWindow, Selection};

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::projections::{
    MacroProgress, NutritionGoals, NutritionMetrics, OuraMetrics, PlaceholderPolicy, QuickVitals,
};
use crate::store::{
    HealthMetricRecord, OrderBy, QueryOptions, RecordStore, StoreError, StoreResult,
    HISTORY_FIELDS, TODAY_FIELDS,
};

/// Adapter behavior settings
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    /// Row cap when looking for today's record
    pub today_rows: usize,
    /// How to fill metrics the store does not carry
    pub placeholders: PlaceholderPolicy,
    /// Ask the store for date-descending rows instead of trusting its default order
    pub request_order: bool,
    /// Daily nutrition targets for snapshots
    pub goals: NutritionGoals,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            today_rows: 10,
            placeholders: PlaceholderPolicy::default(),
            request_order: true,
            goals: NutritionGoals::default(),
        }
    }
}

/// Result of a fetch that distinguishes "no data" from "store failed"
#[derive(Debug)]
pub enum FetchOutcome<T> {
    Found(T),
    Empty,
    Failed(StoreError),
}

impl<T> FetchOutcome<T> {
    /// Collapse to an option, treating failure like absence
    pub fn into_option(self) -> Option<T> {
        match self {
            FetchOutcome::Found(value) => Some(value),
            FetchOutcome::Empty | FetchOutcome::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
        match self {
            FetchOutcome::Found(value) => FetchOutcome::Found(f(value)),
            FetchOutcome::Empty => FetchOutcome::Empty,
            FetchOutcome::Failed(e) => FetchOutcome::Failed(e),
        }
    }
}

/// Where a snapshot's record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    /// A record dated today
    Today,
    /// No record dated today; the most recent one was used
    MostRecent,
    /// The store holds no records
    NoData,
    /// The store could not be reached
    StoreFailed,
}

/// Everything the dashboard needs from one fetch
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub source: SnapshotSource,
    pub fetched_at: DateTime<Utc>,
    pub record: Option<HealthMetricRecord>,
    pub oura: Option<OuraMetrics>,
    pub nutrition: Option<NutritionMetrics>,
    pub nutrition_progress: Vec<MacroProgress>,
    pub vitals: Option<QuickVitals>,
}

/// Stateless adapter from a record store to dashboard projections
pub struct MetricsAdapter<S: RecordStore + ?Sized> {
    store: Arc<S>,
    config: AdapterConfig,
}

impl<S: RecordStore + ?Sized> Clone for MetricsAdapter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: RecordStore + ?Sized> MetricsAdapter<S> {
    /// Create an adapter with default settings
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, AdapterConfig::default())
    }

    /// Create an adapter with custom settings
    pub fn with_config(store: Arc<S>, config: AdapterConfig) -> Self {
        Self { store, config }
    }

    /// Get the current configuration
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Get the underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn options(&self, fields: &[crate::store::Field], top: usize) -> QueryOptions {
        let options = QueryOptions::new(fields, top);
        if self.config.request_order {
            options.order_by(OrderBy::date_desc())
        } else {
            options
        }
    }

    // ============================================
    // Today
    // ============================================

    /// Fetch today's record, or the most recent one
    ///
    /// Returns `None` both when the store is empty and when it failed.
    pub async fn fetch_today_record(&self) -> Option<HealthMetricRecord> {
        self.fetch_today().await.into_option()
    }

    /// Fetch today's record, keeping store failures distinct
    pub async fn fetch_today(&self) -> FetchOutcome<HealthMetricRecord> {
        self.fetch_today_within(DayWindow::today(&Local::now())).await
    }

    /// Fetch the record dated inside `window`, or the most recent one
    pub async fn fetch_today_within(&self, window: DayWindow) -> FetchOutcome<HealthMetricRecord> {
        match self.select_within(window).await {
            Ok(Some((record, _))) => FetchOutcome::Found(record),
            Ok(None) => FetchOutcome::Empty,
            Err(e) => FetchOutcome::Failed(e),
        }
    }

    async fn select_within(
        &self,
        window: DayWindow,
    ) -> StoreResult<Option<(HealthMetricRecord, Selection)>> {
        let options = self.options(&TODAY_FIELDS, self.config.today_rows);

        let mut records = self.store.query(&options).await.map_err(|e| {
            tracing::error!(
                store = self.store.name(),
                error = %e,
                "Error fetching health metrics"
            );
            e
        })?;

        let selection = select_today(&records, &window);
        let record = match selection {
            Selection::Today(idx) => Some(records.swap_remove(idx)),
            Selection::MostRecent => {
                tracing::debug!(
                    rows = records.len(),
                    "No record dated today, using most recent"
                );
                Some(records.swap_remove(0))
            }
            Selection::Empty => None,
        };

        Ok(record.map(|r| (r, selection)))
    }

    // ============================================
    // Projections
    // ============================================

    pub fn to_oura_metrics(&self, record: &HealthMetricRecord) -> OuraMetrics {
        OuraMetrics::from_record(record, self.config.placeholders)
    }

    pub fn to_nutrition_metrics(&self, record: &HealthMetricRecord) -> NutritionMetrics {
        NutritionMetrics::from_record(record)
    }

    pub fn to_quick_vitals(&self, record: &HealthMetricRecord) -> QuickVitals {
        QuickVitals::from_record(record, self.config.placeholders)
    }

    /// Fetch today's record once and build every projection from it
    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.snapshot_within(DayWindow::today(&Local::now())).await
    }

    pub async fn snapshot_within(&self, window: DayWindow) -> DashboardSnapshot {
        let (source, record) = match self.select_within(window).await {
            Ok(Some((record, Selection::Today(_)))) => (SnapshotSource::Today, Some(record)),
            Ok(Some((record, _))) => (SnapshotSource::MostRecent, Some(record)),
            Ok(None) => (SnapshotSource::NoData, None),
            Err(_) => (SnapshotSource::StoreFailed, None),
        };

        let nutrition = record.as_ref().map(|r| self.to_nutrition_metrics(r));
        let nutrition_progress = nutrition
            .as_ref()
            .map(|n| n.progress(&self.config.goals).to_vec())
            .unwrap_or_default();

        DashboardSnapshot {
            source,
            fetched_at: Utc::now(),
            oura: record.as_ref().map(|r| self.to_oura_metrics(r)),
            vitals: record.as_ref().map(|r| self.to_quick_vitals(r)),
            nutrition,
            nutrition_progress,
            record,
        }
    }

    // ============================================
    // History
    // ============================================

    /// Fetch up to `days` recent records for charting, empty on failure
    pub async fn fetch_historical(&self, days: usize) -> Vec<HealthMetricRecord> {
        self.try_fetch_historical(days).await.unwrap_or_default()
    }

    /// Fetch up to `days` recent records for charting
    pub async fn try_fetch_historical(&self, days: usize) -> StoreResult<Vec<HealthMetricRecord>> {
        let options = self.options(&HISTORY_FIELDS, days);

        self.store.query(&options).await.map_err(|e| {
            tracing::error!(
                store = self.store.name(),
                days,
                error = %e,
                "Error fetching historical metrics"
            );
            e
        })
    }

    // ============================================
    // Writes
    // ============================================

    /// Create a record, `None` on failure
    pub async fn create_record(&self, data: &HealthMetricRecord) -> Option<HealthMetricRecord> {
        self.try_create_record(data).await.ok()
    }

    /// Create a record; any id on `data` is ignored
    pub async fn try_create_record(
        &self,
        data: &HealthMetricRecord,
    ) -> StoreResult<HealthMetricRecord> {
        let mut data = data.clone();
        data.id = None;

        let created = self.store.create(&data).await.map_err(|e| {
            tracing::error!(store = self.store.name(), error = %e, "Error creating health metric");
            e
        })?;

        tracing::info!(id = ?created.id, "Created health metric");
        Ok(created)
    }

    /// Update a record, `None` on failure
    pub async fn update_record(
        &self,
        id: &str,
        partial: &HealthMetricRecord,
    ) -> Option<HealthMetricRecord> {
        self.try_update_record(id, partial).await.ok()
    }

    pub async fn try_update_record(
        &self,
        id: &str,
        partial: &HealthMetricRecord,
    ) -> StoreResult<HealthMetricRecord> {
        self.store.update(id, partial).await.map_err(|e| {
            tracing::error!(
                store = self.store.name(),
                id,
                error = %e,
                "Error updating health metric"
            );
            e
        })
    }
}
