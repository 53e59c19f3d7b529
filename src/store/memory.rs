//! In-memory record store
//!
//! Keeps rows in insertion order, like a freshly provisioned table. Also
//! records every query it serves and can be told to fail, which makes it the
//! fake store for adapter tests.

use super::*;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::projections::parse_date;

/// In-process record store
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<HealthMetricRecord>>,
    queries: RwLock<Vec<QueryOptions>>,
    offline: AtomicBool,
    failures_pending: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given rows, in order
    pub fn with_records(records: Vec<HealthMetricRecord>) -> Self {
        Self {
            records: RwLock::new(records),
            ..Self::default()
        }
    }

    /// Create a store with one plausible row per day, newest first
    ///
    /// Values are derived from the day offset so repeated runs agree.
    pub fn with_sample_days<Tz: TimeZone>(now: DateTime<Tz>, days: usize) -> Self {
        let now = now.with_timezone(&Utc);
        let records = (0..days)
            .map(|i| {
                let n = i as i64;
                let date = now - Duration::days(n);
                HealthMetricRecord::new()
                    .id(uuid::Uuid::new_v4().to_string())
                    .date(date.to_rfc3339())
                    .sleep_score((72 + (n * 7) % 25).to_string())
                    .readiness_score((68 + (n * 11) % 30).to_string())
                    .calories((1700 + (n * 137) % 600).to_string())
                    .protein((110 + (n * 13) % 60).to_string())
                    .carbs((200 + (n * 29) % 90).to_string())
                    .fat((55 + (n * 5) % 25).to_string())
                    .hrv((38 + (n * 3) % 20).to_string())
                    .meditation_minutes(((n * 4) % 21).to_string())
                    .metric_name("daily")
            })
            .collect();
        Self::with_records(records)
    }

    /// Append a row
    pub async fn insert(&self, record: HealthMetricRecord) {
        self.records.write().await.push(record);
    }

    /// Snapshot of all rows
    pub async fn records(&self) -> Vec<HealthMetricRecord> {
        self.records.read().await.clone()
    }

    /// Every query served so far, oldest first
    pub async fn queries(&self) -> Vec<QueryOptions> {
        self.queries.read().await.clone()
    }

    /// Make every call fail with `StoreError::Unavailable` until reset
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make the next `count` calls fail with `StoreError::Unavailable`
    pub fn fail_next(&self, count: usize) {
        self.failures_pending.store(count, Ordering::SeqCst);
    }

    fn check_faults(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        let consumed = self
            .failures_pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if consumed.is_ok() {
            return Err(StoreError::Unavailable);
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn query(&self, options: &QueryOptions) -> StoreResult<Vec<HealthMetricRecord>> {
        self.queries.write().await.push(options.clone());
        self.check_faults()?;

        let mut rows = self.records.read().await.clone();

        if let Some(order) = options.order_by {
            if order.field == Field::Date {
                // Undated rows sort last in either direction
                rows.sort_by(|a, b| {
                    let (da, db) = (parse_date(a.date.as_ref()), parse_date(b.date.as_ref()));
                    match (da, db) {
                        (Some(x), Some(y)) if order.descending => y.cmp(&x),
                        (Some(x), Some(y)) => x.cmp(&y),
                        (Some(_), None) => std::cmp::Ordering::Less,
                        (None, Some(_)) => std::cmp::Ordering::Greater,
                        (None, None) => std::cmp::Ordering::Equal,
                    }
                });
            }
        }

        Ok(rows
            .iter()
            .take(options.top)
            .map(|r| r.project(&options.select))
            .collect())
    }

    async fn create(&self, record: &HealthMetricRecord) -> StoreResult<HealthMetricRecord> {
        self.check_faults()?;

        let mut stored = record.clone();
        stored.id = Some(uuid::Uuid::new_v4().to_string());
        self.records.write().await.push(stored.clone());

        Ok(stored)
    }

    async fn update(
        &self,
        id: &str,
        partial: &HealthMetricRecord,
    ) -> StoreResult<HealthMetricRecord> {
        self.check_faults()?;

        let mut records = self.records.write().await;
        let row = records
            .iter_mut()
            .find(|r| r.id.as_deref() == Some(id))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        row.merge(partial);
        Ok(row.clone())
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.check_faults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_query_honors_top_and_select() {
        let store = MemoryStore::with_records(vec![
            HealthMetricRecord::new().id("a").hrv("40").calories("1900"),
            HealthMetricRecord::new().id("b").hrv("41"),
            HealthMetricRecord::new().id("c").hrv("42"),
        ]);

        let rows = store
            .query(&QueryOptions::new(&[Field::Calories], 2))
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id.as_deref(), Some("a"));
        assert!(rows[0].calories.is_some());
        assert!(rows[0].hrv.is_none());
        assert_eq!(store.queries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_query_orders_by_date_desc() {
        let store = MemoryStore::with_records(vec![
            HealthMetricRecord::new().id("old").date("2026-10-01T08:00:00Z"),
            HealthMetricRecord::new().id("undated"),
            HealthMetricRecord::new().id("new").date("2026-10-15T08:00:00Z"),
        ]);

        let rows = store
            .query(&QueryOptions::new(&[Field::Date], 10).order_by(OrderBy::date_desc()))
            .await
            .unwrap();

        let ids: Vec<_> = rows.iter().filter_map(|r| r.id.as_deref()).collect();
        assert_eq!(ids, vec!["new", "old", "undated"]);
    }

    #[tokio::test]
    async fn test_fail_next_then_recover() {
        let store = MemoryStore::new();
        store.fail_next(1);

        let options = QueryOptions::new(&TODAY_FIELDS, 10);
        assert!(matches!(store.query(&options).await, Err(StoreError::Unavailable)));
        assert!(store.query(&options).await.is_ok());
    }

    #[tokio::test]
    async fn test_offline() {
        let store = MemoryStore::new();
        store.set_offline(true);
        assert!(store.health_check().await.is_err());
        store.set_offline(false);
        assert!(store.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_create_assigns_id() {
        let store = MemoryStore::new();
        let created = store
            .create(&HealthMetricRecord::new().sleep_score("88"))
            .await
            .unwrap();

        assert!(created.id.is_some());
        assert_eq!(store.records().await.len(), 1);
    }

    #[tokio::test]
    async fn test_update_merges_and_reports_missing() {
        let store = MemoryStore::with_records(vec![HealthMetricRecord::new()
            .id("r1")
            .protein("100")
            .carbs("200")]);

        let updated = store
            .update("r1", &HealthMetricRecord::new().protein("120"))
            .await
            .unwrap();
        assert_eq!(updated.protein, Some(FieldValue::from("120")));
        assert_eq!(updated.carbs, Some(FieldValue::from("200")));

        let missing = store.update("nope", &HealthMetricRecord::new().fat("1")).await;
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_sample_days_newest_first() {
        let now = Utc::now();
        let store = MemoryStore::with_sample_days(now, 5);
        let records = store.records().await;

        assert_eq!(records.len(), 5);
        let first = parse_date(records[0].date.as_ref()).unwrap();
        let last = parse_date(records[4].date.as_ref()).unwrap();
        assert!(first > last);
    }
}
