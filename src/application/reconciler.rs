//! Reconciliation writer
//!
//! Computes deltas against the stored previous state and writes the current
//! state followed by the month's history snapshot. Re-running with the same
//! record in the same month converges: one snapshot, zero deltas.

#![allow(clippy::uninlined_format_args)]

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::stats::{format_change, monthly_change};
use crate::domain::{
    CurrentStateUpdate, HistorySnapshot, MetricRecord, MetricStore, PeriodKey, ReconciliationResult, StoreResult,
};

#[derive(Clone)]
pub struct ReconciliationWriter {
    store: Arc<dyn MetricStore>,
}

impl ReconciliationWriter {
    pub fn new(store: Arc<dyn MetricStore>) -> Self {
        Self { store }
    }

    /// Reconcile `next` against `previous` for the current month
    pub async fn reconcile(
        &self,
        profile_id: &str,
        previous: Option<&MetricRecord>,
        next: &MetricRecord,
    ) -> StoreResult<ReconciliationResult> {
        self.reconcile_at(profile_id, previous, next, Utc::now()).await
    }

    /// Same as `reconcile`, with the previous state read from the store first
    pub async fn reconcile_with_stored(&self, profile_id: &str, next: &MetricRecord) -> StoreResult<ReconciliationResult> {
        let previous = self.store.load_current(profile_id).await?;
        self.reconcile(profile_id, previous.as_ref(), next).await
    }

    /// Reconcile with an explicit clock; `now` picks the snapshot period
    pub async fn reconcile_at(
        &self,
        profile_id: &str,
        previous: Option<&MetricRecord>,
        next: &MetricRecord,
        now: DateTime<Utc>,
    ) -> StoreResult<ReconciliationResult> {
        let result = ReconciliationResult::compute(previous, next);
        let period_key = PeriodKey::month_of(now);

        self.store
            .upsert_current(profile_id, &CurrentStateUpdate::from_result(&result, now))
            .await?;
        debug!("Current state written for {}", profile_id);

        self.store
            .upsert_snapshot(profile_id, &HistorySnapshot::from_result(&result, period_key.clone(), now))
            .await?;

        let points_percent = monthly_change(next.points, previous.map(|p| p.points))
            .map(|change| format!(" ({:+.1}%)", change.percent_change))
            .unwrap_or_default();
        info!(
            "💾 Updated {} [{}]: {} points{}, {} photo views{}",
            profile_id,
            period_key,
            format_change(result.deltas.points_change),
            points_percent,
            format_change(result.deltas.photo_views_change),
            if result.flags.leveled_up { ", leveled up" } else { "" }
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    use crate::domain::StoreError;

    #[derive(Default)]
    struct MemoryStore {
        current: Mutex<HashMap<String, CurrentStateUpdate>>,
        snapshots: Mutex<HashMap<(String, PeriodKey), HistorySnapshot>>,
        fail_snapshots: bool,
    }

    #[async_trait]
    impl MetricStore for MemoryStore {
        async fn upsert_current(&self, profile_id: &str, update: &CurrentStateUpdate) -> StoreResult<()> {
            self.current.lock().await.insert(profile_id.to_string(), update.clone());
            Ok(())
        }

        async fn upsert_snapshot(&self, profile_id: &str, snapshot: &HistorySnapshot) -> StoreResult<()> {
            if self.fail_snapshots {
                return Err(StoreError::NotFound {
                    profile_id: profile_id.to_string(),
                });
            }
            self.snapshots
                .lock()
                .await
                .insert((profile_id.to_string(), snapshot.period_key.clone()), snapshot.clone());
            Ok(())
        }

        async fn load_current(&self, profile_id: &str) -> StoreResult<Option<MetricRecord>> {
            Ok(self.current.lock().await.get(profile_id).map(|update| update.metrics))
        }

        async fn load_snapshot(&self, profile_id: &str, period_key: &PeriodKey) -> StoreResult<Option<HistorySnapshot>> {
            Ok(self
                .snapshots
                .lock()
                .await
                .get(&(profile_id.to_string(), period_key.clone()))
                .cloned())
        }
    }

    fn record(points: u64, photo_views: u64) -> MetricRecord {
        MetricRecord {
            points,
            photo_views,
            photo_count: 10,
            ..MetricRecord::default()
        }
    }

    #[tokio::test]
    async fn writes_current_state_and_month_snapshot() {
        let store = Arc::new(MemoryStore::default());
        let writer = ReconciliationWriter::new(store.clone());
        let now = Utc.with_ymd_and_hms(2024, 5, 17, 8, 30, 0).unwrap();

        let result = writer
            .reconcile_at("g1", Some(&record(100, 1_000)), &record(150, 1_500), now)
            .await
            .unwrap();
        assert_eq!(result.deltas.points_change, 50);

        let snapshot = store.load_snapshot("g1", &PeriodKey::from("2024-05")).await.unwrap().unwrap();
        assert_eq!(snapshot.points, 150);
        assert_eq!(snapshot.photo_views_change, 500);
        assert_eq!(snapshot.recorded_at, now);

        let current = store.current.lock().await.get("g1").cloned().unwrap();
        assert_eq!(current.avg_views_per_photo, 150);
        assert_eq!(current.updated_at, now);
    }

    #[tokio::test]
    async fn snapshot_failure_is_reported_after_the_current_write() {
        let store = Arc::new(MemoryStore {
            fail_snapshots: true,
            ..MemoryStore::default()
        });
        let writer = ReconciliationWriter::new(store.clone());

        let err = writer.reconcile("g1", None, &record(10, 0)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert_eq!(store.load_current("g1").await.unwrap().map(|r| r.points), Some(10));
    }

    #[tokio::test]
    async fn stored_state_is_the_baseline() {
        let store = Arc::new(MemoryStore::default());
        let writer = ReconciliationWriter::new(store);

        let first = writer.reconcile_with_stored("g1", &record(200, 900)).await.unwrap();
        assert_eq!(first.deltas.points_change, 200);

        let again = writer.reconcile_with_stored("g1", &record(200, 900)).await.unwrap();
        assert_eq!(again.deltas.points_change, 0);
        assert_eq!(again.deltas.photo_views_change, 0);
    }
}
