//! SQLite repository for tracked guides
//!
//! `guides` holds one mutable current-state row per guide, `guide_history`
//! one row per guide and month. Both writes are idempotent: the current
//! state is overwritten in place and a snapshot for an existing
//! `(guide_id, period_key)` replaces the old row.

#![allow(clippy::uninlined_format_args)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use tracing::debug;

use crate::domain::{
    CurrentStateUpdate, HistorySnapshot, MetricField, MetricRecord, MetricStore, PeriodKey, ProfileReference,
    ProfileStatus, StoreError, StoreResult, WorklistProvider,
};

const METRIC_COLUMNS: [(MetricField, &str); 12] = [
    (MetricField::Level, "level"),
    (MetricField::Points, "points"),
    (MetricField::ReviewCount, "review_count"),
    (MetricField::RatingCount, "rating_count"),
    (MetricField::PhotoCount, "photo_count"),
    (MetricField::PhotoViews, "photo_views"),
    (MetricField::VideoCount, "video_count"),
    (MetricField::Edits, "edits"),
    (MetricField::PlacesAdded, "places_added"),
    (MetricField::RoadsAdded, "roads_added"),
    (MetricField::FactsAdded, "facts_added"),
    (MetricField::QuestionsAnswered, "questions_answered"),
];

/// Counters are u64 in the domain and INTEGER (i64) in SQLite
fn to_db(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_db(row: &SqliteRow, column: &str) -> StoreResult<u64> {
    let raw: i64 = row.try_get(column)?;
    u64::try_from(raw).map_err(|_| StoreError::Decode {
        field: column.to_string(),
        reason: format!("negative value {}", raw),
    })
}

fn record_from_row(row: &SqliteRow) -> StoreResult<MetricRecord> {
    let mut record = MetricRecord::default();
    for (field, column) in METRIC_COLUMNS {
        record.set(field, from_db(row, column)?);
    }
    Ok(record)
}

fn status_from_row(row: &SqliteRow) -> StoreResult<ProfileStatus> {
    let raw: String = row.try_get("status")?;
    raw.parse().map_err(|reason| StoreError::Decode {
        field: "status".to_string(),
        reason,
    })
}

#[derive(Clone)]
pub struct SqliteGuideRepository {
    pool: Arc<SqlitePool>,
}

impl SqliteGuideRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Add a guide awaiting its first sync
    pub async fn register_guide(&self, id: &str, profile_url: &str, display_name: Option<&str>) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO guides (id, display_name, maps_profile_url, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(id)
        .bind(display_name)
        .bind(profile_url)
        .bind(ProfileStatus::Pending.as_str())
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(&*self.pool)
        .await?;

        debug!("Registered guide {}", id);
        Ok(())
    }

    pub async fn load_status(&self, profile_id: &str) -> StoreResult<ProfileStatus> {
        let row = sqlx::query("SELECT status FROM guides WHERE id = ?")
            .bind(profile_id)
            .fetch_optional(&*self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                profile_id: profile_id.to_string(),
            })?;
        status_from_row(&row)
    }

    pub async fn set_status(&self, profile_id: &str, status: ProfileStatus) -> StoreResult<()> {
        let result = sqlx::query("UPDATE guides SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(profile_id)
            .execute(&*self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                profile_id: profile_id.to_string(),
            });
        }
        Ok(())
    }

    pub async fn count_snapshots(&self, profile_id: &str) -> StoreResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM guide_history WHERE guide_id = ?")
            .bind(profile_id)
            .fetch_one(&*self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }
}

#[async_trait]
impl WorklistProvider for SqliteGuideRepository {
    async fn fetch_worklist(&self) -> StoreResult<Vec<ProfileReference>> {
        let statuses = ProfileStatus::SCRAPEABLE;
        let rows = sqlx::query(
            r"
            SELECT * FROM guides
            WHERE status IN (?, ?, ?) AND TRIM(maps_profile_url) <> ''
            ORDER BY created_at, id
            ",
        )
        .bind(statuses[0].as_str())
        .bind(statuses[1].as_str())
        .bind(statuses[2].as_str())
        .fetch_all(&*self.pool)
        .await?;

        let mut worklist = Vec::with_capacity(rows.len());
        for row in &rows {
            let last_synced_at: Option<DateTime<Utc>> = row.try_get("last_synced_at")?;
            let current_record = match last_synced_at {
                Some(_) => Some(record_from_row(row)?),
                None => None,
            };
            worklist.push(ProfileReference {
                id: row.try_get("id")?,
                display_name: row.try_get("display_name")?,
                raw_url: row.try_get::<String, _>("maps_profile_url")?.trim().to_string(),
                current_record,
            });
        }

        debug!("Worklist has {} guides", worklist.len());
        Ok(worklist)
    }
}

#[async_trait]
impl MetricStore for SqliteGuideRepository {
    async fn upsert_current(&self, profile_id: &str, update: &CurrentStateUpdate) -> StoreResult<()> {
        let m = &update.metrics;
        let result = sqlx::query(
            r"
            UPDATE guides SET
                level = ?, points = ?, review_count = ?, rating_count = ?,
                photo_count = ?, photo_views = ?, video_count = ?, edits = ?,
                places_added = ?, roads_added = ?, facts_added = ?, questions_answered = ?,
                avg_views_per_photo = ?, leveled_up_this_month = ?, joined_this_month = ?,
                status = ?, last_synced_at = ?, updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(to_db(m.level))
        .bind(to_db(m.points))
        .bind(to_db(m.review_count))
        .bind(to_db(m.rating_count))
        .bind(to_db(m.photo_count))
        .bind(to_db(m.photo_views))
        .bind(to_db(m.video_count))
        .bind(to_db(m.edits))
        .bind(to_db(m.places_added))
        .bind(to_db(m.roads_added))
        .bind(to_db(m.facts_added))
        .bind(to_db(m.questions_answered))
        .bind(to_db(update.avg_views_per_photo))
        .bind(update.leveled_up_this_month)
        .bind(update.joined_this_month)
        .bind(update.status.as_str())
        .bind(update.updated_at)
        .bind(update.updated_at)
        .bind(profile_id)
        .execute(&*self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                profile_id: profile_id.to_string(),
            });
        }
        Ok(())
    }

    async fn upsert_snapshot(&self, profile_id: &str, snapshot: &HistorySnapshot) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO guide_history
                (guide_id, period_key, level, points, photo_views, review_count,
                 points_change, photo_views_change, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(guide_id, period_key) DO UPDATE SET
                level = excluded.level,
                points = excluded.points,
                photo_views = excluded.photo_views,
                review_count = excluded.review_count,
                points_change = excluded.points_change,
                photo_views_change = excluded.photo_views_change,
                recorded_at = excluded.recorded_at
            ",
        )
        .bind(profile_id)
        .bind(snapshot.period_key.as_str())
        .bind(to_db(snapshot.level))
        .bind(to_db(snapshot.points))
        .bind(to_db(snapshot.photo_views))
        .bind(to_db(snapshot.review_count))
        .bind(snapshot.points_change)
        .bind(snapshot.photo_views_change)
        .bind(snapshot.recorded_at)
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn load_current(&self, profile_id: &str) -> StoreResult<Option<MetricRecord>> {
        let row = sqlx::query("SELECT * FROM guides WHERE id = ? AND last_synced_at IS NOT NULL")
            .bind(profile_id)
            .fetch_optional(&*self.pool)
            .await?;
        row.as_ref().map(record_from_row).transpose()
    }

    async fn load_snapshot(&self, profile_id: &str, period_key: &PeriodKey) -> StoreResult<Option<HistorySnapshot>> {
        let row = sqlx::query("SELECT * FROM guide_history WHERE guide_id = ? AND period_key = ?")
            .bind(profile_id)
            .bind(period_key.as_str())
            .fetch_optional(&*self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(HistorySnapshot {
            period_key: PeriodKey::from(row.try_get::<String, _>("period_key")?.as_str()),
            level: from_db(&row, "level")?,
            points: from_db(&row, "points")?,
            photo_views: from_db(&row, "photo_views")?,
            review_count: from_db(&row, "review_count")?,
            points_change: row.try_get("points_change")?,
            photo_views_change: row.try_get("photo_views_change")?,
            recorded_at: row.try_get("recorded_at")?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReconciliationResult;
    use crate::infrastructure::DatabaseConnection;
    use chrono::TimeZone;

    async fn repository() -> SqliteGuideRepository {
        let db = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        SqliteGuideRepository::new(db.pool().clone())
    }

    fn update_for(next: &MetricRecord, at: DateTime<Utc>) -> CurrentStateUpdate {
        CurrentStateUpdate::from_result(&ReconciliationResult::compute(None, next), at)
    }

    #[tokio::test]
    async fn worklist_selects_scrapeable_guides_with_urls() {
        let repo = repository().await;
        repo.register_guide("a", "https://www.google.com/maps/contrib/1", Some("Ann")).await.unwrap();
        repo.register_guide("b", "   ", None).await.unwrap();
        repo.register_guide("c", "https://maps.app.goo.gl/xyz", None).await.unwrap();
        repo.register_guide("d", "https://www.google.com/maps/contrib/4", None).await.unwrap();
        repo.set_status("c", ProfileStatus::Approved).await.unwrap();
        repo.set_status("d", ProfileStatus::Rejected).await.unwrap();

        let worklist = repo.fetch_worklist().await.unwrap();
        let ids: Vec<&str> = worklist.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(worklist[0].display_name.as_deref(), Some("Ann"));
        assert!(worklist.iter().all(|p| p.current_record.is_none()));
    }

    #[tokio::test]
    async fn current_state_round_trips() {
        let repo = repository().await;
        repo.register_guide("g1", "https://www.google.com/maps/contrib/1", None).await.unwrap();
        assert_eq!(repo.load_current("g1").await.unwrap(), None);

        let next = MetricRecord {
            level: 5,
            points: 150,
            photo_count: 10,
            photo_views: 1_500,
            ..MetricRecord::default()
        };
        repo.upsert_current("g1", &update_for(&next, Utc::now())).await.unwrap();

        assert_eq!(repo.load_current("g1").await.unwrap(), Some(next));
        assert_eq!(repo.load_status("g1").await.unwrap(), ProfileStatus::Active);

        let worklist = repo.fetch_worklist().await.unwrap();
        assert_eq!(worklist[0].current_record, Some(next));
    }

    #[tokio::test]
    async fn unknown_guide_is_not_found() {
        let repo = repository().await;
        let err = repo
            .upsert_current("ghost", &update_for(&MetricRecord::default(), Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert!(matches!(repo.load_status("ghost").await, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn snapshot_upsert_replaces_within_a_period() {
        let repo = repository().await;
        repo.register_guide("g1", "https://www.google.com/maps/contrib/1", None).await.unwrap();
        let at = Utc.with_ymd_and_hms(2026, 5, 3, 8, 0, 0).unwrap();
        let key = PeriodKey::month_of(at);

        let first = MetricRecord { points: 100, ..MetricRecord::default() };
        let result = ReconciliationResult::compute(None, &first);
        repo.upsert_snapshot("g1", &HistorySnapshot::from_result(&result, key.clone(), at)).await.unwrap();

        let second = MetricRecord { points: 130, ..MetricRecord::default() };
        let result = ReconciliationResult::compute(Some(&first), &second);
        let later = at + chrono::Duration::days(2);
        repo.upsert_snapshot("g1", &HistorySnapshot::from_result(&result, key.clone(), later)).await.unwrap();

        assert_eq!(repo.count_snapshots("g1").await.unwrap(), 1);
        let stored = repo.load_snapshot("g1", &key).await.unwrap().unwrap();
        assert_eq!(stored.points, 130);
        assert_eq!(stored.points_change, 30);
        assert_eq!(stored.recorded_at, later);

        let other = PeriodKey::from("2026-06");
        assert!(repo.load_snapshot("g1", &other).await.unwrap().is_none());
    }
}
