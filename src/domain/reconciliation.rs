//! Reconciliation rules: deltas, derived values and the records written to the store
//!
//! Everything here is pure. Persistence lives in the application layer
//! (`ReconciliationWriter`) on top of the `MetricStore` trait.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::metric_record::MetricRecord;
use super::profile::ProfileStatus;
use super::stats::{avg_views_per_photo, signed_delta};

/// Coarse calendar bucket keying history snapshots, formatted `YYYY-MM`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeriodKey(String);

impl PeriodKey {
    /// Month bucket of `at`
    #[must_use]
    pub fn month_of(at: DateTime<Utc>) -> Self {
        Self(format!("{:04}-{:02}", at.year(), at.month()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeriodKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deltas {
    pub points_change: i64,
    pub photo_views_change: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Derived {
    pub avg_views_per_photo: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flags {
    pub leveled_up: bool,
}

/// Outcome of comparing a fresh record with the stored one. Never persisted as such.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResult {
    pub current: MetricRecord,
    pub deltas: Deltas,
    pub derived: Derived,
    pub flags: Flags,
}

impl ReconciliationResult {
    /// Deltas are taken against the stored previous state; a missing one counts as all zeros.
    #[must_use]
    pub fn compute(previous: Option<&MetricRecord>, next: &MetricRecord) -> Self {
        let baseline = previous.copied().unwrap_or_default();

        Self {
            current: *next,
            deltas: Deltas {
                points_change: signed_delta(next.points, baseline.points),
                photo_views_change: signed_delta(next.photo_views, baseline.photo_views),
            },
            derived: Derived {
                avg_views_per_photo: avg_views_per_photo(next.photo_views, next.photo_count),
            },
            flags: Flags {
                leveled_up: next.level > baseline.level,
            },
        }
    }
}

/// Fields written to the mutable current-state record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentStateUpdate {
    #[serde(flatten)]
    pub metrics: MetricRecord,
    pub avg_views_per_photo: u64,
    pub leveled_up_this_month: bool,
    pub joined_this_month: bool,
    pub status: ProfileStatus,
    pub updated_at: DateTime<Utc>,
}

impl CurrentStateUpdate {
    #[must_use]
    pub fn from_result(result: &ReconciliationResult, updated_at: DateTime<Utc>) -> Self {
        Self {
            metrics: result.current,
            avg_views_per_photo: result.derived.avg_views_per_photo,
            leveled_up_this_month: result.flags.leveled_up,
            joined_this_month: false,
            // every scrapeable status lands on Active
            status: ProfileStatus::Pending.after_sync(),
            updated_at,
        }
    }
}

/// One history row per `(profile, period)`; a later write in the same period replaces it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySnapshot {
    pub period_key: PeriodKey,
    pub level: u64,
    pub points: u64,
    pub photo_views: u64,
    pub review_count: u64,
    pub points_change: i64,
    pub photo_views_change: i64,
    pub recorded_at: DateTime<Utc>,
}

impl HistorySnapshot {
    #[must_use]
    pub fn from_result(result: &ReconciliationResult, period_key: PeriodKey, recorded_at: DateTime<Utc>) -> Self {
        Self {
            period_key,
            level: result.current.level,
            points: result.current.points,
            photo_views: result.current.photo_views,
            review_count: result.current.review_count,
            points_change: result.deltas.points_change,
            photo_views_change: result.deltas.photo_views_change,
            recorded_at,
        }
    }
}
