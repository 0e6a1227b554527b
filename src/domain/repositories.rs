//! Repository interfaces for guide metrics
//!
//! The worklist source and the metric store are external collaborators of
//! the scrape pipeline; these traits are the only way it talks to them.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{CurrentStateUpdate, HistorySnapshot, MetricRecord, PeriodKey, ProfileReference};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored value for '{field}' is invalid: {reason}")]
    Decode { field: String, reason: String },

    #[error("Guide '{profile_id}' not found")]
    NotFound { profile_id: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Supplies the profiles to scrape, once per run
#[async_trait]
pub trait WorklistProvider: Send + Sync {
    async fn fetch_worklist(&self) -> StoreResult<Vec<ProfileReference>>;
}

/// Current-state and history writes; both upserts are idempotent
#[async_trait]
pub trait MetricStore: Send + Sync {
    async fn upsert_current(&self, profile_id: &str, update: &CurrentStateUpdate) -> StoreResult<()>;

    async fn upsert_snapshot(&self, profile_id: &str, snapshot: &HistorySnapshot) -> StoreResult<()>;

    /// Stored metrics, `None` if the guide has never been synced
    async fn load_current(&self, profile_id: &str) -> StoreResult<Option<MetricRecord>>;

    async fn load_snapshot(&self, profile_id: &str, period_key: &PeriodKey) -> StoreResult<Option<HistorySnapshot>>;
}
