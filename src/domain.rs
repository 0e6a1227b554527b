//! Domain module - core types and rules of the guide metrics pipeline
//!
//! Pure data and rules, plus the repository traits the pipeline is written against.

pub mod metric_record;
pub mod profile;
pub mod reconciliation;
pub mod repositories;
pub mod stats;
pub mod target;

// Re-export commonly used items for convenience
pub use metric_record::{MetricField, MetricRecord};
pub use profile::{ProfileReference, ProfileStatus};
pub use reconciliation::{
    CurrentStateUpdate, Deltas, Derived, Flags, HistorySnapshot, PeriodKey, ReconciliationResult,
};
pub use repositories::{MetricStore, StoreError, StoreResult, WorklistProvider};
pub use target::{ResolvedTarget, UnresolvedReason};
