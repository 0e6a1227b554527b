//! Application layer module
//!
//! Merge, reconciliation and the scrape run that ties them together.

pub mod error;
pub mod merger;
pub mod orchestrator;
pub mod reconciler;

pub use error::{ScrapeError, ScrapeResult};
pub use merger::merge;
pub use orchestrator::{Pacer, ProfileFailure, RunSummary, ScrapeOrchestrator};
pub use reconciler::ReconciliationWriter;
