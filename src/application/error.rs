//! Scrape failure taxonomy
//!
//! Per-profile failures are recorded and the run moves on. Only losing the
//! worklist or the browser ends a run.

use thiserror::Error;

use crate::domain::StoreError;
use crate::infrastructure::BrowserError;

#[derive(Error, Debug)]
pub enum ScrapeError {
    /// Navigation timeout or network error; stored state untouched
    #[error("Navigation failed for {url}: {source}")]
    Navigation {
        url: String,
        #[source]
        source: BrowserError,
    },

    /// Page loaded but no view yielded the point total; stored state untouched
    #[error("No point total found for {url}")]
    Extraction { url: String },

    /// Extraction succeeded but the store write failed
    #[error("Failed to save guide {profile_id}: {source}")]
    Persistence {
        profile_id: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to load worklist: {0}")]
    Worklist(#[source] StoreError),

    #[error("Browser unavailable: {0}")]
    BrowserUnavailable(#[source] BrowserError),
}

impl ScrapeError {
    pub fn navigation(url: &str, source: BrowserError) -> Self {
        Self::Navigation {
            url: url.to_string(),
            source,
        }
    }

    /// Fatal errors abort the whole run
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Worklist(_) | Self::BrowserUnavailable(_))
    }

    /// Short name for log lines and run summaries
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Navigation { .. } => "navigation",
            Self::Extraction { .. } => "extraction",
            Self::Persistence { .. } => "persistence",
            Self::Worklist(_) => "worklist",
            Self::BrowserUnavailable(_) => "browser",
        }
    }
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;
