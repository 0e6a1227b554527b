//! Tracked guide profiles as handed over by the worklist provider

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::metric_record::MetricRecord;

/// Lifecycle of a tracked guide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    /// Newly submitted, waiting for review / first sync
    Pending,
    /// Reviewed, waiting for first sync
    Approved,
    /// Synced at least once
    Active,
    Rejected,
    Inactive,
}

impl ProfileStatus {
    /// Statuses picked up by a scrape run
    pub const SCRAPEABLE: [Self; 3] = [Self::Pending, Self::Approved, Self::Active];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Active => "active",
            Self::Rejected => "rejected",
            Self::Inactive => "inactive",
        }
    }

    #[must_use]
    pub const fn is_scrapeable(self) -> bool {
        matches!(self, Self::Pending | Self::Approved | Self::Active)
    }

    /// Status after a successful reconciliation. Setting `Active` again is a no-op.
    #[must_use]
    pub const fn after_sync(self) -> Self {
        match self {
            Self::Pending | Self::Approved | Self::Active => Self::Active,
            other => other,
        }
    }
}

impl fmt::Display for ProfileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "active" => Ok(Self::Active),
            "rejected" => Ok(Self::Rejected),
            "inactive" => Ok(Self::Inactive),
            other => Err(format!("unknown profile status: {other}")),
        }
    }
}

/// One item of the worklist. Read-only to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileReference {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub raw_url: String,
    /// Last stored metrics, `None` when the guide was never synced
    #[serde(default)]
    pub current_record: Option<MetricRecord>,
}

impl ProfileReference {
    pub fn new(id: impl Into<String>, raw_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            raw_url: raw_url.into(),
            current_record: None,
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn with_current_record(mut self, record: MetricRecord) -> Self {
        self.current_record = Some(record);
        self
    }

    /// Name used in log lines
    #[must_use]
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}
