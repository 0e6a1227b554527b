//! Scrape targets derived from a raw profile reference

use serde::{Deserialize, Serialize};

/// Why a target could not be resolved up front
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnresolvedReason {
    /// Opaque short link, only navigating it reveals the canonical URL
    ShortLink,
    /// No identifier in the URL; used verbatim
    Unrecognized,
}

/// Resolution state of one scrape attempt: `Unresolved -> Resolved`.
///
/// Created per attempt and dropped afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolvedTarget {
    Unresolved {
        raw_url: String,
        reason: UnresolvedReason,
    },
    Resolved {
        canonical_id: String,
        primary_url: String,
        secondary_url: String,
    },
}

impl ResolvedTarget {
    #[must_use]
    pub fn canonical_id(&self) -> Option<&str> {
        match self {
            Self::Unresolved { .. } => None,
            Self::Resolved { canonical_id, .. } => Some(canonical_id),
        }
    }

    /// Page fetched first
    #[must_use]
    pub fn primary_url(&self) -> &str {
        match self {
            Self::Unresolved { raw_url, .. } => raw_url,
            Self::Resolved { primary_url, .. } => primary_url,
        }
    }

    /// Second view, known only once the target is resolved
    #[must_use]
    pub fn secondary_url(&self) -> Option<&str> {
        match self {
            Self::Unresolved { .. } => None,
            Self::Resolved { secondary_url, .. } => Some(secondary_url),
        }
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_exposes_raw_url_only() {
        let target = ResolvedTarget::Unresolved {
            raw_url: "https://maps.app.goo.gl/xyz".into(),
            reason: UnresolvedReason::ShortLink,
        };
        assert_eq!(target.primary_url(), "https://maps.app.goo.gl/xyz");
        assert_eq!(target.secondary_url(), None);
        assert_eq!(target.canonical_id(), None);
        assert!(!target.is_resolved());
    }
}
