//! Profile URL classification and scrape target derivation
//!
//! Canonical profile URLs look like
//! `https://www.google.com/maps/contrib/<numeric id>/<view>?...`. Short links
//! (`maps.app.goo.gl/...`) carry no id, so they stay unresolved until the
//! browser has followed them and the final location can be read back.

use tracing::debug;
use url::Url;

use crate::domain::{ResolvedTarget, UnresolvedReason};
use crate::infrastructure::config::{ScraperConfig, local_guides};

fn parse_lenient(raw_url: &str) -> Option<Url> {
    let trimmed = raw_url.trim();
    Url::parse(trimmed)
        .or_else(|_| Url::parse(&format!("https://{}", trimmed)))
        .ok()
}

fn is_google_host(url: &Url) -> bool {
    url.host_str().is_some_and(|host| host.contains("google."))
}

/// True for opaque short-link hosts
pub fn is_short_link(raw_url: &str) -> bool {
    parse_lenient(raw_url)
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
        .is_some_and(|host| local_guides::SHORT_LINK_HOSTS.contains(&host.as_str()))
}

/// Numeric contributor id of a canonical profile URL
pub fn extract_contrib_id(raw_url: &str) -> Option<String> {
    let url = parse_lenient(raw_url)?;
    if !is_google_host(&url) {
        return None;
    }
    let path = url.path();
    let start = path.find(local_guides::CONTRIB_PATH_MARKER)? + local_guides::CONTRIB_PATH_MARKER.len();
    let id: String = path[start..].chars().take_while(char::is_ascii_digit).collect();
    (!id.is_empty()).then_some(id)
}

/// A Google host with a `/maps/contrib/` path
pub fn is_valid_profile_url(raw_url: &str) -> bool {
    parse_lenient(raw_url)
        .is_some_and(|url| is_google_host(&url) && url.path().contains(local_guides::CONTRIB_PATH_MARKER))
}

/// Canonical `.../maps/contrib/<id>` form; short links and unknown URLs come back trimmed
pub fn normalize_profile_url(raw_url: &str) -> String {
    if is_short_link(raw_url) {
        return raw_url.trim().to_string();
    }
    extract_contrib_id(raw_url).map_or_else(
        || raw_url.trim().to_string(),
        |id| format!("{}/{}", local_guides::CONTRIB_BASE, id),
    )
}

/// Turns raw profile references into primary/secondary view URLs
#[derive(Debug, Clone)]
pub struct UrlResolver {
    primary_segment: String,
    secondary_segment: String,
}

impl Default for UrlResolver {
    fn default() -> Self {
        Self::new(local_guides::PRIMARY_VIEW_SEGMENT, local_guides::SECONDARY_VIEW_SEGMENT)
    }
}

impl UrlResolver {
    pub fn new(primary_segment: &str, secondary_segment: &str) -> Self {
        Self {
            primary_segment: primary_segment.trim_matches('/').to_string(),
            secondary_segment: secondary_segment.trim_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ScraperConfig) -> Self {
        Self::new(&config.primary_view_segment, &config.secondary_view_segment)
    }

    fn view_url(id: &str, segment: &str) -> String {
        format!("{}/{}/{}", local_guides::CONTRIB_BASE, id, segment)
    }

    pub fn resolve(&self, raw_url: &str) -> ResolvedTarget {
        if is_short_link(raw_url) {
            return ResolvedTarget::Unresolved {
                raw_url: raw_url.to_string(),
                reason: UnresolvedReason::ShortLink,
            };
        }

        match extract_contrib_id(raw_url) {
            Some(id) => ResolvedTarget::Resolved {
                primary_url: Self::view_url(&id, &self.primary_segment),
                secondary_url: Self::view_url(&id, &self.secondary_segment),
                canonical_id: id,
            },
            None => ResolvedTarget::Unresolved {
                raw_url: raw_url.to_string(),
                reason: UnresolvedReason::Unrecognized,
            },
        }
    }

    /// Second phase: read the id back from where the browser ended up.
    ///
    /// The primary URL stays the one already fetched; only the secondary view is derived.
    pub fn resolve_after_navigation(&self, target: ResolvedTarget, final_url: &str) -> ResolvedTarget {
        let ResolvedTarget::Unresolved { raw_url, reason } = target else {
            return target;
        };

        match extract_contrib_id(final_url) {
            Some(id) => {
                debug!("Resolved {} to contributor {} via {}", raw_url, id, final_url);
                ResolvedTarget::Resolved {
                    secondary_url: Self::view_url(&id, &self.secondary_segment),
                    primary_url: raw_url,
                    canonical_id: id,
                }
            }
            None => ResolvedTarget::Unresolved { raw_url, reason },
        }
    }
}
