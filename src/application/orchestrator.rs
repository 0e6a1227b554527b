//! Scrape orchestrator
//!
//! One worker, one browser page, profiles strictly in sequence:
//! pace → resolve → fetch primary → (resolve again) → pace → fetch secondary
//! → merge → reconcile. A failing profile is logged and counted, then the
//! run moves on.

#![allow(clippy::uninlined_format_args)]

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::error::{ScrapeError, ScrapeResult};
use super::merger::merge;
use super::reconciler::ReconciliationWriter;
use crate::domain::stats::format_compact;
use crate::domain::{MetricRecord, MetricStore, ProfileReference, ReconciliationResult, WorklistProvider};
use crate::infrastructure::config::{ScraperConfig, TimingConfig};
use crate::infrastructure::{Browser, ProfileExtractor, UrlResolver};

/// Randomized delay before each profile and between the two views
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    base_ms: u64,
    jitter_ms: u64,
}

impl Pacer {
    pub const fn new(base_ms: u64, jitter_ms: u64) -> Self {
        Self { base_ms, jitter_ms }
    }

    pub const fn from_timing(timing: &TimingConfig) -> Self {
        Self::new(timing.pacing_base_ms, timing.pacing_jitter_ms)
    }

    /// `base + uniform(0..=jitter)`
    pub fn next_delay(&self) -> Duration {
        let jitter = if self.jitter_ms == 0 { 0 } else { fastrand::u64(0..=self.jitter_ms) };
        Duration::from_millis(self.base_ms.saturating_add(jitter))
    }

    pub async fn pause(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            debug!("⏳ Pacing {:?}", delay);
            tokio::time::sleep(delay).await;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFailure {
    pub profile_id: String,
    pub kind: String,
    pub message: String,
}

/// Aggregate outcome of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub success_count: usize,
    pub fail_count: usize,
    pub failures: Vec<ProfileFailure>,
}

impl RunSummary {
    fn record_success(&mut self) {
        self.success_count += 1;
    }

    fn record_failure(&mut self, profile_id: &str, error: &ScrapeError) {
        self.fail_count += 1;
        self.failures.push(ProfileFailure {
            profile_id: profile_id.to_string(),
            kind: error.kind().to_string(),
            message: error.to_string(),
        });
    }

    pub const fn total(&self) -> usize {
        self.success_count + self.fail_count
    }
}

pub struct ScrapeOrchestrator {
    browser: Arc<dyn Browser>,
    worklist: Arc<dyn WorklistProvider>,
    writer: ReconciliationWriter,
    extractor: Arc<ProfileExtractor>,
    resolver: UrlResolver,
    config: ScraperConfig,
    pacer: Pacer,
}

impl ScrapeOrchestrator {
    pub fn new(
        browser: Arc<dyn Browser>,
        worklist: Arc<dyn WorklistProvider>,
        store: Arc<dyn MetricStore>,
        extractor: ProfileExtractor,
        config: ScraperConfig,
    ) -> Self {
        Self {
            browser,
            worklist,
            writer: ReconciliationWriter::new(store),
            extractor: Arc::new(extractor),
            resolver: UrlResolver::from_config(&config),
            pacer: Pacer::from_timing(&config.timing),
            config,
        }
    }

    /// Scrape the whole worklist. Errors only when the worklist cannot be loaded.
    pub async fn run(&self) -> ScrapeResult<RunSummary> {
        info!("🚀 Starting scrape run");

        let worklist = self.worklist.fetch_worklist().await.map_err(ScrapeError::Worklist)?;
        let total = worklist.len();
        info!("Found {} guides to update", total);

        let mut summary = RunSummary::default();
        for (index, profile) in worklist.iter().enumerate() {
            info!("[{}/{}] Scraping {} ({})", index + 1, total, profile.label(), profile.id);

            match self.scrape_profile(profile).await {
                Ok(_) => summary.record_success(),
                Err(e) => {
                    warn!("❌ {} ({}) failed [{}]: {}", profile.label(), profile.id, e.kind(), e);
                    summary.record_failure(&profile.id, &e);
                }
            }
        }

        info!(
            "🏁 Scrape run finished: {} succeeded, {} failed",
            summary.success_count, summary.fail_count
        );
        Ok(summary)
    }

    /// All stages for one profile; stored state is only touched on success
    pub async fn scrape_profile(&self, profile: &ProfileReference) -> ScrapeResult<ReconciliationResult> {
        self.pacer.pause().await;

        let mut target = self.resolver.resolve(&profile.raw_url);
        let primary_url = target.primary_url().to_string();
        let primary = self.fetch_view(&primary_url).await?;

        if !target.is_resolved() {
            let final_url = self
                .browser
                .current_url()
                .await
                .map_err(|e| ScrapeError::navigation(&primary_url, e))?;
            target = self.resolver.resolve_after_navigation(target, &final_url);
        }

        let secondary = match target.secondary_url() {
            Some(secondary_url) => {
                self.pacer.pause().await;
                self.fetch_view(secondary_url).await?
            }
            None => {
                debug!("No secondary view for {}", profile.id);
                None
            }
        };

        if primary.is_none() && secondary.is_some() {
            debug!("Primary view of {} had no points, using the secondary view", profile.id);
        }

        let merged = merge(primary, secondary).ok_or_else(|| ScrapeError::Extraction {
            url: primary_url.clone(),
        })?;
        log_extracted(profile, &merged);

        self.writer
            .reconcile(&profile.id, profile.current_record.as_ref(), &merged)
            .await
            .map_err(|source| ScrapeError::Persistence {
                profile_id: profile.id.clone(),
                source,
            })
    }

    /// Navigate, let the page settle, wait for the readiness hook (best effort) and extract
    async fn fetch_view(&self, url: &str) -> ScrapeResult<Option<MetricRecord>> {
        let timing = &self.config.timing;

        self.browser
            .navigate(url, timing.navigation_timeout())
            .await
            .map_err(|e| ScrapeError::navigation(url, e))?;

        sleep_if_set(timing.settle_delay()).await;

        if let Err(e) = self
            .browser
            .wait_for_selector(&self.config.readiness_selector, timing.readiness_timeout())
            .await
        {
            debug!("Readiness wait on {} gave up ({}), falling back to a fixed delay", url, e);
            sleep_if_set(timing.readiness_fallback()).await;
        }

        let html = self
            .browser
            .content()
            .await
            .map_err(|e| ScrapeError::navigation(url, e))?;

        let record = self.extractor.extract(&html);
        if record.is_none() {
            debug!("No point total on {}", url);
        }
        Ok(record)
    }
}

async fn sleep_if_set(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

fn log_extracted(profile: &ProfileReference, record: &MetricRecord) {
    info!(
        "📊 {}: Level {}, {} points, {} reviews, {} ratings, {} photos, {} views",
        profile.id,
        record.level,
        format_compact(record.points),
        format_compact(record.review_count),
        format_compact(record.rating_count),
        format_compact(record.photo_count),
        format_compact(record.photo_views),
    );
}
