//! Shared helpers for the pipeline integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use local_guides_scraper_lib::domain::{
    CurrentStateUpdate, HistorySnapshot, MetricRecord, MetricStore, PeriodKey, ProfileReference, StoreError,
    StoreResult, WorklistProvider,
};
use local_guides_scraper_lib::infrastructure::browser::document_matches;
use local_guides_scraper_lib::infrastructure::config::{ScraperConfig, TimingConfig};
use local_guides_scraper_lib::infrastructure::{
    Browser, BrowserError, BrowserResult, DatabaseConnection, SqliteGuideRepository,
};

pub const PHOTOS_VIEW: &str = include_str!("../fixtures/profile_photos.html");
pub const REVIEWS_VIEW: &str = include_str!("../fixtures/profile_reviews.html");
pub const EMPTY_VIEW: &str = include_str!("../fixtures/profile_no_points.html");

pub fn contrib_url(id: &str, view: &str) -> String {
    format!("https://www.google.com/maps/contrib/{}/{}", id, view)
}

enum Scripted {
    Page { final_url: String, html: String },
    Fail(BrowserError),
}

/// Browser double serving canned documents per URL
#[derive(Default)]
pub struct ScriptedBrowser {
    pages: HashMap<String, Scripted>,
    loaded: Mutex<Option<(String, String)>>,
    visits: Mutex<Vec<String>>,
}

impl ScriptedBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` at `url` without redirecting
    pub fn page(self, url: &str, html: &str) -> Self {
        self.redirect(url, url, html)
    }

    /// Serve `html` at `url`, reporting `final_url` as the location afterwards
    pub fn redirect(mut self, url: &str, final_url: &str, html: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            Scripted::Page {
                final_url: final_url.to_string(),
                html: html.to_string(),
            },
        );
        self
    }

    pub fn failing(mut self, url: &str, error: BrowserError) -> Self {
        self.pages.insert(url.to_string(), Scripted::Fail(error));
        self
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Browser for ScriptedBrowser {
    async fn navigate(&self, url: &str, _timeout: Duration) -> BrowserResult<()> {
        self.visits.lock().unwrap().push(url.to_string());
        match self.pages.get(url) {
            Some(Scripted::Page { final_url, html }) => {
                *self.loaded.lock().unwrap() = Some((final_url.clone(), html.clone()));
                Ok(())
            }
            Some(Scripted::Fail(error)) => Err(error.clone()),
            None => Err(BrowserError::HttpStatus {
                url: url.to_string(),
                status: 404,
            }),
        }
    }

    async fn wait_for_selector(&self, selector: &str, _timeout: Duration) -> BrowserResult<()> {
        let html = self.content().await?;
        if document_matches(&html, selector)? {
            Ok(())
        } else {
            Err(BrowserError::SelectorNotFound {
                selector: selector.to_string(),
            })
        }
    }

    async fn content(&self) -> BrowserResult<String> {
        self.loaded
            .lock()
            .unwrap()
            .as_ref()
            .map(|(_, html)| html.clone())
            .ok_or(BrowserError::NoPageLoaded)
    }

    async fn current_url(&self) -> BrowserResult<String> {
        self.loaded
            .lock()
            .unwrap()
            .as_ref()
            .map(|(url, _)| url.clone())
            .ok_or(BrowserError::NoPageLoaded)
    }
}

/// Scraper settings without any waiting
pub fn immediate_config() -> ScraperConfig {
    ScraperConfig {
        timing: TimingConfig::immediate(),
        ..ScraperConfig::default()
    }
}

pub async fn memory_repository() -> SqliteGuideRepository {
    let db = DatabaseConnection::new("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    SqliteGuideRepository::new(db.pool().clone())
}

pub fn record(level: u64, points: u64, photo_count: u64, photo_views: u64) -> MetricRecord {
    MetricRecord {
        level,
        points,
        photo_count,
        photo_views,
        ..MetricRecord::default()
    }
}

/// Worklist source that cannot be read
pub struct UnreadableWorklist;

#[async_trait]
impl WorklistProvider for UnreadableWorklist {
    async fn fetch_worklist(&self) -> StoreResult<Vec<ProfileReference>> {
        Err(StoreError::Decode {
            field: "status".to_string(),
            reason: "unknown status 'archived'".to_string(),
        })
    }
}

/// Store that rejects writes for some guides and delegates the rest
pub struct RejectingStore {
    inner: Arc<SqliteGuideRepository>,
    rejected: HashSet<String>,
}

impl RejectingStore {
    pub fn new(inner: Arc<SqliteGuideRepository>, rejected: &[&str]) -> Self {
        Self {
            inner,
            rejected: rejected.iter().map(ToString::to_string).collect(),
        }
    }

    fn check(&self, profile_id: &str) -> StoreResult<()> {
        if self.rejected.contains(profile_id) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl MetricStore for RejectingStore {
    async fn upsert_current(&self, profile_id: &str, update: &CurrentStateUpdate) -> StoreResult<()> {
        self.check(profile_id)?;
        self.inner.upsert_current(profile_id, update).await
    }

    async fn upsert_snapshot(&self, profile_id: &str, snapshot: &HistorySnapshot) -> StoreResult<()> {
        self.check(profile_id)?;
        self.inner.upsert_snapshot(profile_id, snapshot).await
    }

    async fn load_current(&self, profile_id: &str) -> StoreResult<Option<MetricRecord>> {
        self.inner.load_current(profile_id).await
    }

    async fn load_snapshot(&self, profile_id: &str, period_key: &PeriodKey) -> StoreResult<Option<HistorySnapshot>> {
        self.inner.load_snapshot(profile_id, period_key).await
    }
}
