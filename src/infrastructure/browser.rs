//! Browser capability used by the scrape orchestrator
//!
//! The pipeline needs four things from a browser: go to a URL, wait for a
//! readiness hook, hand back the loaded document and report where it ended
//! up after redirects. `HttpBrowser` does this over plain HTTP with
//! `reqwest`; the `chromium` feature adds a headless Chromium session.

#![allow(clippy::uninlined_format_args)]

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder};
use scraper::{Html, Selector};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::infrastructure::config::BrowserConfig;

#[cfg(feature = "chromium")]
pub mod chromium;
#[cfg(feature = "chromium")]
pub use chromium::ChromiumBrowser;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrowserError {
    #[error("Navigation to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("No page loaded")]
    NoPageLoaded,

    #[error("Selector not found: {selector}")]
    SelectorNotFound { selector: String },

    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Failed to start browser: {0}")]
    Launch(String),
}

impl BrowserError {
    pub fn timeout(url: &str, timeout: Duration) -> Self {
        Self::Timeout {
            url: url.to_string(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn network(url: &str, message: impl ToString) -> Self {
        Self::Network {
            url: url.to_string(),
            message: message.to_string(),
        }
    }
}

pub type BrowserResult<T> = Result<T, BrowserError>;

/// One browser page, driven sequentially
#[async_trait]
pub trait Browser: Send + Sync {
    /// Load `url`, following redirects; fails on timeout or network error
    async fn navigate(&self, url: &str, timeout: Duration) -> BrowserResult<()>;

    /// Wait until `selector` matches in the loaded page
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> BrowserResult<()>;

    /// Serialized document of the loaded page
    async fn content(&self) -> BrowserResult<String>;

    /// Location after navigation, redirects included
    async fn current_url(&self) -> BrowserResult<String>;
}

/// Checks a static document for a selector match
pub fn document_matches(html: &str, selector: &str) -> BrowserResult<bool> {
    let parsed = Selector::parse(selector).map_err(|e| BrowserError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Html::parse_document(html).select(&parsed).next().is_some())
}

#[derive(Debug, Clone)]
struct LoadedPage {
    url: String,
    body: String,
}

/// Plain HTTP "browser": no script execution, redirects resolve short links
pub struct HttpBrowser {
    client: Client,
    page: Mutex<Option<LoadedPage>>,
}

impl HttpBrowser {
    pub fn new(config: &BrowserConfig) -> BrowserResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        let language = format!("{},{};q=0.9", config.locale, config.locale.split('-').next().unwrap_or("en"));
        if let Ok(value) = HeaderValue::from_str(&language) {
            headers.insert(ACCEPT_LANGUAGE, value);
        }

        let client = ClientBuilder::new()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        Ok(Self {
            client,
            page: Mutex::new(None),
        })
    }

    async fn loaded_page(&self) -> BrowserResult<LoadedPage> {
        self.page.lock().await.clone().ok_or(BrowserError::NoPageLoaded)
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn navigate(&self, url: &str, timeout: Duration) -> BrowserResult<()> {
        debug!("🌐 GET {}", url);

        let fetch = async {
            let response = self.client.get(url).send().await.map_err(|e| {
                if e.is_timeout() {
                    BrowserError::timeout(url, timeout)
                } else {
                    BrowserError::network(url, e)
                }
            })?;

            let status = response.status();
            if !status.is_success() {
                return Err(BrowserError::HttpStatus {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let final_url = response.url().to_string();
            let body = response.text().await.map_err(|e| BrowserError::network(url, e))?;
            Ok(LoadedPage { url: final_url, body })
        };

        let loaded = tokio::time::timeout(timeout, fetch)
            .await
            .map_err(|_| BrowserError::timeout(url, timeout))??;

        if loaded.url != url {
            debug!("Redirected {} -> {}", url, loaded.url);
        }
        *self.page.lock().await = Some(loaded);
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, _timeout: Duration) -> BrowserResult<()> {
        // a static document will not change, so one check is final
        let page = self.loaded_page().await?;
        if document_matches(&page.body, selector)? {
            Ok(())
        } else {
            warn!("Readiness hook {} not present in {}", selector, page.url);
            Err(BrowserError::SelectorNotFound {
                selector: selector.to_string(),
            })
        }
    }

    async fn content(&self) -> BrowserResult<String> {
        Ok(self.loaded_page().await?.body)
    }

    async fn current_url(&self) -> BrowserResult<String> {
        Ok(self.loaded_page().await?.url)
    }
}
