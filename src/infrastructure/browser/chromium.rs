//! Headless Chromium session (cargo feature `chromium`)
//!
//! Profile pages render their contribution stats client-side; this backend
//! runs the page scripts before the document is read back.

#![allow(clippy::uninlined_format_args)]

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{Browser, BrowserError, BrowserResult};
use crate::infrastructure::config::BrowserConfig;

/// How often `wait_for_selector` polls the page
const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct ChromiumBrowser {
    // kept alive for the lifetime of the page
    _browser: CdpBrowser,
    handler: JoinHandle<()>,
    page: Page,
}

impl ChromiumBrowser {
    pub async fn launch(config: &BrowserConfig) -> BrowserResult<Self> {
        let mut builder = CdpConfig::builder()
            .no_sandbox()
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--lang={}", config.locale))
            .window_size(config.viewport_width, config.viewport_height);
        if !config.headless {
            builder = builder.with_head();
        }
        let cdp_config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = CdpBrowser::launch(cdp_config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler stopped: {}", e);
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;
        page.set_user_agent(config.user_agent.as_str())
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        info!("🖥️ Chromium session started ({}x{})", config.viewport_width, config.viewport_height);
        Ok(Self {
            _browser: browser,
            handler,
            page,
        })
    }
}

impl Drop for ChromiumBrowser {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait]
impl Browser for ChromiumBrowser {
    async fn navigate(&self, url: &str, timeout: Duration) -> BrowserResult<()> {
        let load = async {
            self.page.goto(url).await.map_err(|e| BrowserError::network(url, e))?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| BrowserError::network(url, e))?;
            Ok(())
        };
        tokio::time::timeout(timeout, load)
            .await
            .map_err(|_| BrowserError::timeout(url, timeout))?
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> BrowserResult<()> {
        let poll = async {
            loop {
                if self.page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(timeout, poll).await.map_err(|_| {
            warn!("Readiness hook {} did not appear within {:?}", selector, timeout);
            BrowserError::SelectorNotFound {
                selector: selector.to_string(),
            }
        })
    }

    async fn content(&self) -> BrowserResult<String> {
        self.page
            .content()
            .await
            .map_err(|e| BrowserError::network("about:page", e))
    }

    async fn current_url(&self) -> BrowserResult<String> {
        self.page
            .url()
            .await
            .map_err(|e| BrowserError::network("about:page", e))?
            .ok_or(BrowserError::NoPageLoaded)
    }
}
