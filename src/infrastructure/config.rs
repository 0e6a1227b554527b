//! Configuration infrastructure
//!
//! Contains configuration loading and management for the guide scraper.
//!
//! Configuration is organized into four sections:
//! 1. Scraper settings (timing, pacing, browser identity, profile views)
//! 2. Database settings
//! 3. Logging settings
//! 4. Extraction rules (selectors, labels and text patterns per metric)

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{info, warn};

use crate::infrastructure::parsing::config::ExtractionRules;

/// Environment variable overriding `database.url`
pub const DATABASE_URL_ENV: &str = "LOCAL_GUIDES_DATABASE_URL";

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scraper: ScraperConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub extraction: ExtractionRules,
}

/// Scrape run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub timing: TimingConfig,
    pub browser: BrowserConfig,

    /// Selector signalling that the contribution section has rendered
    pub readiness_selector: String,

    /// Trailing path segment of the primary view (photos)
    pub primary_view_segment: String,

    /// Trailing path segment of the secondary view (reviews)
    pub secondary_view_segment: String,
}

/// Timing configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Navigation timeout in milliseconds
    pub navigation_timeout_ms: u64,

    /// Fixed wait after navigation so client-side rendering can settle
    pub settle_delay_ms: u64,

    /// Bounded wait for the readiness selector
    pub readiness_timeout_ms: u64,

    /// Extra wait when the readiness selector never shows up
    pub readiness_fallback_ms: u64,

    /// Fixed part of the pacing delay before each profile and between views
    pub pacing_base_ms: u64,

    /// Random part added on top of `pacing_base_ms` (0..=jitter)
    pub pacing_jitter_ms: u64,
}

impl TimingConfig {
    #[must_use]
    pub const fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    #[must_use]
    pub const fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness_timeout_ms)
    }

    #[must_use]
    pub const fn readiness_fallback(&self) -> Duration {
        Duration::from_millis(self.readiness_fallback_ms)
    }

    /// No waiting at all. Used by tests and dry runs against local fixtures.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            navigation_timeout_ms: defaults::NAVIGATION_TIMEOUT_MS,
            settle_delay_ms: 0,
            readiness_timeout_ms: 0,
            readiness_fallback_ms: 0,
            pacing_base_ms: 0,
            pacing_jitter_ms: 0,
        }
    }
}

/// Browser identity and HTTP behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub user_agent: String,

    /// Content locale, sent as `Accept-Language`
    pub locale: String,

    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Maximum redirects followed while resolving short links
    pub max_redirects: usize,

    /// Run Chromium headless (only used by the `chromium` feature)
    pub headless: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL, e.g. `sqlite:data/guides.db`
    pub url: String,
    pub max_connections: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs in the log file
    pub json_format: bool,

    pub console_output: bool,
    pub file_output: bool,

    /// Directory for log files; defaults to `logs/` next to the executable
    pub directory: Option<PathBuf>,

    /// Number of rotated log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Enable automatic log cleanup on startup
    pub auto_cleanup_logs: bool,

    /// Module-specific log level filters (e.g., "sqlx": "warn", "reqwest": "info")
    pub module_filters: HashMap<String, String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            browser: BrowserConfig::default(),
            readiness_selector: defaults::READINESS_SELECTOR.to_string(),
            primary_view_segment: local_guides::PRIMARY_VIEW_SEGMENT.to_string(),
            secondary_view_segment: local_guides::SECONDARY_VIEW_SEGMENT.to_string(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: defaults::NAVIGATION_TIMEOUT_MS,
            settle_delay_ms: defaults::SETTLE_DELAY_MS,
            readiness_timeout_ms: defaults::READINESS_TIMEOUT_MS,
            readiness_fallback_ms: defaults::READINESS_FALLBACK_MS,
            pacing_base_ms: defaults::PACING_BASE_MS,
            pacing_jitter_ms: defaults::PACING_JITTER_MS,
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            locale: defaults::LOCALE.to_string(),
            viewport_width: defaults::VIEWPORT_WIDTH,
            viewport_height: defaults::VIEWPORT_HEIGHT,
            max_redirects: defaults::MAX_REDIRECTS,
            headless: true,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: defaults::DATABASE_URL.to_string(),
            max_connections: defaults::DB_MAX_CONNECTIONS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            directory: None,
            max_files: defaults::LOG_MAX_FILES,
            auto_cleanup_logs: defaults::LOG_AUTO_CLEANUP,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("sqlx".to_string(), "warn".to_string());
                filters.insert("reqwest".to_string(), "info".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("chromiumoxide".to_string(), "warn".to_string());
                filters
            },
        }
    }
}

impl AppConfig {
    /// Apply environment overrides on top of file values.
    ///
    /// Returns the variables that were applied. This runs before logging is
    /// initialized, so reporting them is left to the caller.
    pub fn apply_env_overrides(&mut self) -> Vec<&'static str> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Vec<&'static str> {
        let mut applied = Vec::new();
        if let Some(url) = lookup(DATABASE_URL_ENV).filter(|url| !url.trim().is_empty()) {
            self.database.url = url;
            applied.push(DATABASE_URL_ENV);
        }
        applied
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(local_guides::APP_DIR_NAME);

        Ok(config_dir)
    }

    /// Configuration manager for the default location
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self::with_path(config_dir.join("scraper_config.json")))
    }

    /// Configuration manager for an explicit file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { config_path: path.into() }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!("Configuration file not found, creating default: {:?}", self.config_path);
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .context("Failed to read configuration file")?;

        match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => {
                info!("Loaded configuration from: {:?}", self.config_path);
                Ok(config)
            }
            Err(parse_error) => {
                warn!("⚠️  Configuration parse error: {}", parse_error);
                warn!("⚠️  Resetting to default configuration");

                // 손상된 설정 파일 백업
                let backup_path = self.config_path.with_extension("json.corrupted");
                if let Err(e) = fs::copy(&self.config_path, &backup_path).await {
                    warn!("Failed to create backup of corrupted config: {}", e);
                } else {
                    info!("Backed up corrupted config to: {:?}", backup_path);
                }

                let default_config = AppConfig::default();
                self.save_config(&default_config)
                    .await
                    .context("Failed to save default configuration")?;

                info!("✅ Reset to default configuration");
                Ok(default_config)
            }
        }
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

/// Local Guides profile URLs and view constants
pub mod local_guides {
    /// Directory name used under the user config dir
    pub const APP_DIR_NAME: &str = "local-guides-scraper";

    /// Canonical profile base; the contributor id follows
    pub const CONTRIB_BASE: &str = "https://www.google.com/maps/contrib";

    /// Short-link hosts that have to be navigated to learn the contributor id
    pub const SHORT_LINK_HOSTS: &[&str] = &["maps.app.goo.gl", "goo.gl"];

    /// Path marker of a canonical profile URL
    pub const CONTRIB_PATH_MARKER: &str = "/maps/contrib/";

    /// Photos-oriented view
    pub const PRIMARY_VIEW_SEGMENT: &str = "photos";

    /// Reviews-oriented view
    pub const SECONDARY_VIEW_SEGMENT: &str = "reviews";
}

/// Default scraper configuration values
pub mod defaults {
    /// Navigation timeout (60s, pages are heavy)
    pub const NAVIGATION_TIMEOUT_MS: u64 = 60_000;

    /// Wait after navigation before looking at the page
    pub const SETTLE_DELAY_MS: u64 = 3_000;

    /// Bounded wait for the contribution section
    pub const READINESS_TIMEOUT_MS: u64 = 10_000;

    /// Extra wait when the contribution section never appears
    pub const READINESS_FALLBACK_MS: u64 = 2_000;

    /// Pacing: 1s fixed + up to 2s random
    pub const PACING_BASE_MS: u64 = 1_000;
    pub const PACING_JITTER_MS: u64 = 2_000;

    pub const READINESS_SELECTOR: &str = r#"[data-section-id="contributions"]"#;

    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    pub const LOCALE: &str = "en-US";
    pub const VIEWPORT_WIDTH: u32 = 1280;
    pub const VIEWPORT_HEIGHT: u32 = 720;
    pub const MAX_REDIRECTS: usize = 10;

    pub const DATABASE_URL: &str = "sqlite:data/local_guides.db";
    pub const DB_MAX_CONNECTIONS: u32 = 5;

    // Log configuration defaults
    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = true;
    pub const LOG_MAX_FILES: u32 = 5;
    pub const LOG_AUTO_CLEANUP: bool = true;
}
