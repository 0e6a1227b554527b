//! Command line entry point

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use local_guides_scraper_lib::application::{ScrapeError, ScrapeOrchestrator};
use local_guides_scraper_lib::infrastructure::url_resolver::{
    is_short_link, is_valid_profile_url, normalize_profile_url,
};
use local_guides_scraper_lib::infrastructure::{
    AppConfig, Browser, ConfigManager, DatabaseConnection, ProfileExtractor, SqliteGuideRepository, UrlResolver,
    init_logging_with_config, logging::log_system_info,
};

#[derive(Parser)]
#[command(name = "local-guides-scraper", version, about = "Scrape Local Guides profile metrics into SQLite")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape every pending, approved or active guide once
    Run {
        /// Database URL, overrides config and environment
        #[arg(long)]
        database: Option<String>,
    },
    /// Register a guide for scraping
    Add {
        id: String,
        url: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        database: Option<String>,
    },
    /// Show how a profile URL resolves
    CheckUrl { url: String },
}

/// Config file plus environment overrides, and the names of the overrides applied
async fn load_config(path: Option<PathBuf>) -> Result<(AppConfig, Vec<&'static str>)> {
    let manager = match path {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    let mut config = manager.load_config().await?;
    let overrides = config.apply_env_overrides();
    Ok((config, overrides))
}

async fn open_repository(config: &AppConfig) -> Result<SqliteGuideRepository> {
    let db = DatabaseConnection::with_config(&config.database)
        .await
        .with_context(|| format!("Failed to open database {}", config.database.url))?;
    db.migrate().await?;
    Ok(SqliteGuideRepository::new(db.pool().clone()))
}

#[cfg(not(feature = "chromium"))]
#[allow(clippy::unused_async)]
async fn open_browser(config: &AppConfig) -> Result<Arc<dyn Browser>, ScrapeError> {
    let browser = local_guides_scraper_lib::infrastructure::HttpBrowser::new(&config.scraper.browser)
        .map_err(ScrapeError::BrowserUnavailable)?;
    Ok(Arc::new(browser))
}

#[cfg(feature = "chromium")]
async fn open_browser(config: &AppConfig) -> Result<Arc<dyn Browser>, ScrapeError> {
    let browser = local_guides_scraper_lib::infrastructure::browser::ChromiumBrowser::launch(&config.scraper.browser)
        .await
        .map_err(ScrapeError::BrowserUnavailable)?;
    Ok(Arc::new(browser))
}

async fn run(mut config: AppConfig, database: Option<String>) -> Result<()> {
    if let Some(url) = database {
        config.database.url = url;
    }

    let repository = Arc::new(open_repository(&config).await?);
    let extractor = ProfileExtractor::with_rules(&config.extraction).context("Invalid extraction rules")?;
    let browser = open_browser(&config).await?;

    let orchestrator = ScrapeOrchestrator::new(
        browser,
        repository.clone(),
        repository,
        extractor,
        config.scraper.clone(),
    );
    let summary = orchestrator.run().await?;

    info!("Success: {}, Failed: {}", summary.success_count, summary.fail_count);
    for failure in &summary.failures {
        info!("  {} [{}]: {}", failure.profile_id, failure.kind, failure.message);
    }
    Ok(())
}

async fn add(mut config: AppConfig, id: &str, url: &str, name: Option<&str>, database: Option<String>) -> Result<()> {
    if !is_valid_profile_url(url) && !is_short_link(url) {
        bail!("Not a Local Guides profile URL: {}", url);
    }
    if let Some(db_url) = database {
        config.database.url = db_url;
    }

    let repository = open_repository(&config).await?;
    let profile_url = normalize_profile_url(url);
    repository.register_guide(id, &profile_url, name).await?;
    info!("➕ Registered guide {} ({})", id, profile_url);
    Ok(())
}

fn check_url(config: &AppConfig, url: &str) -> Result<()> {
    let target = UrlResolver::from_config(&config.scraper).resolve(url);
    println!("valid profile url: {}", is_valid_profile_url(url));
    println!("normalized: {}", normalize_profile_url(url));
    println!("{}", serde_json::to_string_pretty(&target)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, overrides) = load_config(cli.config).await?;

    if let Command::CheckUrl { url } = &cli.command {
        return check_url(&config, url);
    }

    init_logging_with_config(config.logging.clone())?;
    log_system_info();
    for name in overrides {
        info!("Applied environment override {}", name);
    }

    match cli.command {
        Command::Run { database } => run(config, database).await,
        Command::Add {
            id,
            url,
            name,
            database,
        } => add(config, &id, &url, name.as_deref(), database).await,
        Command::CheckUrl { .. } => Ok(()),
    }
}
