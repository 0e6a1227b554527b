//! Logging system configuration and initialization
//!
//! - Console and file output, each optional
//! - `RUST_LOG` overrides the configured level
//! - Optional JSON lines in the log file
//! - KST (Korea Standard Time) timestamps
//! - The previous run's log file is renamed with a timestamp at startup

#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use lazy_static::lazy_static;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::FormatTime},
    layer::{Layered, SubscriberExt},
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;

/// Current log file; rotated copies are `scraper.<timestamp>.log`
pub const LOG_FILE_NAME: &str = "scraper.log";

/// Dependency targets that flood the output below TRACE
const QUIET_TARGETS: &[(&str, &str)] = &[
    ("sqlx::query", "warn"),
    ("sqlx::sqlite", "warn"),
    ("sqlx::migrate", "info"),
    ("reqwest", "info"),
    ("hyper", "warn"),
    ("hyper_util", "warn"),
    ("h2", "warn"),
    ("rustls", "warn"),
    ("chromiumoxide", "warn"),
    ("tungstenite", "warn"),
];

const KST_OFFSET_SECS: i32 = 9 * 3600;

type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

// Keeps the non-blocking file writer alive for the whole process
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<WorkerGuard>> = Mutex::new(Vec::new());
}

fn kst() -> FixedOffset {
    FixedOffset::east_opt(KST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Custom time formatter for KST (UTC+9)
struct KstTimeFormatter;

impl FormatTime for KstTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        let now = Utc::now().with_timezone(&kst());
        write!(w, "{}", now.format("%Y-%m-%d %H:%M:%S%.3f %:z"))
    }
}

/// `logs/` next to the executable, or the current directory as a fallback
pub fn get_log_directory() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default())
        .join("logs")
}

fn resolve_log_directory(config: &LoggingConfig) -> PathBuf {
    config.directory.clone().unwrap_or_else(get_log_directory)
}

/// Rename the previous run's log file to `<stem>.<KST timestamp>.log`
fn rotate_existing_log_file(log_dir: &Path, log_file_name: &str) -> Result<Option<PathBuf>> {
    let log_file_path = log_dir.join(log_file_name);
    if !log_file_path.exists() {
        return Ok(None);
    }

    let metadata = std::fs::metadata(&log_file_path)
        .map_err(|e| anyhow!("Failed to get log file metadata: {}", e))?;
    let file_time = metadata
        .modified()
        .or_else(|_| metadata.created())
        .unwrap_or_else(|_| std::time::SystemTime::now());
    let stamped: DateTime<FixedOffset> = DateTime::<Utc>::from(file_time).with_timezone(&kst());

    let file_stem = log_file_name.trim_end_matches(".log");
    let timestamped_path = log_dir.join(format!("{}.{}.log", file_stem, stamped.format("%Y%m%dT%H%M%S")));

    std::fs::rename(&log_file_path, &timestamped_path).map_err(|e| {
        anyhow!(
            "Failed to rotate log file {} to {}: {}",
            log_file_path.display(),
            timestamped_path.display(),
            e
        )
    })?;

    Ok(Some(timestamped_path))
}

/// Delete the oldest log files beyond `max_files`
fn cleanup_old_logs(log_dir: &Path, max_files: u32) -> Result<usize> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let mut log_files = Vec::new();
    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(".log"));
        if !path.is_file() || !is_log {
            continue;
        }
        if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
            log_files.push((path, modified));
        }
    }

    // newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = 0;
    for (path, _) in log_files.iter().skip(max_files as usize) {
        match std::fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to remove old log file {:?}: {}", path, e),
        }
    }
    Ok(removed)
}

/// Configured level plus quiet dependency targets and module overrides
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))?;

    if !config.level.to_lowercase().contains("trace") {
        for (target, level) in QUIET_TARGETS {
            filter = filter.add_directive(format!("{}={}", target, level).parse()?);
        }
    }
    for (target, level) in &config.module_filters {
        filter = filter.add_directive(format!("{}={}", target, level).parse()?);
    }

    Ok(filter)
}

/// Initialize logging with custom configuration
///
/// Below TRACE, SQL statements and HTTP client internals are capped at
/// warn/info. Override with `RUST_LOG`, for example:
/// ```bash
/// RUST_LOG="debug,sqlx::query=debug" local-guides-scraper run
/// ```
pub fn init_logging_with_config(config: LoggingConfig) -> Result<()> {
    if !config.file_output && !config.console_output {
        return Err(anyhow!("No logging output configured"));
    }

    let log_dir = resolve_log_directory(&config);
    let mut rotated = None;
    let mut cleaned = 0;

    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.file_output {
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

        rotated = rotate_existing_log_file(&log_dir, LOG_FILE_NAME)?;
        if config.auto_cleanup_logs {
            cleaned = cleanup_old_logs(&log_dir, config.max_files)?;
        }

        let (file_writer, file_guard) = non_blocking(rolling::never(&log_dir, LOG_FILE_NAME));
        if let Ok(mut guards) = LOG_GUARDS.lock() {
            guards.push(file_guard);
        }

        let file_layer = if config.json_format {
            fmt::Layer::new()
                .json()
                .with_writer(file_writer)
                .with_timer(KstTimeFormatter)
                .with_target(true)
                .with_ansi(false)
                .boxed()
        } else {
            fmt::Layer::new()
                .with_writer(file_writer)
                .with_timer(KstTimeFormatter)
                .with_target(false)
                .with_ansi(false)
                .boxed()
        };
        layers.push(file_layer);
    }

    if config.console_output {
        layers.push(
            fmt::Layer::new()
                .with_writer(std::io::stdout)
                .with_timer(KstTimeFormatter)
                .with_target(false)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(build_env_filter(&config)?)
        .with(layers)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    info!("📝 Logging initialized (level: {}, json: {})", config.level, config.json_format);
    if config.file_output {
        info!("Log directory: {:?}", log_dir);
    }
    if let Some(path) = rotated {
        info!("Rotated previous log file to {:?}", path);
    }
    if cleaned > 0 {
        info!("Removed {} old log files (keeping {})", cleaned, config.max_files);
    }

    Ok(())
}

/// Log system information for diagnostics
pub fn log_system_info() {
    info!("=== Local Guides Scraper ===");
    info!("Application version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {} ({})", std::env::consts::OS, std::env::consts::ARCH);
    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {:?}", current_dir);
    }
}
