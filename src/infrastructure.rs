//! Infrastructure layer: configuration, logging, parsing, browser and storage
//!
//! Everything that touches the file system, the network or the database.

pub mod browser;
pub mod config;
pub mod database_connection;
pub mod guide_repository;
pub mod logging;
pub mod parsing;
pub mod parsing_error;
pub mod url_resolver;

// Re-export commonly used items
pub use browser::{Browser, BrowserError, BrowserResult, HttpBrowser};
pub use config::{AppConfig, ConfigManager, local_guides};
pub use database_connection::DatabaseConnection;
pub use guide_repository::SqliteGuideRepository;
pub use logging::init_logging_with_config;
pub use parsing::{ExtractionRules, ParsingError, ParsingResult, ProfileExtractor};
pub use url_resolver::UrlResolver;
