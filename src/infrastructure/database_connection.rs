// Database connection and pool management
// SQLite via sqlx; the schema is created in place by `migrate()`

use anyhow::Result;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;
use tracing::info;

use crate::infrastructure::config::DatabaseConfig;

pub struct DatabaseConnection {
    pool: SqlitePool,
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

impl DatabaseConnection {
    pub async fn new(database_url: &str) -> Result<Self> {
        let config = DatabaseConfig {
            url: database_url.to_string(),
            ..DatabaseConfig::default()
        };
        Self::with_config(&config).await
    }

    pub async fn with_config(config: &DatabaseConfig) -> Result<Self> {
        let database_url = config.url.as_str();

        // an in-memory database lives and dies with its single connection
        let max_connections = if is_memory_url(database_url) {
            1
        } else {
            let db_path = database_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let db_path = db_path.split('?').next().unwrap_or(db_path);

            if let Some(parent) = Path::new(db_path).parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
            if !Path::new(db_path).exists() {
                tokio::fs::File::create(db_path).await?;
            }
            config.max_connections.max(1)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("🗄️ Connected to database: {}", database_url);
        Ok(Self { pool })
    }

    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<()> {
        let create_guides_sql = r"
            CREATE TABLE IF NOT EXISTS guides (
                id TEXT PRIMARY KEY,
                display_name TEXT,
                maps_profile_url TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'pending',
                level INTEGER NOT NULL DEFAULT 0,
                points INTEGER NOT NULL DEFAULT 0,
                review_count INTEGER NOT NULL DEFAULT 0,
                rating_count INTEGER NOT NULL DEFAULT 0,
                photo_count INTEGER NOT NULL DEFAULT 0,
                photo_views INTEGER NOT NULL DEFAULT 0,
                video_count INTEGER NOT NULL DEFAULT 0,
                edits INTEGER NOT NULL DEFAULT 0,
                places_added INTEGER NOT NULL DEFAULT 0,
                roads_added INTEGER NOT NULL DEFAULT 0,
                facts_added INTEGER NOT NULL DEFAULT 0,
                questions_answered INTEGER NOT NULL DEFAULT 0,
                avg_views_per_photo INTEGER NOT NULL DEFAULT 0,
                leveled_up_this_month BOOLEAN NOT NULL DEFAULT 0,
                joined_this_month BOOLEAN NOT NULL DEFAULT 1,
                last_synced_at DATETIME,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
        ";

        let create_history_sql = r"
            CREATE TABLE IF NOT EXISTS guide_history (
                guide_id TEXT NOT NULL,
                period_key TEXT NOT NULL,
                level INTEGER NOT NULL DEFAULT 0,
                points INTEGER NOT NULL DEFAULT 0,
                photo_views INTEGER NOT NULL DEFAULT 0,
                review_count INTEGER NOT NULL DEFAULT 0,
                points_change INTEGER NOT NULL DEFAULT 0,
                photo_views_change INTEGER NOT NULL DEFAULT 0,
                recorded_at DATETIME NOT NULL,
                PRIMARY KEY (guide_id, period_key),
                FOREIGN KEY (guide_id) REFERENCES guides (id) ON DELETE CASCADE
            )
        ";

        let create_status_index_sql =
            "CREATE INDEX IF NOT EXISTS idx_guides_status ON guides (status)";

        sqlx::query(create_guides_sql).execute(&self.pool).await?;
        sqlx::query(create_history_sql).execute(&self.pool).await?;
        sqlx::query(create_status_index_sql).execute(&self.pool).await?;

        info!("Database schema is up to date");
        Ok(())
    }
}
