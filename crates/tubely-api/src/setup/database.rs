//! Record store setup

use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tubely_core::Config;
use tubely_db::{run_migrations, InMemoryVideoRepository, SqliteVideoRepository, VideoRepository};

/// Open the configured record store, applying migrations for SQLite.
pub async fn setup_database(config: &Config) -> Result<Arc<dyn VideoRepository>> {
    if config.uses_in_memory_database() {
        tracing::warn!("Using in-memory record store; videos are lost on restart");
        return Ok(Arc::new(InMemoryVideoRepository::new()));
    }

    tracing::info!("Connecting to database...");
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .connect(config.database_url())
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url()))?;

    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(Arc::new(SqliteVideoRepository::new(pool)))
}
