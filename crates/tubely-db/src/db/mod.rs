//! Database repositories for data access layer
//
// Video records
pub mod video;
//
// In-process store
pub mod memory;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::path::Path;

pub use memory::InMemoryVideoRepository;
pub use video::{SqliteVideoRepository, VideoRepository};

/// Apply pending migrations from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("Failed to load migrations")?;
    migrator
        .run(pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");
    Ok(())
}
