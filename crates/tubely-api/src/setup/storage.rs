//! Object storage setup

use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::Config;
use tubely_storage::{create_storage, Storage};

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    tracing::info!(
        backend = ?storage.backend_type(),
        bucket = config.s3_bucket.as_deref().unwrap_or("-"),
        cdn = config.cdn_distribution.as_deref().unwrap_or("-"),
        "Storage initialized"
    );

    Ok(storage)
}
