//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::state::AppState;
use anyhow::Result;
use std::sync::Arc;
use tubely_core::Config;
use tubely_processing::{FfmpegNormalizer, FfprobeProber};

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(config.log_json)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(environment = %config.environment, "Configuration loaded");

    let videos = database::setup_database(&config).await?;
    let storage = storage::setup_storage(&config).await?;

    let prober = Arc::new(FfprobeProber::new(
        config.ffprobe_path.clone(),
        config.tool_timeout(),
    ));
    let normalizer = Arc::new(FfmpegNormalizer::new(
        config.ffmpeg_path.clone(),
        config.tool_timeout(),
    ));

    let state =
        services::initialize_services(&config, videos, storage, prober, normalizer).await?;

    let router = routes::setup_routes(&config, state.clone());

    Ok((state, router))
}
