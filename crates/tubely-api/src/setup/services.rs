//! Pipeline and shared state construction

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::{Config, ThumbnailSinkKind};
use tubely_db::VideoRepository;
use tubely_processing::{
    DataUrlThumbnailSink, DiskThumbnailSink, MediaValidator, MemoryThumbnailSink, Normalizer,
    PipelineComponents, Prober, StagingArea, ThumbnailSink, ThumbnailStore, UploadPipeline,
};
use tubely_storage::{create_url_builder, RemoteUploader, Storage};

/// Wire the upload pipeline from its collaborators.
///
/// Probe and remux tools are passed in so tests can substitute fakes.
pub async fn initialize_services(
    config: &Config,
    videos: Arc<dyn VideoRepository>,
    storage: Arc<dyn Storage>,
    prober: Arc<dyn Prober>,
    normalizer: Arc<dyn Normalizer>,
) -> Result<Arc<AppState>> {
    let scratch = StagingArea::new(config.scratch_root.clone())
        .await
        .with_context(|| {
            format!(
                "Failed to create scratch directory {}",
                config.scratch_root.display()
            )
        })?;

    let (thumbnails, thumbnail_store) = thumbnail_sink(config).await?;
    let urls = create_url_builder(config).context("Failed to configure object URLs")?;

    let pipeline = UploadPipeline::new(PipelineComponents {
        videos: videos.clone(),
        staging: scratch,
        prober,
        normalizer,
        uploader: RemoteUploader::new(storage),
        urls,
        thumbnails,
        thumbnail_rules: MediaValidator::new(
            config.max_thumbnail_size_bytes,
            config.thumbnail_allowed_content_types.clone(),
        ),
        video_rules: MediaValidator::new(
            config.max_video_size_bytes,
            config.video_allowed_content_types.clone(),
        ),
    });

    tracing::info!(
        thumbnail_sink = ?config.thumbnail_sink,
        scratch_root = %config.scratch_root.display(),
        assets_root = %config.assets_root.display(),
        "Upload pipeline ready"
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        pipeline: Arc::new(pipeline),
        videos,
        thumbnail_store,
    }))
}

async fn thumbnail_sink(
    config: &Config,
) -> Result<(Arc<dyn ThumbnailSink>, Option<ThumbnailStore>)> {
    match config.thumbnail_sink {
        ThumbnailSinkKind::Memory => {
            let store = ThumbnailStore::new();
            let sink = MemoryThumbnailSink::new(store.clone(), config.public_base_url.clone());
            Ok((Arc::new(sink), Some(store)))
        }
        ThumbnailSinkKind::Disk => {
            let assets = StagingArea::new(config.assets_root.clone())
                .await
                .with_context(|| {
                    format!(
                        "Failed to create assets directory {}",
                        config.assets_root.display()
                    )
                })?;
            let sink = DiskThumbnailSink::new(
                assets,
                config.public_base_url.clone(),
                config.thumbnail_naming,
            );
            Ok((Arc::new(sink), None))
        }
        ThumbnailSinkKind::Inline => Ok((Arc::new(DataUrlThumbnailSink), None)),
    }
}
