use std::sync::Arc;
use tubely_core::Config;
use tubely_db::VideoRepository;
use tubely_processing::{ThumbnailStore, UploadPipeline};

/// Shared application state, built once at startup.
pub struct AppState {
    pub config: Config,
    pub pipeline: Arc<UploadPipeline>,
    pub videos: Arc<dyn VideoRepository>,
    /// Present only when thumbnails are kept in memory.
    pub thumbnail_store: Option<ThumbnailStore>,
}
