//! Thumbnail sinks.
//!
//! A deployment picks exactly one; each turns an accepted thumbnail blob into a
//! URL that is stored on the video record.
//!
//! Writing is two-phase. [`ThumbnailSink::store`] writes the new thumbnail and
//! leaves the one it replaces alone; the caller then either commits once the
//! record points at the new URL or rolls back if the record update failed.

mod disk;
mod inline;
mod memory;

use async_trait::async_trait;
use tubely_core::models::{MediaBlob, Video};
use uuid::Uuid;

use crate::staging::StagingError;

pub use disk::DiskThumbnailSink;
pub use inline::DataUrlThumbnailSink;
pub use memory::{MemoryThumbnailSink, StoredThumbnail, ThumbnailStore};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Failed to write thumbnail: {0}")]
    Staging(#[from] StagingError),
}

/// A thumbnail written by a sink that the record does not reference yet.
#[derive(Debug)]
#[must_use = "a pending thumbnail must be committed or rolled back"]
pub struct PendingThumbnail {
    video_id: Uuid,
    url: String,
    replaces: Option<String>,
    displaced: Option<StoredThumbnail>,
}

impl PendingThumbnail {
    pub fn new(video_id: Uuid, url: impl Into<String>, replaces: Option<String>) -> Self {
        Self {
            video_id,
            url: url.into(),
            replaces,
            displaced: None,
        }
    }

    /// URL the new thumbnail is reachable at.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn with_displaced(mut self, displaced: Option<StoredThumbnail>) -> Self {
        self.displaced = displaced;
        self
    }
}

#[async_trait]
pub trait ThumbnailSink: Send + Sync {
    /// Keep `blob` for `video` without touching the thumbnail it replaces.
    async fn store(&self, video: &Video, blob: MediaBlob) -> Result<PendingThumbnail, SinkError>;

    /// The record now points at `pending`; release what it replaced.
    async fn commit(&self, _pending: PendingThumbnail) {}

    /// The record was not updated; undo what `store` wrote.
    async fn rollback(&self, _pending: PendingThumbnail) {}
}
