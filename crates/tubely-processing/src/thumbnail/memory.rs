use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tubely_core::models::{MediaBlob, Video};
use uuid::Uuid;

use super::{PendingThumbnail, SinkError, ThumbnailSink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredThumbnail {
    pub data: Vec<u8>,
    pub media_type: String,
}

/// Process-wide thumbnail map keyed by video id.
///
/// Lives as long as the application state; cleared only on restart. Writes are
/// serialised by the lock, so concurrent uploads for one id are last-write-wins.
#[derive(Debug, Clone, Default)]
pub struct ThumbnailStore {
    inner: Arc<RwLock<HashMap<Uuid, StoredThumbnail>>>,
}

impl ThumbnailStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `thumbnail`, returning the one it displaced.
    pub async fn put(&self, video_id: Uuid, thumbnail: StoredThumbnail) -> Option<StoredThumbnail> {
        self.inner.write().await.insert(video_id, thumbnail)
    }

    pub async fn remove(&self, video_id: Uuid) -> Option<StoredThumbnail> {
        self.inner.write().await.remove(&video_id)
    }

    pub async fn get(&self, video_id: Uuid) -> Option<StoredThumbnail> {
        self.inner.read().await.get(&video_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

/// Keeps thumbnails in a [`ThumbnailStore`] served back by the API.
#[derive(Debug, Clone)]
pub struct MemoryThumbnailSink {
    store: ThumbnailStore,
    public_base_url: String,
}

impl MemoryThumbnailSink {
    pub fn new(store: ThumbnailStore, public_base_url: impl Into<String>) -> Self {
        Self {
            store,
            public_base_url: public_base_url.into(),
        }
    }
}

#[async_trait]
impl ThumbnailSink for MemoryThumbnailSink {
    async fn store(&self, video: &Video, blob: MediaBlob) -> Result<PendingThumbnail, SinkError> {
        let media_type = blob.essence();
        let displaced = self
            .store
            .put(
                video.id,
                StoredThumbnail {
                    data: blob.data,
                    media_type,
                },
            )
            .await;

        let url = format!(
            "{}/api/thumbnails/{}",
            self.public_base_url.trim_end_matches('/'),
            video.id
        );
        Ok(PendingThumbnail::new(video.id, url, video.thumbnail_url.clone())
            .with_displaced(displaced))
    }

    async fn rollback(&self, pending: PendingThumbnail) {
        match pending.displaced {
            Some(previous) => {
                self.store.put(pending.video_id, previous).await;
            }
            None => {
                self.store.remove(pending.video_id).await;
            }
        }
    }
}
