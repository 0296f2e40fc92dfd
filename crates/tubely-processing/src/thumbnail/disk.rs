use async_trait::async_trait;
use tubely_core::models::{MediaBlob, Video};
use tubely_core::ThumbnailNaming;

use super::{PendingThumbnail, SinkError, ThumbnailSink};
use crate::staging::{NamingMode, StagingArea};

/// Writes thumbnails under the assets root, served as static files at `/assets/`.
#[derive(Debug, Clone)]
pub struct DiskThumbnailSink {
    staging: StagingArea,
    public_base_url: String,
    naming: ThumbnailNaming,
}

impl DiskThumbnailSink {
    pub fn new(
        staging: StagingArea,
        public_base_url: impl Into<String>,
        naming: ThumbnailNaming,
    ) -> Self {
        Self {
            staging,
            public_base_url: public_base_url.into(),
            naming,
        }
    }

    fn assets_prefix(&self) -> String {
        format!("{}/assets/", self.public_base_url.trim_end_matches('/'))
    }

    /// File name under the assets root that `url` refers to, if this sink wrote it.
    fn local_name<'a>(&self, url: &'a str) -> Option<&'a str> {
        let name = url.strip_prefix(self.assets_prefix().as_str())?;
        if name.is_empty() || name.contains('/') || name.starts_with('.') {
            return None;
        }
        Some(name)
    }

    async fn remove_file(&self, name: &str, what: &str) {
        let path = self.staging.root().join(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed {}", what),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "Failed to remove {}", what)
            }
        }
    }
}

#[async_trait]
impl ThumbnailSink for DiskThumbnailSink {
    async fn store(&self, video: &Video, blob: MediaBlob) -> Result<PendingThumbnail, SinkError> {
        let video_key = video.id.to_string();
        let naming = match self.naming {
            ThumbnailNaming::Random => NamingMode::Random,
            ThumbnailNaming::VideoId => NamingMode::CallerSupplied(&video_key),
        };

        let staged = self.staging.stage(&blob, naming).await?;
        let url = format!("{}{}", self.assets_prefix(), staged.file_name);
        Ok(PendingThumbnail::new(video.id, url, video.thumbnail_url.clone()))
    }

    async fn commit(&self, pending: PendingThumbnail) {
        let Some(old_name) = pending.replaces.as_deref().and_then(|u| self.local_name(u)) else {
            return;
        };
        // same-name writes already replaced the old content in place
        if Some(old_name) != self.local_name(&pending.url) {
            self.remove_file(old_name, "replaced thumbnail").await;
        }
    }

    async fn rollback(&self, pending: PendingThumbnail) {
        let Some(new_name) = self.local_name(&pending.url) else {
            return;
        };
        // the record still references this name, so the file must stay
        if pending.replaces.as_deref().and_then(|u| self.local_name(u)) != Some(new_name) {
            self.remove_file(new_name, "unreferenced thumbnail").await;
        }
    }
}
