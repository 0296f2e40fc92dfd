use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tubely_core::models::{MediaBlob, Video};

use super::{PendingThumbnail, SinkError, ThumbnailSink};

/// Embeds the thumbnail in the record as a `data:` URL.
#[derive(Debug, Clone, Default)]
pub struct DataUrlThumbnailSink;

impl DataUrlThumbnailSink {
    pub fn encode(blob: &MediaBlob) -> String {
        format!("data:{};base64,{}", blob.essence(), STANDARD.encode(&blob.data))
    }
}

#[async_trait]
impl ThumbnailSink for DataUrlThumbnailSink {
    async fn store(&self, video: &Video, blob: MediaBlob) -> Result<PendingThumbnail, SinkError> {
        Ok(PendingThumbnail::new(
            video.id,
            Self::encode(&blob),
            video.thumbnail_url.clone(),
        ))
    }
}
