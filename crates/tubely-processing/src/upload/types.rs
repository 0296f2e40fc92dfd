//! Types for the upload pipeline.

use std::fmt::{Display, Formatter, Result as FmtResult};
use tubely_core::models::Video;
use tubely_core::AppError;
use uuid::Uuid;

use crate::staging::StagingError;
use crate::thumbnail::SinkError;
use crate::validator::ValidationError;
use crate::video::NormalizeError;

/// A video record whose ownership has been checked against the caller.
///
/// Only [`crate::UploadPipeline::authorize`] produces one, and the publish
/// operations consume it.
#[derive(Debug)]
pub struct OwnedVideo(Video);

impl OwnedVideo {
    pub(crate) fn new(video: Video) -> Self {
        Self(video)
    }

    pub fn id(&self) -> Uuid {
        self.0.id
    }

    pub fn video(&self) -> &Video {
        &self.0
    }
}

/// Where a video upload is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Authorizing,
    Validating,
    Staged,
    Probed,
    Normalized,
    Uploaded,
    Published,
    CleanedUp,
    Failed,
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            PipelineStage::Authorizing => "authorizing",
            PipelineStage::Validating => "validating",
            PipelineStage::Staged => "staged",
            PipelineStage::Probed => "probed",
            PipelineStage::Normalized => "normalized",
            PipelineStage::Uploaded => "uploaded",
            PipelineStage::Published => "published",
            PipelineStage::CleanedUp => "cleaned_up",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    InvalidInput(#[from] ValidationError),

    #[error("Video {0} not found")]
    NotFound(Uuid),

    #[error("User {user_id} is not the owner of video {video_id}")]
    Forbidden { video_id: Uuid, user_id: Uuid },

    #[error("Failed to stage upload: {0}")]
    Staging(#[from] StagingError),

    #[error("Failed to normalize video: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("Failed to upload {key} to remote storage")]
    RemoteUpload { key: String },

    #[error("Failed to store thumbnail: {0}")]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Record(#[from] AppError),
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::InvalidInput(e) => AppError::InvalidInput(e.to_string()),
            UploadError::NotFound(_) => AppError::NotFound("Video not found".to_string()),
            UploadError::Forbidden { .. } => {
                AppError::Forbidden("User is not owner of the video".to_string())
            }
            UploadError::Staging(e @ StagingError::UnsupportedMediaType(_))
            | UploadError::Sink(SinkError::Staging(e @ StagingError::UnsupportedMediaType(_))) => {
                AppError::InvalidInput(e.to_string())
            }
            e @ (UploadError::Staging(_) | UploadError::Sink(_) | UploadError::RemoteUpload { .. }) => {
                AppError::Storage(e.to_string())
            }
            e @ UploadError::Normalize(_) => AppError::MediaProcessing(e.to_string()),
            UploadError::Record(e) => e,
        }
    }
}
