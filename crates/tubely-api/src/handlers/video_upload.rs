use crate::auth::AuthUser;
use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::upload::read_upload_field;
use axum::{
    extract::{multipart::MultipartRejection, rejection::PathRejection, Multipart, Path, State},
    Json,
};
use std::sync::Arc;
use tubely_core::models::{UploadKind, Video};
use tubely_core::AppError;
use uuid::Uuid;

/// Upload a video file for a record the caller owns.
///
/// Ownership is checked before the body is read. Once the file is received the
/// pipeline runs on its own task, so a dropped connection cannot interrupt it
/// between staging and cleanup.
#[tracing::instrument(
    skip(state, multipart),
    fields(user_id = %user.user_id, operation = "upload_video")
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    video_id: Result<Path<Uuid>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Video>, HttpAppError> {
    let Path(video_id) = video_id?;
    let owned = state.pipeline.authorize(video_id, user.user_id).await?;

    let blob = read_upload_field(multipart?, UploadKind::Video, state.pipeline.video_rules()).await?;
    tracing::info!(video_id = %video_id, size_bytes = blob.len(), "Video received");

    let pipeline = state.pipeline.clone();
    let video = tokio::spawn(async move { pipeline.publish_video(owned, blob).await })
        .await
        .map_err(|e| AppError::Internal(format!("Upload task failed: {}", e)))??;

    Ok(Json(video))
}
