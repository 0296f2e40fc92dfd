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
use uuid::Uuid;

#[tracing::instrument(
    skip(state, multipart),
    fields(user_id = %user.user_id, operation = "upload_thumbnail")
)]
pub async fn upload_thumbnail(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    video_id: Result<Path<Uuid>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Video>, HttpAppError> {
    let Path(video_id) = video_id?;
    let owned = state.pipeline.authorize(video_id, user.user_id).await?;

    let blob = read_upload_field(
        multipart?,
        UploadKind::Thumbnail,
        state.pipeline.thumbnail_rules(),
    )
    .await?;

    let video = state.pipeline.publish_thumbnail(owned, blob).await?;
    Ok(Json(video))
}
