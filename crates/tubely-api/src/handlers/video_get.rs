use crate::auth::AuthUser;
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use std::sync::Arc;
use tubely_core::models::Video;
use uuid::Uuid;

#[tracing::instrument(skip(state), fields(user_id = %user.user_id, operation = "get_video"))]
pub async fn get_video(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    video_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Video>, HttpAppError> {
    let Path(video_id) = video_id?;
    let owned = state.pipeline.authorize(video_id, user.user_id).await?;
    Ok(Json(owned.video().clone()))
}
