use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::header::CONTENT_TYPE,
    response::IntoResponse,
};
use std::sync::Arc;
use tubely_core::AppError;
use uuid::Uuid;

/// Serve a thumbnail held by the in-memory sink.
pub async fn get_thumbnail(
    State(state): State<Arc<AppState>>,
    video_id: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let Path(video_id) = video_id?;

    let thumbnail = match &state.thumbnail_store {
        Some(store) => store.get(video_id).await,
        None => None,
    }
    .ok_or_else(|| AppError::NotFound("Thumbnail not found".to_string()))?;

    Ok(([(CONTENT_TYPE, thumbnail.media_type)], thumbnail.data))
}
