use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tubely_core::models::Video;
use tubely_core::AppError;
use uuid::Uuid;

use super::video::VideoRepository;

/// Video store held in process memory
#[derive(Clone, Default)]
pub struct InMemoryVideoRepository {
    videos: Arc<Mutex<HashMap<Uuid, Video>>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, Video>>, AppError> {
        self.videos
            .lock()
            .map_err(|_| AppError::Internal("video store lock poisoned".to_string()))
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        Ok(self.lock()?.get(&id).cloned())
    }

    async fn update(&self, video: &Video) -> Result<(), AppError> {
        let mut videos = self.lock()?;
        match videos.get_mut(&video.id) {
            Some(existing) => {
                *existing = video.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Video {} not found", video.id))),
        }
    }

    async fn create(&self, video: &Video) -> Result<(), AppError> {
        self.lock()?.insert(video.id, video.clone());
        Ok(())
    }
}
