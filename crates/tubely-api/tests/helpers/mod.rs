//! Test helpers: build an app around the in-memory record store, the local
//! storage backend in a temp dir, and fake probe/remux tools.
//!
//! Run with: `cargo test -p tubely-api`

pub mod fakes;

use axum_test::TestServer;
use chrono::Duration;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tubely_api::auth::make_jwt;
use tubely_api::setup::{routes, services};
use tubely_api::AppState;
use tubely_core::models::{AspectCategory, Video};
use tubely_core::Config;
use tubely_db::{InMemoryVideoRepository, VideoRepository};
use tubely_processing::{Normalizer, Prober};
use tubely_storage::LocalStorage;
use uuid::Uuid;

use fakes::{CopyNormalizer, FixedProber};

pub const TEST_JWT_SECRET: &str = "test-secret-test-secret-test-secret";
pub const CDN_HOST: &str = "d1.cloudfront.net";

pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub videos: Arc<InMemoryVideoRepository>,
    pub media_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub assets_dir: PathBuf,
    _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Insert a record owned by `owner`.
    pub async fn create_video(&self, owner: Uuid) -> Video {
        let video = Video::new(owner, "Boots demo", "A short clip");
        self.videos.create(&video).await.expect("create video");
        video
    }

    pub async fn stored_video(&self, id: Uuid) -> Video {
        self.videos
            .get(id)
            .await
            .expect("get video")
            .expect("video exists")
    }
}

/// Bearer header value for `user_id`.
pub fn bearer(user_id: Uuid) -> String {
    let token = make_jwt(user_id, TEST_JWT_SECRET, Duration::hours(1)).expect("sign token");
    format!("Bearer {}", token)
}

pub fn dir_entries(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|e| e.expect("dir entry").file_name().to_string_lossy().to_string())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Default app: memory thumbnail sink, landscape probe, copying remux.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(
        &[],
        Arc::new(FixedProber(Some(AspectCategory::Landscape))),
        Arc::new(CopyNormalizer),
    )
    .await
}

pub async fn setup_test_app_with(
    overrides: &[(&str, &str)],
    prober: Arc<dyn Prober>,
    normalizer: Arc<dyn Normalizer>,
) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let media_dir = temp_dir.path().join("media");
    let scratch_dir = temp_dir.path().join("scratch");
    let assets_dir = temp_dir.path().join("assets");

    let mut vars: HashMap<String, String> = [
        ("JWT_SECRET", TEST_JWT_SECRET.to_string()),
        ("DATABASE_URL", "memory".to_string()),
        ("PUBLIC_BASE_URL", "http://localhost:8091".to_string()),
        ("STORAGE_BACKEND", "local".to_string()),
        ("LOCAL_STORAGE_PATH", media_dir.display().to_string()),
        (
            "LOCAL_STORAGE_BASE_URL",
            "http://localhost:8091/media".to_string(),
        ),
        ("CDN_DISTRIBUTION", CDN_HOST.to_string()),
        ("ASSETS_ROOT", assets_dir.display().to_string()),
        ("SCRATCH_DIR", scratch_dir.display().to_string()),
        ("THUMBNAIL_SINK", "memory".to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    for (k, v) in overrides {
        vars.insert(k.to_string(), v.to_string());
    }
    let config = Config::from_lookup(|key| vars.get(key).cloned()).expect("valid test config");

    let storage = Arc::new(
        LocalStorage::new(media_dir.clone())
            .await
            .expect("Failed to create local storage"),
    );
    let videos = Arc::new(InMemoryVideoRepository::new());

    let state = services::initialize_services(
        &config,
        videos.clone(),
        storage,
        prober,
        normalizer,
    )
    .await
    .expect("Failed to initialize services");

    let router = routes::setup_routes(&config, state.clone());
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        state,
        videos,
        media_dir,
        scratch_dir,
        assets_dir,
        _temp_dir: temp_dir,
    }
}
