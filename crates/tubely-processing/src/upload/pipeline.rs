//! Upload pipeline: authorize → validate → stage → probe → normalize → upload → publish → clean up.
//!
//! Both flows start from an [`OwnedVideo`], so ownership is always checked before
//! any upload body is touched. The video flow always ends with a cleanup phase
//! once something has been staged, whatever the outcome.

use chrono::Utc;
use std::sync::Arc;
use tubely_core::models::{MediaBlob, Video};
use tubely_db::VideoRepository;
use tubely_storage::{video_object_key, ObjectUrlBuilder, RemoteUploader};
use uuid::Uuid;

use super::cleanup::ScratchFiles;
use super::types::{OwnedVideo, PipelineStage, UploadError};
use crate::staging::{NamingMode, StagedAsset, StagingArea};
use crate::thumbnail::ThumbnailSink;
use crate::validator::MediaValidator;
use crate::video::{processed_path, Normalizer, Prober};

/// Collaborators an [`UploadPipeline`] is built from.
pub struct PipelineComponents {
    pub videos: Arc<dyn VideoRepository>,
    pub staging: StagingArea,
    pub prober: Arc<dyn Prober>,
    pub normalizer: Arc<dyn Normalizer>,
    pub uploader: RemoteUploader,
    pub urls: ObjectUrlBuilder,
    pub thumbnails: Arc<dyn ThumbnailSink>,
    pub thumbnail_rules: MediaValidator,
    pub video_rules: MediaValidator,
}

pub struct UploadPipeline {
    videos: Arc<dyn VideoRepository>,
    staging: StagingArea,
    prober: Arc<dyn Prober>,
    normalizer: Arc<dyn Normalizer>,
    uploader: RemoteUploader,
    urls: ObjectUrlBuilder,
    thumbnails: Arc<dyn ThumbnailSink>,
    thumbnail_rules: MediaValidator,
    video_rules: MediaValidator,
}

/// Logs stage transitions for one request and remembers the last one reached.
struct StageLog {
    video_id: Uuid,
    current: PipelineStage,
}

impl StageLog {
    fn start(video_id: Uuid) -> Self {
        tracing::debug!(%video_id, stage = %PipelineStage::Authorizing, "Upload stage");
        Self {
            video_id,
            current: PipelineStage::Authorizing,
        }
    }

    fn advance(&mut self, stage: PipelineStage) {
        tracing::debug!(video_id = %self.video_id, from = %self.current, stage = %stage, "Upload stage");
        self.current = stage;
    }

    fn fail(&mut self, err: &UploadError) {
        tracing::warn!(
            video_id = %self.video_id,
            failed_at = %self.current,
            stage = %PipelineStage::Failed,
            error = %err,
            "Upload failed"
        );
        self.current = PipelineStage::Failed;
    }
}

impl UploadPipeline {
    pub fn new(components: PipelineComponents) -> Self {
        Self {
            videos: components.videos,
            staging: components.staging,
            prober: components.prober,
            normalizer: components.normalizer,
            uploader: components.uploader,
            urls: components.urls,
            thumbnails: components.thumbnails,
            thumbnail_rules: components.thumbnail_rules,
            video_rules: components.video_rules,
        }
    }

    pub fn thumbnail_rules(&self) -> &MediaValidator {
        &self.thumbnail_rules
    }

    pub fn video_rules(&self) -> &MediaValidator {
        &self.video_rules
    }

    /// Resolve `video_id` and check that `user_id` owns it.
    #[tracing::instrument(skip(self))]
    pub async fn authorize(&self, video_id: Uuid, user_id: Uuid) -> Result<OwnedVideo, UploadError> {
        let video = self
            .videos
            .get(video_id)
            .await?
            .ok_or(UploadError::NotFound(video_id))?;

        if !video.is_owned_by(user_id) {
            return Err(UploadError::Forbidden { video_id, user_id });
        }

        Ok(OwnedVideo::new(video))
    }

    /// Fresh copy of an authorized record, so a write only changes its own field.
    async fn current_record(&self, owned: OwnedVideo) -> Result<Video, UploadError> {
        let id = owned.id();
        self.videos.get(id).await?.ok_or(UploadError::NotFound(id))
    }

    /// Validate a thumbnail, hand it to the configured sink and record its URL.
    #[tracing::instrument(skip(self, owned, blob), fields(video_id = %owned.id(), size_bytes = blob.len()))]
    pub async fn publish_thumbnail(
        &self,
        owned: OwnedVideo,
        blob: MediaBlob,
    ) -> Result<Video, UploadError> {
        self.thumbnail_rules.validate(&blob)?;

        let mut video = self.current_record(owned).await?;
        let pending = self.thumbnails.store(&video, blob).await?;

        video.thumbnail_url = Some(pending.url().to_string());
        video.updated_at = Utc::now();
        if let Err(e) = self.videos.update(&video).await {
            self.thumbnails.rollback(pending).await;
            return Err(e.into());
        }
        self.thumbnails.commit(pending).await;

        tracing::info!(video_id = %video.id, "Thumbnail published");
        Ok(video)
    }

    /// Run the full video flow for an authorized upload.
    ///
    /// Probe failure only loses the aspect prefix. Staging, remux, upload and
    /// record failures are terminal, and the record is left untouched. An object
    /// uploaded before a failed record update is removed again.
    #[tracing::instrument(skip(self, owned, blob), fields(video_id = %owned.id(), size_bytes = blob.len()))]
    pub async fn publish_video(
        &self,
        owned: OwnedVideo,
        blob: MediaBlob,
    ) -> Result<Video, UploadError> {
        let mut stages = StageLog::start(owned.id());

        stages.advance(PipelineStage::Validating);
        if let Err(e) = self.video_rules.validate(&blob) {
            let err = UploadError::from(e);
            stages.fail(&err);
            return Err(err);
        }

        let staged = match self.staging.stage(&blob, NamingMode::Random).await {
            Ok(staged) => staged,
            Err(e) => {
                let err = UploadError::from(e);
                stages.fail(&err);
                return Err(err);
            }
        };
        drop(blob);
        stages.advance(PipelineStage::Staged);

        let mut scratch = ScratchFiles::default();
        scratch.track(staged.path.clone());

        let outcome = self
            .process_staged_video(owned, &staged, &mut scratch, &mut stages)
            .await;
        if let Err(ref err) = outcome {
            stages.fail(err);
        }

        scratch.cleanup().await;
        if outcome.is_ok() {
            stages.advance(PipelineStage::CleanedUp);
        }

        outcome
    }

    async fn process_staged_video(
        &self,
        owned: OwnedVideo,
        staged: &StagedAsset,
        scratch: &mut ScratchFiles,
        stages: &mut StageLog,
    ) -> Result<Video, UploadError> {
        let category = self.prober.probe(&staged.path).await;
        stages.advance(PipelineStage::Probed);

        // tracked up front so a half-written remux output is removed too
        scratch.track(processed_path(&staged.path));
        let normalized = self.normalizer.normalize_for_streaming(&staged.path).await?;
        scratch.track(normalized.clone());
        stages.advance(PipelineStage::Normalized);

        let key = video_object_key(category, &staged.file_name);
        if !self
            .uploader
            .upload(&normalized, &key, &staged.media_type)
            .await
        {
            return Err(UploadError::RemoteUpload { key });
        }
        stages.advance(PipelineStage::Uploaded);

        let mut video = match self.current_record(owned).await {
            Ok(video) => video,
            Err(e) => {
                self.uploader.remove(&key).await;
                return Err(e);
            }
        };
        video.video_url = Some(self.urls.url_for(&key));
        video.updated_at = Utc::now();
        if let Err(e) = self.videos.update(&video).await {
            self.uploader.remove(&key).await;
            return Err(e.into());
        }
        stages.advance(PipelineStage::Published);

        tracing::info!(video_id = %video.id, key = %key, "Video published");
        Ok(video)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tubely_core::models::AspectCategory;
    use tubely_core::{AppError, StorageBackend, ThumbnailNaming};
    use tubely_db::InMemoryVideoRepository;
    use tubely_storage::{Storage, StorageError, StorageResult};

    use crate::thumbnail::{DataUrlThumbnailSink, DiskThumbnailSink};
    use crate::video::NormalizeError;

    struct FixedProber(Option<AspectCategory>);

    #[async_trait]
    impl Prober for FixedProber {
        async fn probe(&self, _path: &Path) -> Option<AspectCategory> {
            self.0
        }
    }

    struct CopyNormalizer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Normalizer for CopyNormalizer {
        async fn normalize_for_streaming(&self, input: &Path) -> Result<PathBuf, NormalizeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let output = processed_path(input);
            tokio::fs::copy(input, &output).await.unwrap();
            Ok(output)
        }
    }

    /// Writes a partial output and then fails, like an ffmpeg crash mid-remux.
    struct BrokenNormalizer;

    #[async_trait]
    impl Normalizer for BrokenNormalizer {
        async fn normalize_for_streaming(&self, input: &Path) -> Result<PathBuf, NormalizeError> {
            let output = processed_path(input);
            tokio::fs::write(&output, b"partial").await.unwrap();
            Err(NormalizeError::MissingOutput(output))
        }
    }

    #[derive(Default)]
    struct RecordingStorage {
        objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
        puts: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Storage for RecordingStorage {
        async fn put_object(
            &self,
            key: &str,
            data: Vec<u8>,
            content_type: &str,
        ) -> StorageResult<()> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StorageError::UploadFailed("503 Slow Down".into()));
            }
            self.objects
                .lock()
                .unwrap()
                .insert(key.to_string(), (data, content_type.to_string()));
            Ok(())
        }

        async fn delete(&self, key: &str) -> StorageResult<()> {
            self.objects.lock().unwrap().remove(key);
            Ok(())
        }

        fn backend_type(&self) -> StorageBackend {
            StorageBackend::S3
        }
    }

    /// In-memory records whose updates can be switched to fail.
    #[derive(Default)]
    struct FlakyRepository {
        inner: InMemoryVideoRepository,
        fail_updates: AtomicBool,
    }

    #[async_trait]
    impl VideoRepository for FlakyRepository {
        async fn get(&self, id: Uuid) -> Result<Option<Video>, AppError> {
            self.inner.get(id).await
        }

        async fn update(&self, video: &Video) -> Result<(), AppError> {
            if self.fail_updates.load(Ordering::SeqCst) {
                return Err(AppError::Internal("database is locked".into()));
            }
            self.inner.update(video).await
        }

        async fn create(&self, video: &Video) -> Result<(), AppError> {
            self.inner.create(video).await
        }
    }

    struct Harness {
        _dir: TempDir,
        scratch_root: PathBuf,
        assets_root: PathBuf,
        repo: Arc<FlakyRepository>,
        storage: Arc<RecordingStorage>,
        pipeline: UploadPipeline,
        video: Video,
    }

    impl Harness {
        fn scratch_entries(&self) -> Vec<String> {
            entries(&self.scratch_root)
        }

        fn asset_entries(&self) -> Vec<String> {
            entries(&self.assets_root)
        }

        async fn stored_video(&self) -> Video {
            self.repo.get(self.video.id).await.unwrap().unwrap()
        }

        fn fail_updates(&self) {
            self.repo.fail_updates.store(true, Ordering::SeqCst);
        }
    }

    fn entries(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect()
    }

    async fn harness(
        prober: Arc<dyn Prober>,
        normalizer: Arc<dyn Normalizer>,
        storage: RecordingStorage,
    ) -> Harness {
        harness_with(prober, normalizer, storage, false).await
    }

    async fn harness_with(
        prober: Arc<dyn Prober>,
        normalizer: Arc<dyn Normalizer>,
        storage: RecordingStorage,
        disk_thumbnails: bool,
    ) -> Harness {
        let dir = TempDir::new().unwrap();
        let scratch_root = dir.path().join("scratch");
        let staging = StagingArea::new(&scratch_root).await.unwrap();
        let assets_root = dir.path().join("assets");
        let assets = StagingArea::new(&assets_root).await.unwrap();

        let thumbnails: Arc<dyn ThumbnailSink> = if disk_thumbnails {
            Arc::new(DiskThumbnailSink::new(
                assets,
                "http://localhost:8091",
                ThumbnailNaming::Random,
            ))
        } else {
            Arc::new(DataUrlThumbnailSink)
        };

        let repo = Arc::new(FlakyRepository::default());
        let video = Video::new(Uuid::new_v4(), "Boots", "boots in action");
        repo.create(&video).await.unwrap();

        let storage = Arc::new(storage);
        let pipeline = UploadPipeline::new(PipelineComponents {
            videos: repo.clone(),
            staging,
            prober,
            normalizer,
            uploader: RemoteUploader::new(storage.clone()),
            urls: ObjectUrlBuilder::Edge {
                host: "d1.cloudfront.net".into(),
            },
            thumbnails,
            thumbnail_rules: MediaValidator::new(
                10 << 20,
                vec!["image/jpeg".into(), "image/png".into()],
            ),
            video_rules: MediaValidator::new(1 << 20, vec!["video/mp4".into()]),
        });

        Harness {
            _dir: dir,
            scratch_root,
            assets_root,
            repo,
            storage,
            pipeline,
            video,
        }
    }

    fn landscape_only() -> Arc<dyn Prober> {
        Arc::new(FixedProber(Some(AspectCategory::Landscape)))
    }

    fn default_normalizer() -> Arc<dyn Normalizer> {
        Arc::new(CopyNormalizer {
            calls: AtomicUsize::new(0),
        })
    }

    async fn default_harness() -> Harness {
        harness(landscape_only(), default_normalizer(), RecordingStorage::default()).await
    }

    fn mp4(len: usize) -> MediaBlob {
        MediaBlob::new(vec![0x42; len], "video/mp4")
    }

    #[tokio::test]
    async fn video_end_to_end() {
        let h = default_harness().await;
        let owned = h.pipeline.authorize(h.video.id, h.video.user_id).await.unwrap();

        let published = h.pipeline.publish_video(owned, mp4(4096)).await.unwrap();

        let objects = h.storage.objects.lock().unwrap().clone();
        assert_eq!(objects.len(), 1);
        let (key, (data, content_type)) = objects.into_iter().next().unwrap();
        assert!(key.starts_with("landscape-"));
        assert!(key.ends_with(".mp4"));
        assert!(!key.contains(".processed"));
        assert_eq!(data.len(), 4096);
        assert_eq!(content_type, "video/mp4");

        let expected_url = format!("https://d1.cloudfront.net/{}", key);
        assert_eq!(published.video_url.as_deref(), Some(expected_url.as_str()));
        assert_eq!(h.stored_video().await.video_url, Some(expected_url));
        assert!(h.scratch_entries().is_empty());
    }

    #[tokio::test]
    async fn unknown_aspect_uses_placeholder_prefix() {
        let h = harness(
            Arc::new(FixedProber(None)),
            Arc::new(CopyNormalizer {
                calls: AtomicUsize::new(0),
            }),
            RecordingStorage::default(),
        )
        .await;
        let owned = h.pipeline.authorize(h.video.id, h.video.user_id).await.unwrap();

        h.pipeline.publish_video(owned, mp4(16)).await.unwrap();

        let keys: Vec<String> = h.storage.objects.lock().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].starts_with("unknown-"));
    }

    #[tokio::test]
    async fn normalization_failure_leaves_record_and_cleans_up() {
        let h = harness(
            Arc::new(FixedProber(Some(AspectCategory::Portrait))),
            Arc::new(BrokenNormalizer),
            RecordingStorage::default(),
        )
        .await;
        let owned = h.pipeline.authorize(h.video.id, h.video.user_id).await.unwrap();

        let err = h.pipeline.publish_video(owned, mp4(64)).await.unwrap_err();

        assert!(matches!(err, UploadError::Normalize(_)));
        assert!(h.stored_video().await.video_url.is_none());
        assert_eq!(h.storage.puts.load(Ordering::SeqCst), 0);
        assert!(h.scratch_entries().is_empty());
    }

    #[tokio::test]
    async fn remote_failure_leaves_record_and_cleans_up() {
        let h = harness(
            Arc::new(FixedProber(Some(AspectCategory::Other))),
            Arc::new(CopyNormalizer {
                calls: AtomicUsize::new(0),
            }),
            RecordingStorage {
                fail: true,
                ..Default::default()
            },
        )
        .await;
        let owned = h.pipeline.authorize(h.video.id, h.video.user_id).await.unwrap();

        let err = h.pipeline.publish_video(owned, mp4(64)).await.unwrap_err();

        match err {
            UploadError::RemoteUpload { key } => assert!(key.starts_with("other-")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(h.stored_video().await.video_url.is_none());
        assert!(h.scratch_entries().is_empty());
    }

    #[tokio::test]
    async fn non_owner_is_rejected_before_any_io() {
        let normalizer = Arc::new(CopyNormalizer {
            calls: AtomicUsize::new(0),
        });
        let h = harness(
            Arc::new(FixedProber(Some(AspectCategory::Landscape))),
            normalizer.clone(),
            RecordingStorage::default(),
        )
        .await;

        let err = h
            .pipeline
            .authorize(h.video.id, Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Forbidden { .. }));
        assert!(h.scratch_entries().is_empty());
        assert_eq!(h.storage.puts.load(Ordering::SeqCst), 0);
        assert_eq!(normalizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_video_is_not_found() {
        let h = default_harness().await;
        let err = h
            .pipeline
            .authorize(Uuid::new_v4(), h.video.user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::NotFound(_)));
    }

    #[tokio::test]
    async fn size_boundary_and_type_for_videos() {
        let h = default_harness().await;

        let owned = h.pipeline.authorize(h.video.id, h.video.user_id).await.unwrap();
        assert!(h.pipeline.publish_video(owned, mp4(1 << 20)).await.is_ok());

        let owned = h.pipeline.authorize(h.video.id, h.video.user_id).await.unwrap();
        let err = h
            .pipeline
            .publish_video(owned, mp4((1 << 20) + 1))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::InvalidInput(_)));

        let owned = h.pipeline.authorize(h.video.id, h.video.user_id).await.unwrap();
        let err = h
            .pipeline
            .publish_video(owned, MediaBlob::new(vec![1; 8], "video/quicktime"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::InvalidInput(_)));

        assert!(h.scratch_entries().is_empty());
        assert_eq!(h.storage.puts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn thumbnail_inline_flow() {
        let h = default_harness().await;
        let owned = h.pipeline.authorize(h.video.id, h.video.user_id).await.unwrap();

        let published = h
            .pipeline
            .publish_thumbnail(owned, MediaBlob::new(vec![0xFF, 0xD8, 0xFF], "image/jpeg"))
            .await
            .unwrap();

        assert_eq!(
            published.thumbnail_url.as_deref(),
            Some("data:image/jpeg;base64,/9j/")
        );
        assert_eq!(h.stored_video().await.thumbnail_url, published.thumbnail_url);
        assert!(h.scratch_entries().is_empty());
    }

    #[tokio::test]
    async fn thumbnail_wrong_type_is_rejected() {
        let h = default_harness().await;
        let owned = h.pipeline.authorize(h.video.id, h.video.user_id).await.unwrap();

        let err = h
            .pipeline
            .publish_thumbnail(owned, MediaBlob::new(b"GIF89a".to_vec(), "image/gif"))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::InvalidInput(_)));
        assert!(h.stored_video().await.thumbnail_url.is_none());
    }

    #[tokio::test]
    async fn thumbnail_record_failure_keeps_previous_file() {
        let h = harness_with(
            landscape_only(),
            default_normalizer(),
            RecordingStorage::default(),
            true,
        )
        .await;

        let owned = h.pipeline.authorize(h.video.id, h.video.user_id).await.unwrap();
        let first = h
            .pipeline
            .publish_thumbnail(owned, MediaBlob::new(vec![1; 8], "image/png"))
            .await
            .unwrap();
        let first_url = first.thumbnail_url.unwrap();
        let first_name = first_url.rsplit('/').next().unwrap().to_string();

        h.fail_updates();
        let owned = h.pipeline.authorize(h.video.id, h.video.user_id).await.unwrap();
        let err = h
            .pipeline
            .publish_thumbnail(owned, MediaBlob::new(vec![2; 8], "image/png"))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Record(_)));
        assert_eq!(h.stored_video().await.thumbnail_url, Some(first_url));
        assert_eq!(h.asset_entries(), vec![first_name.clone()]);
        assert_eq!(
            std::fs::read(h.assets_root.join(&first_name)).unwrap(),
            vec![1; 8]
        );
    }

    #[tokio::test]
    async fn thumbnail_replacement_removes_previous_file() {
        let h = harness_with(
            landscape_only(),
            default_normalizer(),
            RecordingStorage::default(),
            true,
        )
        .await;

        let owned = h.pipeline.authorize(h.video.id, h.video.user_id).await.unwrap();
        h.pipeline
            .publish_thumbnail(owned, MediaBlob::new(vec![1; 8], "image/png"))
            .await
            .unwrap();
        let owned = h.pipeline.authorize(h.video.id, h.video.user_id).await.unwrap();
        let second = h
            .pipeline
            .publish_thumbnail(owned, MediaBlob::new(vec![2; 8], "image/png"))
            .await
            .unwrap();

        let second_name = second
            .thumbnail_url
            .as_deref()
            .and_then(|url| url.rsplit('/').next())
            .unwrap()
            .to_string();
        assert_eq!(h.asset_entries(), vec![second_name]);
    }

    #[tokio::test]
    async fn record_failure_after_upload_removes_remote_object() {
        let h = default_harness().await;
        let owned = h.pipeline.authorize(h.video.id, h.video.user_id).await.unwrap();
        h.fail_updates();

        let err = h.pipeline.publish_video(owned, mp4(256)).await.unwrap_err();

        assert!(matches!(err, UploadError::Record(_)));
        assert_eq!(h.storage.puts.load(Ordering::SeqCst), 1);
        assert!(h.storage.objects.lock().unwrap().is_empty());
        assert!(h.stored_video().await.video_url.is_none());
        assert!(h.scratch_entries().is_empty());
    }

    #[tokio::test]
    async fn video_publish_keeps_thumbnail_set_during_upload() {
        let h = default_harness().await;
        let owned = h.pipeline.authorize(h.video.id, h.video.user_id).await.unwrap();

        let thumb_owner = h.pipeline.authorize(h.video.id, h.video.user_id).await.unwrap();
        let with_thumb = h
            .pipeline
            .publish_thumbnail(thumb_owner, MediaBlob::new(vec![0xFF, 0xD8, 0xFF], "image/jpeg"))
            .await
            .unwrap();

        let published = h.pipeline.publish_video(owned, mp4(64)).await.unwrap();

        let stored = h.stored_video().await;
        assert!(stored.video_url.is_some());
        assert_eq!(stored.thumbnail_url, with_thumb.thumbnail_url);
        assert_eq!(published.thumbnail_url, with_thumb.thumbnail_url);
    }
}
