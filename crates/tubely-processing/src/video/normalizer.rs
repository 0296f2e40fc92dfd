use async_trait::async_trait;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tubely_core::constants::PROCESSED_SUFFIX;

use crate::command::{run_tool, CommandError};

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("Remux failed: {0}")]
    Tool(#[from] CommandError),

    #[error("Remux produced no output at {0}")]
    MissingOutput(PathBuf),
}

/// Rewrites a staged video so playback metadata sits at the front of the file.
///
/// The input is left untouched; the output is a new file next to it. Failure is
/// fatal for a video upload.
#[async_trait]
pub trait Normalizer: Send + Sync {
    async fn normalize_for_streaming(&self, input: &Path) -> Result<PathBuf, NormalizeError>;
}

/// Output path for a remuxed file: `clip.mp4` becomes `clip.processed.mp4`.
pub fn processed_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_else(|| OsStr::new(""));
    let mut name = OsString::from(stem);
    name.push(".");
    name.push(PROCESSED_SUFFIX);
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }
    input.with_file_name(name)
}

pub struct FfmpegNormalizer {
    ffmpeg_path: String,
    timeout: Duration,
}

impl FfmpegNormalizer {
    pub fn new(ffmpeg_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Normalizer for FfmpegNormalizer {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    async fn normalize_for_streaming(&self, input: &Path) -> Result<PathBuf, NormalizeError> {
        let output = processed_path(input);
        let start = std::time::Instant::now();

        // stream copy only: no re-encode, metadata preserved, moov moved to the front
        let args = [
            OsStr::new("-y"),
            OsStr::new("-v"),
            OsStr::new("error"),
            OsStr::new("-i"),
            input.as_os_str(),
            OsStr::new("-movflags"),
            OsStr::new("faststart"),
            OsStr::new("-map_metadata"),
            OsStr::new("0"),
            OsStr::new("-codec"),
            OsStr::new("copy"),
            output.as_os_str(),
        ];

        if let Err(e) = run_tool(&self.ffmpeg_path, args, self.timeout).await {
            tracing::error!(error = %e, input = %input.display(), "Video remux failed");
            return Err(e.into());
        }

        if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
            return Err(NormalizeError::MissingOutput(output));
        }

        tracing::info!(
            output = %output.display(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Video remux completed"
        );

        Ok(output)
    }
}
