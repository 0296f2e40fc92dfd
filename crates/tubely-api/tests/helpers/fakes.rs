//! Stand-ins for ffprobe and ffmpeg.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tubely_core::models::AspectCategory;
use tubely_processing::{processed_path, NormalizeError, Normalizer, Prober};

pub struct FixedProber(pub Option<AspectCategory>);

#[async_trait]
impl Prober for FixedProber {
    async fn probe(&self, _path: &Path) -> Option<AspectCategory> {
        self.0
    }
}

/// Remux that copies the input to its `.processed` path.
pub struct CopyNormalizer;

#[async_trait]
impl Normalizer for CopyNormalizer {
    async fn normalize_for_streaming(&self, input: &Path) -> Result<PathBuf, NormalizeError> {
        let output = processed_path(input);
        tokio::fs::copy(input, &output)
            .await
            .expect("copy staged video");
        Ok(output)
    }
}

/// Leaves a truncated output behind and fails, like a crashed remux.
pub struct FailingNormalizer;

#[async_trait]
impl Normalizer for FailingNormalizer {
    async fn normalize_for_streaming(&self, input: &Path) -> Result<PathBuf, NormalizeError> {
        let output = processed_path(input);
        tokio::fs::write(&output, b"trunc")
            .await
            .expect("write partial output");
        Err(NormalizeError::MissingOutput(output))
    }
}
