//! Scratch staging of uploaded blobs.
//!
//! Every staged file lives directly under the staging root as `{name}.{ext}`.
//! Bytes go to a hidden temp file first and are renamed into place, so nothing
//! ever observes a partial write at the final path.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tubely_core::models::{normalize_media_type, MediaBlob};

const RANDOM_NAME_BYTES: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("Unsupported media type for staging: {0}")]
    UnsupportedMediaType(String),

    #[error("Invalid staging name: {0}")]
    InvalidName(String),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// How a staged file is named.
#[derive(Debug, Clone, Copy)]
pub enum NamingMode<'a> {
    /// 32 random bytes, base64url without padding.
    Random,
    /// Caller identifier used verbatim; restricted to `[A-Za-z0-9_-]`.
    CallerSupplied(&'a str),
}

/// A blob persisted under the staging root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedAsset {
    pub path: PathBuf,
    /// `{name}.{ext}`, the final path component.
    pub file_name: String,
    pub media_type: String,
}

/// File extension for a media type, without the dot.
///
/// Well-known types map through a fixed table; anything else is accepted only
/// when its subtype is plain ASCII alphanumerics (so `image/svg+xml` is refused).
pub fn extension_for(media_type: &str) -> Option<String> {
    let essence = normalize_media_type(media_type);
    let known = match essence.as_str() {
        "image/jpeg" => Some("jpeg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "video/mp4" => Some("mp4"),
        "video/quicktime" => Some("mov"),
        "video/webm" => Some("webm"),
        _ => None,
    };
    if let Some(ext) = known {
        return Some(ext.to_string());
    }

    let (_, subtype) = essence.split_once('/')?;
    if !subtype.is_empty() && subtype.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(subtype.to_string())
    } else {
        None
    }
}

fn random_name() -> String {
    let mut bytes = [0u8; RANDOM_NAME_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    /// Bind to `root`, creating it if needed.
    pub async fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    #[tracing::instrument(skip(self, blob), fields(media_type = %blob.media_type, size_bytes = blob.len()))]
    pub async fn stage(
        &self,
        blob: &MediaBlob,
        naming: NamingMode<'_>,
    ) -> Result<StagedAsset, StagingError> {
        let ext = extension_for(&blob.media_type)
            .ok_or_else(|| StagingError::UnsupportedMediaType(blob.media_type.clone()))?;

        let name = match naming {
            NamingMode::Random => random_name(),
            NamingMode::CallerSupplied(name) if is_safe_name(name) => name.to_string(),
            NamingMode::CallerSupplied(name) => {
                return Err(StagingError::InvalidName(name.to_string()))
            }
        };

        let file_name = format!("{}.{}", name, ext);
        let path = self.root.join(&file_name);
        let tmp_path = self.root.join(format!(".{}.{}.part", file_name, random_name()));

        if let Err(source) = write_file(&tmp_path, &blob.data).await {
            discard_partial(&tmp_path).await;
            return Err(StagingError::Write {
                path: tmp_path,
                source,
            });
        }

        if let Err(source) = fs::rename(&tmp_path, &path).await {
            discard_partial(&tmp_path).await;
            return Err(StagingError::Write { path, source });
        }

        tracing::debug!(path = %path.display(), "Staged upload");

        Ok(StagedAsset {
            path,
            file_name,
            media_type: blob.essence(),
        })
    }
}

async fn discard_partial(tmp_path: &Path) {
    if let Err(e) = fs::remove_file(tmp_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(error = %e, path = %tmp_path.display(), "Failed to remove partial staging file");
        }
    }
}

async fn write_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    Ok(())
}
