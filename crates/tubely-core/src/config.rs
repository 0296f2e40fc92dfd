//! Configuration module
//!
//! Settings are read once at startup from the process environment (after an
//! optional `.env` file) and shared read-only afterwards.

use std::env;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use crate::constants::{MAX_THUMBNAIL_SIZE_BYTES, MAX_VIDEO_SIZE_BYTES};
use crate::storage_types::StorageBackend;

const DEFAULT_PORT: u16 = 8091;
const DEFAULT_DATABASE_URL: &str = "sqlite://tubely.db?mode=rwc";
const DEFAULT_ASSETS_ROOT: &str = "./assets";
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 300;
const MIN_JWT_SECRET_LEN: usize = 32;

/// Where thumbnails end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailSinkKind {
    /// Process-wide keyed map, served back by the API.
    Memory,
    /// File under the assets root, served as a static asset.
    Disk,
    /// Base64 data URL stored in the record itself.
    Inline,
}

impl FromStr for ThumbnailSinkKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(ThumbnailSinkKind::Memory),
            "disk" => Ok(ThumbnailSinkKind::Disk),
            "inline" => Ok(ThumbnailSinkKind::Inline),
            other => Err(anyhow::anyhow!(
                "Invalid THUMBNAIL_SINK '{}': expected memory, disk or inline",
                other
            )),
        }
    }
}

/// File naming for on-disk thumbnails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailNaming {
    Random,
    VideoId,
}

impl FromStr for ThumbnailNaming {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "random" => Ok(ThumbnailNaming::Random),
            "video_id" | "video-id" => Ok(ThumbnailNaming::VideoId),
            other => Err(anyhow::anyhow!(
                "Invalid THUMBNAIL_FILE_NAMING '{}': expected random or video_id",
                other
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub jwt_secret: String,
    pub database_url: String,
    pub assets_root: PathBuf,
    /// Scratch directory for staged videos; kept apart from the served assets.
    pub scratch_root: PathBuf,
    pub public_base_url: String,
    pub max_thumbnail_size_bytes: usize,
    pub thumbnail_allowed_content_types: Vec<String>,
    pub max_video_size_bytes: usize,
    pub video_allowed_content_types: Vec<String>,
    pub thumbnail_sink: ThumbnailSinkKind,
    pub thumbnail_naming: ThumbnailNaming,
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub cdn_distribution: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub external_tool_timeout_secs: u64,
    pub log_json: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source. `from_env` uses the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let server_port: u16 = var("PORT")
            .unwrap_or_else(|| DEFAULT_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let public_base_url = var("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", server_port))
            .trim_end_matches('/')
            .to_string();

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(s) => s.parse::<StorageBackend>()?,
            None => StorageBackend::S3,
        };

        let thumbnail_sink = match var("THUMBNAIL_SINK") {
            Some(s) => s.parse()?,
            None => ThumbnailSinkKind::Disk,
        };

        let thumbnail_naming = match var("THUMBNAIL_FILE_NAMING") {
            Some(s) => s.parse()?,
            None => ThumbnailNaming::Random,
        };

        let config = Config {
            server_port,
            environment,
            jwt_secret: var("JWT_SECRET")
                .ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            assets_root: PathBuf::from(
                var("ASSETS_ROOT").unwrap_or_else(|| DEFAULT_ASSETS_ROOT.to_string()),
            ),
            scratch_root: var("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| env::temp_dir().join("tubely")),
            public_base_url,
            max_thumbnail_size_bytes: var("MAX_THUMBNAIL_SIZE_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_THUMBNAIL_SIZE_BYTES),
            thumbnail_allowed_content_types: split_list(
                var("THUMBNAIL_ALLOWED_CONTENT_TYPES")
                    .unwrap_or_else(|| "image/jpeg,image/png".to_string()),
            ),
            max_video_size_bytes: var("MAX_VIDEO_SIZE_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_VIDEO_SIZE_BYTES),
            video_allowed_content_types: split_list(
                var("VIDEO_ALLOWED_CONTENT_TYPES").unwrap_or_else(|| "video/mp4".to_string()),
            ),
            thumbnail_sink,
            thumbnail_naming,
            storage_backend,
            s3_bucket: var("S3_BUCKET"),
            s3_region: var("S3_REGION").or_else(|| var("AWS_REGION")),
            s3_endpoint: var("S3_ENDPOINT"),
            cdn_distribution: var("CDN_DISTRIBUTION"),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: var("LOCAL_STORAGE_BASE_URL"),
            ffmpeg_path: var("FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".to_string()),
            ffprobe_path: var("FFPROBE_PATH").unwrap_or_else(|| "ffprobe".to_string()),
            external_tool_timeout_secs: var("EXTERNAL_TOOL_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TOOL_TIMEOUT_SECS),
            log_json: var("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least {} characters",
                MIN_JWT_SECRET_LEN
            ));
        }
        if self.max_thumbnail_size_bytes == 0 || self.max_video_size_bytes == 0 {
            return Err(anyhow::anyhow!("Upload size limits must be greater than zero"));
        }
        if self.thumbnail_allowed_content_types.is_empty()
            || self.video_allowed_content_types.is_empty()
        {
            return Err(anyhow::anyhow!("Allowed content type lists must not be empty"));
        }
        let scratch = lexical_absolute(&self.scratch_root)?;
        let assets = lexical_absolute(&self.assets_root)?;
        if scratch.starts_with(&assets) || assets.starts_with(&scratch) {
            return Err(anyhow::anyhow!(
                "SCRATCH_DIR and ASSETS_ROOT must not overlap so staged uploads are never served"
            ));
        }
        if self.external_tool_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "EXTERNAL_TOOL_TIMEOUT_SECS must be greater than zero"
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!("S3_BUCKET must be set when STORAGE_BACKEND=s3"));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when STORAGE_BACKEND=s3"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() || self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL must be set when STORAGE_BACKEND=local"
                    ));
                }
            }
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// `DATABASE_URL=memory` selects the in-process record store.
    pub fn uses_in_memory_database(&self) -> bool {
        self.database_url.eq_ignore_ascii_case("memory")
    }

    pub fn tool_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.external_tool_timeout_secs)
    }
}

fn split_list(raw: String) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Absolute form of `path` with `.` and `..` resolved without touching the filesystem.
fn lexical_absolute(path: &Path) -> std::io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };

    let mut resolved = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn load(vars: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("S3_BUCKET", "tubely-media"),
            ("AWS_REGION", "us-east-2"),
        ])
        .unwrap();

        assert_eq!(config.server_port, 8091);
        assert_eq!(config.public_base_url, "http://localhost:8091");
        assert_eq!(config.max_thumbnail_size_bytes, 10 << 20);
        assert_eq!(config.max_video_size_bytes, 1 << 30);
        assert_eq!(
            config.thumbnail_allowed_content_types,
            vec!["image/jpeg", "image/png"]
        );
        assert_eq!(config.video_allowed_content_types, vec!["video/mp4"]);
        assert_eq!(config.thumbnail_sink, ThumbnailSinkKind::Disk);
        assert_eq!(config.thumbnail_naming, ThumbnailNaming::Random);
        assert_eq!(config.s3_region.as_deref(), Some("us-east-2"));
        assert!(config.cdn_distribution.is_none());
        assert!(!config.is_production());
        assert!(!config.log_json);
        assert!(config.scratch_root.ends_with("tubely"));
    }

    #[test]
    fn scratch_dir_must_not_be_served() {
        let err = load(&[
            ("JWT_SECRET", SECRET),
            ("S3_BUCKET", "b"),
            ("S3_REGION", "r"),
            ("ASSETS_ROOT", "/srv/assets"),
            ("SCRATCH_DIR", "/srv/assets"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("SCRATCH_DIR"));
    }

    #[test]
    fn overlapping_scratch_and_assets_are_rejected() {
        for (assets, scratch) in [
            ("./assets", "./assets/tmp"),
            ("assets", "./assets"),
            ("/srv/assets", "/srv/assets/../assets/"),
            ("/srv/tubely/assets", "/srv/tubely"),
        ] {
            let err = load(&[
                ("JWT_SECRET", SECRET),
                ("S3_BUCKET", "b"),
                ("S3_REGION", "r"),
                ("ASSETS_ROOT", assets),
                ("SCRATCH_DIR", scratch),
            ])
            .unwrap_err();
            assert!(err.to_string().contains("SCRATCH_DIR"), "{assets} vs {scratch}");
        }
    }

    #[test]
    fn sibling_scratch_dir_is_accepted() {
        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("S3_BUCKET", "b"),
            ("S3_REGION", "r"),
            ("ASSETS_ROOT", "./assets"),
            ("SCRATCH_DIR", "./assets-scratch"),
        ])
        .unwrap();
        assert_eq!(config.scratch_root, PathBuf::from("./assets-scratch"));
    }

    #[test]
    fn missing_secret_is_rejected() {
        let err = load(&[("S3_BUCKET", "b"), ("S3_REGION", "r")]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn short_secret_is_rejected() {
        let err = load(&[
            ("JWT_SECRET", "short"),
            ("S3_BUCKET", "b"),
            ("S3_REGION", "r"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("at least"));
    }

    #[test]
    fn s3_backend_requires_bucket() {
        let err = load(&[("JWT_SECRET", SECRET), ("S3_REGION", "r")]).unwrap_err();
        assert!(err.to_string().contains("S3_BUCKET"));
    }

    #[test]
    fn local_backend_and_sink_selection() {
        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/tmp/tubely"),
            ("LOCAL_STORAGE_BASE_URL", "http://localhost:8091/media"),
            ("THUMBNAIL_SINK", "memory"),
            ("THUMBNAIL_FILE_NAMING", "video_id"),
            ("PUBLIC_BASE_URL", "https://tubely.example.com/"),
            ("ENVIRONMENT", "prod"),
        ])
        .unwrap();

        assert_eq!(config.storage_backend, StorageBackend::Local);
        assert_eq!(config.thumbnail_sink, ThumbnailSinkKind::Memory);
        assert_eq!(config.thumbnail_naming, ThumbnailNaming::VideoId);
        assert_eq!(config.public_base_url, "https://tubely.example.com");
        assert!(config.is_production());
    }

    #[test]
    fn unknown_sink_is_rejected() {
        let err = load(&[
            ("JWT_SECRET", SECRET),
            ("S3_BUCKET", "b"),
            ("S3_REGION", "r"),
            ("THUMBNAIL_SINK", "ftp"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("THUMBNAIL_SINK"));
    }

    #[test]
    fn memory_database_url() {
        let config = load(&[
            ("JWT_SECRET", SECRET),
            ("S3_BUCKET", "b"),
            ("S3_REGION", "r"),
            ("DATABASE_URL", "memory"),
        ])
        .unwrap();
        assert!(config.uses_in_memory_database());
    }
}
