use serde::{Deserialize, Serialize};

use crate::constants::{THUMBNAIL_FIELD, VIDEO_FIELD};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Raw upload bytes plus their declared media type.
///
/// Lives only for the duration of one upload request.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaBlob {
    pub data: Vec<u8>,
    pub media_type: String,
}

impl MediaBlob {
    pub fn new(data: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            data,
            media_type: media_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Media type without parameters, lowercased (`"image/PNG; q=1"` -> `"image/png"`).
    pub fn essence(&self) -> String {
        normalize_media_type(&self.media_type)
    }
}

// Blobs can be a gigabyte; never dump the payload into logs.
impl std::fmt::Debug for MediaBlob {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaBlob")
            .field("media_type", &self.media_type)
            .field("size_bytes", &self.data.len())
            .finish()
    }
}

/// Strip MIME parameters and lowercase.
pub fn normalize_media_type(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(media_type)
        .to_lowercase()
}

/// Which upload flow a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Thumbnail,
    Video,
}

impl UploadKind {
    /// Multipart field the upload arrives in.
    pub fn field_name(&self) -> &'static str {
        match self {
            UploadKind::Thumbnail => THUMBNAIL_FIELD,
            UploadKind::Video => VIDEO_FIELD,
        }
    }
}

impl Display for UploadKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadKind::Thumbnail => write!(f, "thumbnail"),
            UploadKind::Video => write!(f, "video"),
        }
    }
}

/// Coarse aspect-ratio class of a video, used as a remote key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectCategory {
    Landscape,
    Portrait,
    Other,
}

impl AspectCategory {
    /// Classify a frame size by its reduced ratio: 16:9 is landscape, 9:16 portrait.
    ///
    /// Degenerate sizes (a zero side) classify as `Other`.
    pub fn classify(width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return AspectCategory::Other;
        }
        let divisor = gcd(width, height);
        match (width / divisor, height / divisor) {
            (16, 9) => AspectCategory::Landscape,
            (9, 16) => AspectCategory::Portrait,
            _ => AspectCategory::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectCategory::Landscape => "landscape",
            AspectCategory::Portrait => "portrait",
            AspectCategory::Other => "other",
        }
    }
}

impl Display for AspectCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}
