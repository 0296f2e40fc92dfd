//! Shared constants

/// Issuer claim carried by every access token.
pub const TOKEN_ISSUER: &str = "tubely-access";

/// Default inclusive thumbnail size cap (10 MiB).
pub const MAX_THUMBNAIL_SIZE_BYTES: usize = 10 << 20;

/// Default inclusive video size cap (1 GiB).
pub const MAX_VIDEO_SIZE_BYTES: usize = 1 << 30;

/// Multipart field carrying a thumbnail upload.
pub const THUMBNAIL_FIELD: &str = "thumbnail";

/// Multipart field carrying a video upload.
pub const VIDEO_FIELD: &str = "video";

/// Remote key prefix used when the aspect ratio of a video could not be determined.
pub const UNKNOWN_ASPECT_PREFIX: &str = "unknown";

/// Suffix inserted before the extension of a remuxed video.
pub const PROCESSED_SUFFIX: &str = "processed";
