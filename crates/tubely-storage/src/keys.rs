//! Remote key construction and normalisation shared by all backends.

use crate::traits::{StorageError, StorageResult};
use tubely_core::constants::UNKNOWN_ASPECT_PREFIX;
use tubely_core::models::AspectCategory;

/// Normalise a remote object key.
///
/// Leading slashes are stripped (object stores treat them as a literal key
/// character, not a root). Empty keys and keys with a `..` segment are rejected.
pub fn normalize_key(key: &str) -> StorageResult<String> {
    let trimmed = key.trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if trimmed.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(
            "Storage key contains a parent directory segment".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Remote key for a published video: `{aspect}-{file_name}`.
///
/// An undetermined aspect degrades to the `unknown` prefix.
pub fn video_object_key(category: Option<AspectCategory>, file_name: &str) -> String {
    let prefix = category
        .map(|c| c.as_str())
        .unwrap_or(UNKNOWN_ASPECT_PREFIX);
    format!("{}-{}", prefix, file_name)
}
