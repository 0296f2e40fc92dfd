//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// A client bound to one configured bucket (or directory). Keys passed in are
/// expected to be normalised with [`crate::normalize_key`]; backends reject keys
/// that are not.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` as a single object under `key`, tagged with `content_type`.
    ///
    /// `Ok(())` is the explicit success signal; anything else is a failure.
    async fn put_object(&self, key: &str, data: Vec<u8>, content_type: &str)
        -> StorageResult<()>;

    /// Delete an object by key
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
