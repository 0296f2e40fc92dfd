//! Tubely Storage Library
//!
//! Durable object storage for published media: the `Storage` trait with S3 and
//! local-directory backends, remote key normalisation, public URL derivation and
//! the `RemoteUploader` used by the upload pipeline.
//!
//! # Key format
//!
//! Video objects are stored flat at the bucket root as `{aspect}-{file_name}`,
//! e.g. `landscape-3q2-Xo9v.mp4`. Keys never start with `/` and never contain a
//! `..` segment; `keys::normalize_key` enforces both for every backend.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;
pub mod uploader;
pub mod url;

// Re-export commonly used types
pub use factory::{create_storage, create_url_builder};
pub use keys::{normalize_key, video_object_key};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
pub use tubely_core::StorageBackend;
pub use uploader::RemoteUploader;
pub use url::ObjectUrlBuilder;
