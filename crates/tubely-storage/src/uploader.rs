use crate::keys::normalize_key;
use crate::traits::Storage;
use std::path::Path;
use std::sync::Arc;

/// Pushes staged local files to durable object storage.
///
/// Never surfaces a transport error: every failure is logged and reported as `false`.
/// There is no internal retry.
#[derive(Clone)]
pub struct RemoteUploader {
    storage: Arc<dyn Storage>,
}

impl RemoteUploader {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    #[tracing::instrument(skip(self, local_path), fields(path = %local_path.display()))]
    pub async fn upload(&self, local_path: &Path, remote_key: &str, media_type: &str) -> bool {
        let key = match normalize_key(remote_key) {
            Ok(key) => key,
            Err(e) => {
                tracing::error!(error = %e, "Rejected remote key");
                return false;
            }
        };

        let data = match tokio::fs::read(local_path).await {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read staged file for upload");
                return false;
            }
        };

        match self.storage.put_object(&key, data, media_type).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Remote upload failed");
                false
            }
        }
    }

    /// Best-effort removal of an object uploaded earlier that nothing will reference.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, remote_key: &str) -> bool {
        let key = match normalize_key(remote_key) {
            Ok(key) => key,
            Err(e) => {
                tracing::error!(error = %e, "Rejected remote key");
                return false;
            }
        };

        match self.storage.delete(&key).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Failed to remove orphaned object");
                false
            }
        }
    }
}
