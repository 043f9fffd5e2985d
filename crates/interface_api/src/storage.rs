//! Local-disk object storage
//!
//! Writes uploads under `<root>/<folder>/<uuid>-<filename>` and returns the
//! matching URL under the configured public base URL. Serving the directory
//! is left to the reverse proxy.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::PortError;
use domain_warranty::{ObjectStorage, UploadFolder};

#[derive(Debug, Clone)]
pub struct LocalDiskStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ObjectStorage for LocalDiskStorage {
    /// `filename` must already be sanitized
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(
        &self,
        folder: UploadFolder,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<String, PortError> {
        let object = format!("{}-{}", Uuid::new_v4().simple(), filename);
        let dir = self.root.join(folder.as_str());

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| PortError::internal(format!("create {}: {}", dir.display(), e)))?;
        let path = dir.join(&object);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| PortError::internal(format!("write {}: {}", path.display(), e)))?;

        debug!(path = %path.display(), "upload stored");
        Ok(format!("{}/{}/{}", self.base_url, folder, object))
    }
}
