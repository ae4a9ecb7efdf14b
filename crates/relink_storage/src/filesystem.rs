//! Filesystem object store.
//!
//! Stores objects as flat files under a base directory. Useful for rehearsing
//! a migration offline and for serving the result from a static host.

use crate::{ObjectStore, StoreResult};
use relink_error::{StoreError, StoreErrorKind};
use std::path::{Path, PathBuf};

/// Filesystem storage backend.
///
/// Each object is written to `{base_path}/{key}` via a temp file and rename.
#[derive(Debug, Clone)]
pub struct FileSystemStore {
    base_path: PathBuf,
}

impl FileSystemStore {
    /// Create a new filesystem store.
    ///
    /// Creates the base directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    #[tracing::instrument(skip(base_path))]
    pub fn new(base_path: impl Into<PathBuf>) -> StoreResult<Self> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StoreError::new(StoreErrorKind::Write(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        tracing::info!(path = %base_path.display(), "Created filesystem store");
        Ok(Self { base_path })
    }

    /// Root directory of the store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of the object stored under `key`.
    ///
    /// Keys are flat names; anything that would escape the base directory is
    /// rejected.
    pub fn object_path(&self, key: &str) -> StoreResult<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(StoreError::new(StoreErrorKind::InvalidConfig(format!(
                "Invalid object key: {:?}",
                key
            ))));
        }
        Ok(self.base_path.join(key))
    }
}

#[async_trait::async_trait]
impl ObjectStore for FileSystemStore {
    #[tracing::instrument(skip(self, data), fields(size = data.len()))]
    async fn put_object(&self, key: &str, data: &[u8], content_type: &str) -> StoreResult<()> {
        let path = self.object_path(key)?;

        // Write to temp file first, then rename for atomicity
        let temp_path = self.base_path.join(format!(".{key}.tmp"));
        tokio::fs::write(&temp_path, data).await.map_err(|e| {
            StoreError::new(StoreErrorKind::Write(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        tokio::fs::rename(&temp_path, &path).await.map_err(|e| {
            StoreError::new(StoreErrorKind::Write(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
        })?;

        tracing::debug!(path = %path.display(), "Stored object");
        Ok(())
    }

    async fn head_object(&self, key: &str) -> StoreResult<bool> {
        let path = self.object_path(key)?;
        Ok(tokio::fs::try_exists(path).await.unwrap_or(false))
    }

    async fn verify_access(&self) -> StoreResult<()> {
        let metadata = tokio::fs::metadata(&self.base_path).await.map_err(|e| {
            StoreError::new(StoreErrorKind::PermissionDenied(format!(
                "{}: {}",
                self.base_path.display(),
                e
            )))
        })?;
        if metadata.permissions().readonly() {
            return Err(StoreError::new(StoreErrorKind::PermissionDenied(format!(
                "{} is read-only",
                self.base_path.display()
            ))));
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "filesystem"
    }
}
