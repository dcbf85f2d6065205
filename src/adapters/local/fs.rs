use crate::ports::storage::{StorageError, StoragePort};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source and destination stores backed by two local directories.
///
/// Keys are relative paths: `download` reads `<source_dir>/<key>` and
/// `upload` writes `<destination_dir>/<key>`.
#[derive(Clone, Debug)]
pub struct FsStorage {
    source_dir: PathBuf,
    destination_dir: PathBuf,
}

impl FsStorage {
    pub fn new(source_dir: impl Into<PathBuf>, destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            destination_dir: destination_dir.into(),
        }
    }

    fn resolve(root: &Path, key: &str) -> Result<PathBuf, StorageError> {
        // Prevent directory traversal
        if key.is_empty() || key.contains("..") || Path::new(key).is_absolute() {
            return Err(StorageError::NotFound(key.to_string()));
        }
        Ok(root.join(key))
    }
}

#[async_trait]
impl StoragePort for FsStorage {
    async fn download(&self, key: &str, local_path: &Path) -> Result<(), StorageError> {
        let source = Self::resolve(&self.source_dir, key)?;
        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        match tokio::fs::copy(&source, local_path).await {
            Ok(bytes) => {
                debug!(key, bytes, path = %local_path.display(), "fetched source");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn upload(&self, local_path: &Path, key: &str) -> Result<(), StorageError> {
        let destination = Self::resolve(&self.destination_dir, key)?;
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = tokio::fs::copy(local_path, &destination).await?;
        debug!(key, bytes, "stored output");
        Ok(())
    }
}
