use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StoragePort: Send + Sync {
    /// Fetch `key` from the source store into `local_path`
    async fn download(&self, key: &str, local_path: &Path) -> Result<(), StorageError>;

    /// Push `local_path` to the destination store under `key`
    async fn upload(&self, local_path: &Path, key: &str) -> Result<(), StorageError>;
}
