use crate::domain::encoding::{Encoding, Profile, Video};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("repository backend error: {0}")]
    Backend(String),
    #[error("record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RepositoryError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        RepositoryError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EncodingRepository: Send + Sync {
    /// Insert or overwrite an encoding record
    async fn save_encoding(&self, encoding: &Encoding) -> Result<(), RepositoryError>;

    async fn get_encoding(&self, id: &str) -> Result<Option<Encoding>, RepositoryError>;

    async fn save_video(&self, video: &Video) -> Result<(), RepositoryError>;

    async fn get_video(&self, id: &str) -> Result<Option<Video>, RepositoryError>;

    async fn save_profile(&self, profile: &Profile) -> Result<(), RepositoryError>;

    async fn get_profile(&self, id: &str) -> Result<Option<Profile>, RepositoryError>;
}
