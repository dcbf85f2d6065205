use crate::domain::state::TransitionError;
use crate::domain::workspace::WorkspaceError;
use crate::ports::repository::RepositoryError;
use crate::ports::storage::StorageError;
use crate::ports::transcoder::TranscodeError;
use thiserror::Error;

/// Why an encode attempt settled as `fail`.
#[derive(Debug, Error)]
pub enum EncodeFailure {
    #[error("could not prepare workspace: {0}")]
    Workspace(#[source] std::io::Error),
    #[error("could not persist encode results: {0}")]
    Persist(#[source] RepositoryError),
    #[error("transcode failed: {0}")]
    Transcode(#[from] TranscodeError),
    /// The output was produced but could not be stored.
    #[error("upload of {key} failed: {source}")]
    Upload {
        key: String,
        #[source]
        source: StorageError,
    },
}

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The source video could not be fetched. The encoding is left `queued`.
    #[error("fetching source {key} failed: {source}")]
    Fetch {
        key: String,
        #[source]
        source: StorageError,
    },
    /// Output could not be stored. The encoding keeps its state and its output.
    #[error("uploading {key} failed: {source}")]
    Upload {
        key: String,
        #[source]
        source: StorageError,
    },
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    /// The same call can succeed later without any change to the record.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Fetch { .. } | ServiceError::Upload { .. })
    }
}
