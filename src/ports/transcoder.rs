use crate::domain::recipe::{RecipeError, RecipeOptions};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("invalid recipe: {0}")]
    Recipe(#[from] RecipeError),
    #[error("input file missing: {0}")]
    MissingInput(PathBuf),
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("transcoder exited with status {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },
    #[error("transcoder timed out after {0:?}")]
    Timeout(Duration),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Run `command` rendered against `options`. Returns once the output file is written.
    async fn transcode(&self, command: &str, options: &RecipeOptions)
        -> Result<(), TranscodeError>;
}
