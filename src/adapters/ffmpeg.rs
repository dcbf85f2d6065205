//! Transcoder adapter that runs the rendered recipe as a child process.

use crate::domain::recipe::{RecipeError, RecipeOptions};
use crate::ports::transcoder::{TranscodeError, Transcoder};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Keep only the tail of stderr in error messages.
const STDERR_TAIL: usize = 2048;

#[derive(Clone, Debug, Default)]
pub struct FfmpegTranscoder {
    timeout: Option<Duration>,
}

impl FfmpegTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill the child and fail the attempt once `timeout` elapses.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

fn tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim_end();
    match text.char_indices().rev().nth(STDERR_TAIL - 1) {
        Some((start, _)) => text[start..].to_string(),
        None => text.to_string(),
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(
        &self,
        command: &str,
        options: &RecipeOptions,
    ) -> Result<(), TranscodeError> {
        let args = options.render(command)?;

        if !tokio::fs::try_exists(&options.input_file)
            .await
            .unwrap_or(false)
        {
            return Err(TranscodeError::MissingInput(options.input_file.clone()));
        }

        let (program, rest) = args
            .split_first()
            .ok_or(TranscodeError::Recipe(RecipeError::Empty))?;
        debug!(program = %program, args = ?rest, "spawning transcoder");

        let child = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TranscodeError::Spawn {
                program: program.clone(),
                source,
            })?;

        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(output) => output,
                Err(_) => {
                    // Dropping the future drops the child, which kills it
                    warn!(?limit, "transcoder timed out, killing process");
                    return Err(TranscodeError::Timeout(limit));
                }
            },
            None => child.wait_with_output().await,
        }
        .map_err(|source| TranscodeError::Spawn {
            program: program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(TranscodeError::Failed {
                code: output.status.code(),
                stderr: tail(&output.stderr),
            });
        }
        Ok(())
    }
}
