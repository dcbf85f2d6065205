use super::encoding::{Encoding, Video};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkspaceError {
    #[error("{field} {value:?} is not a plain file name")]
    InvalidName { field: &'static str, value: String },
}

/// Temp files owned by one encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPaths {
    /// `<tmp_dir>/<encoding.id>`, removed as a whole on cleanup
    pub dir: PathBuf,
    /// Local copy of the master file
    pub input: PathBuf,
    /// Transcoder output, uploaded on success
    pub output: PathBuf,
}

/// Scratch directory shared by all encodings on this node.
///
/// Each encoding gets its own subdirectory named after its id, so two
/// encodings of the same video never touch the same file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    tmp_dir: PathBuf,
}

impl Workspace {
    pub fn new(tmp_dir: impl Into<PathBuf>) -> Self {
        Self {
            tmp_dir: tmp_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.tmp_dir
    }

    pub fn job_dir(&self, encoding: &Encoding) -> Result<PathBuf, WorkspaceError> {
        Ok(self.tmp_dir.join(plain("encoding id", &encoding.id)?))
    }

    /// The master lands under the job dir with the last segment of its storage key.
    pub fn input_path(&self, encoding: &Encoding, video: &Video) -> Result<PathBuf, WorkspaceError> {
        let name = Path::new(&video.filename)
            .file_name()
            .ok_or_else(|| WorkspaceError::InvalidName {
                field: "video filename",
                value: video.filename.clone(),
            })?;
        Ok(self.job_dir(encoding)?.join(name))
    }

    pub fn output_path(&self, encoding: &Encoding) -> Result<PathBuf, WorkspaceError> {
        Ok(self
            .job_dir(encoding)?
            .join(plain("encoding filename", &encoding.filename)?))
    }

    pub fn job(&self, encoding: &Encoding, video: &Video) -> Result<JobPaths, WorkspaceError> {
        Ok(JobPaths {
            dir: self.job_dir(encoding)?,
            input: self.input_path(encoding, video)?,
            output: self.output_path(encoding)?,
        })
    }
}

/// Accept exactly one normal path component.
fn plain<'a>(field: &'static str, name: &'a str) -> Result<&'a str, WorkspaceError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(name),
        _ => Err(WorkspaceError::InvalidName {
            field,
            value: name.to_string(),
        }),
    }
}
