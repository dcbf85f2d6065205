//! Drives a single encoding through its lifecycle and performs the side
//! effects bound to each transition.

use super::error::{EncodeFailure, ServiceError};
use crate::domain::encoding::{Encoding, Profile, Video};
use crate::domain::geometry::{self, Dimensions, GeometryMode};
use crate::domain::recipe::RecipeOptions;
use crate::domain::state::Event;
use crate::domain::workspace::{JobPaths, Workspace};
use crate::ports::queue::EncodingQueuePort;
use crate::ports::repository::{EncodingRepository, RepositoryError};
use crate::ports::storage::{StorageError, StoragePort};
use crate::ports::transcoder::Transcoder;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};

pub struct EncodingService<R, Q, S, T> {
    repo: R,
    queue: Q,
    storage: S,
    transcoder: T,
    workspace: Workspace,
    geometry: GeometryMode,
}

impl<R, Q, S, T> EncodingService<R, Q, S, T>
where
    R: EncodingRepository,
    Q: EncodingQueuePort,
    S: StoragePort,
    T: Transcoder,
{
    pub fn new(
        repo: R,
        queue: Q,
        storage: S,
        transcoder: T,
        workspace: Workspace,
        geometry: GeometryMode,
    ) -> Self {
        Self {
            repo,
            queue,
            storage,
            transcoder,
            workspace,
            geometry,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    /// Create a `queued` encoding of a stored video and profile and put it on the queue.
    pub async fn submit(&self, video_id: &str, profile_id: &str) -> Result<Encoding, ServiceError> {
        let video = self.load_video(video_id).await?;
        let profile = self.load_profile(profile_id).await?;

        let encoding = Encoding::new(&video, &profile);
        self.repo.save_encoding(&encoding).await?;
        self.queue.enqueue(&encoding.id).await?;

        info!(
            encoding_id = %encoding.id,
            video_id = %video.id,
            profile = %profile.title,
            "encoding queued"
        );
        Ok(encoding)
    }

    pub async fn load_encoding(&self, id: &str) -> Result<Encoding, ServiceError> {
        self.repo
            .get_encoding(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("encoding", id).into())
    }

    /// `queued -> assigned`. The source is fetched before anything is
    /// persisted, so a failed fetch leaves the encoding claimable.
    pub async fn claim(&self, encoding: &mut Encoding) -> Result<(), ServiceError> {
        let transition = encoding.status.on(Event::Claim)?;
        let video = self.load_video(&encoding.video_id).await?;
        let paths = self.workspace.job(encoding, &video)?;

        if let Err(source) = self.fetch(&video, &paths).await {
            warn!(
                encoding_id = %encoding.id,
                key = %video.filename,
                error = %source,
                "source fetch failed, encoding stays queued"
            );
            remove_job_dir(&encoding.id, &paths.dir).await;
            return Err(ServiceError::Fetch {
                key: video.filename,
                source,
            });
        }

        let previous = encoding.clone();
        encoding.status = transition.to;
        encoding.touch();
        self.commit(encoding, previous).await?;

        info!(encoding_id = %encoding.id, "encoding assigned");
        Ok(())
    }

    /// `queued | assigned -> encoding`, then settle with `success` or `fail`.
    ///
    /// Once the `encoding` state is committed every failure of the attempt,
    /// upload included, settles as `fail`. The job dir is removed afterwards,
    /// whichever way it went. An `Err` after that point means the settled
    /// state itself could not be stored.
    pub async fn encode(&self, encoding: &mut Encoding) -> Result<(), ServiceError> {
        let transition = encoding.status.on(Event::Encode)?;
        let video = self.load_video(&encoding.video_id).await?;
        let paths = self.workspace.job(encoding, &video)?;

        if !tokio::fs::try_exists(&paths.input).await.unwrap_or(false) {
            warn!(
                encoding_id = %encoding.id,
                path = %paths.input.display(),
                "master file missing from workspace"
            );
        }

        let previous = encoding.clone();
        encoding.status = transition.to;
        encoding.started_encoding_at = Some(Utc::now().max(encoding.queued_at));
        encoding.error_message = None;
        encoding.touch();
        self.commit(encoding, previous).await?;
        info!(encoding_id = %encoding.id, "encoding started");

        let settled = self.settle(encoding, &video, &paths).await;
        if let Err(e) = &settled {
            error!(encoding_id = %encoding.id, error = %e, "could not store settled encoding");
        }

        remove_job_dir(&encoding.id, &paths.dir).await;
        settled
    }

    /// `encoding -> success`, after the output has been uploaded.
    ///
    /// A failed upload changes nothing and leaves the output in place, so the
    /// call can be repeated.
    pub async fn success(&self, encoding: &mut Encoding) -> Result<(), ServiceError> {
        encoding.status.on(Event::Success)?;

        let output = self.workspace.output_path(encoding)?;
        if let Err(source) = self.upload(encoding, &output).await {
            warn!(encoding_id = %encoding.id, error = %source, "upload failed");
            return Err(ServiceError::Upload {
                key: encoding.filename.clone(),
                source,
            });
        }
        self.commit_success(encoding).await
    }

    /// `encoding -> error`, recording `reason`.
    pub async fn fail(&self, encoding: &mut Encoding, reason: &str) -> Result<(), ServiceError> {
        let transition = encoding.status.on(Event::Fail)?;

        let previous = encoding.clone();
        encoding.status = transition.to;
        encoding.error_message = Some(reason.to_string());
        encoding.touch();
        self.commit(encoding, previous).await?;

        info!(encoding_id = %encoding.id, reason, "encoding failed");
        Ok(())
    }

    async fn settle(
        &self,
        encoding: &mut Encoding,
        video: &Video,
        paths: &JobPaths,
    ) -> Result<(), ServiceError> {
        let attempt = match self.encode_video(encoding, video, paths).await {
            Ok(()) => self
                .upload(encoding, &paths.output)
                .await
                .map_err(|source| EncodeFailure::Upload {
                    key: encoding.filename.clone(),
                    source,
                }),
            Err(failure) => Err(failure),
        };

        match attempt {
            Ok(()) => self.commit_success(encoding).await,
            Err(failure) => {
                warn!(encoding_id = %encoding.id, error = %failure, "encode attempt failed");
                self.fail(encoding, &failure.to_string()).await
            }
        }
    }

    async fn encode_video(
        &self,
        encoding: &mut Encoding,
        video: &Video,
        paths: &JobPaths,
    ) -> Result<(), EncodeFailure> {
        let dims = Dimensions::new(video.width, video.height, encoding.width, encoding.height);
        let plan = geometry::plan(self.geometry, dims);

        if let Some(width) = plan.width_override {
            debug!(encoding_id = %encoding.id, from = encoding.width, to = width, "narrowing output width");
            encoding.width = width;
            encoding.touch();
            self.repo
                .save_encoding(encoding)
                .await
                .map_err(EncodeFailure::Persist)?;
        }

        tokio::fs::create_dir_all(&paths.dir)
            .await
            .map_err(EncodeFailure::Workspace)?;

        let options = RecipeOptions {
            input_file: paths.input.clone(),
            output_file: paths.output.clone(),
            geometry: plan.options,
        };

        let started = Instant::now();
        self.transcoder.transcode(&encoding.command, &options).await?;

        encoding.encoding_time = Some(started.elapsed().as_secs());
        encoding.encoded_at = Some(Utc::now());
        encoding.touch();
        self.repo
            .save_encoding(encoding)
            .await
            .map_err(EncodeFailure::Persist)?;
        Ok(())
    }

    async fn fetch(&self, video: &Video, paths: &JobPaths) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&paths.dir).await?;
        self.storage.download(&video.filename, &paths.input).await
    }

    async fn upload(&self, encoding: &Encoding, output: &Path) -> Result<(), StorageError> {
        self.storage.upload(output, &encoding.filename).await
    }

    async fn commit_success(&self, encoding: &mut Encoding) -> Result<(), ServiceError> {
        let transition = encoding.status.on(Event::Success)?;

        let previous = encoding.clone();
        encoding.status = transition.to;
        encoding.error_message = None;
        encoding.touch();
        self.commit(encoding, previous).await?;

        info!(
            encoding_id = %encoding.id,
            encoding_time = ?encoding.encoding_time,
            "encoding succeeded"
        );
        Ok(())
    }

    /// Persist `encoding`, rolling it back to `previous` if the store refuses.
    async fn commit(&self, encoding: &mut Encoding, previous: Encoding) -> Result<(), ServiceError> {
        if let Err(e) = self.repo.save_encoding(encoding).await {
            *encoding = previous;
            return Err(e.into());
        }
        Ok(())
    }

    async fn load_video(&self, id: &str) -> Result<Video, ServiceError> {
        self.repo
            .get_video(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("video", id).into())
    }

    async fn load_profile(&self, id: &str) -> Result<Profile, ServiceError> {
        self.repo
            .get_profile(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("profile", id).into())
    }
}

async fn remove_job_dir(encoding_id: &str, dir: &Path) {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => debug!(encoding_id, path = %dir.display(), "removed temp files"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(encoding_id, path = %dir.display(), error = %e, "failed to remove temp files"),
    }
}
