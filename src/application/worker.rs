use super::encoder::EncodingService;
use super::error::ServiceError;
use crate::domain::state::EncodingStatus;
use crate::ports::queue::EncodingQueuePort;
use crate::ports::repository::EncodingRepository;
use crate::ports::storage::StoragePort;
use crate::ports::transcoder::Transcoder;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Pulls encoding ids off the queue and runs each one through claim and encode.
pub struct WorkerService<R, Q, S, T> {
    encoder: Arc<EncodingService<R, Q, S, T>>,
    dequeue_timeout_secs: f64,
    retry_delay: Duration,
}

impl<R, Q, S, T> WorkerService<R, Q, S, T>
where
    R: EncodingRepository + 'static,
    Q: EncodingQueuePort + 'static,
    S: StoragePort + 'static,
    T: Transcoder + 'static,
{
    pub fn new(encoder: Arc<EncodingService<R, Q, S, T>>, dequeue_timeout_secs: f64) -> Self {
        Self {
            encoder,
            dequeue_timeout_secs,
            retry_delay: Duration::from_secs(1),
        }
    }

    /// Pause after a queue error or a failed fetch.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub async fn run_worker_loop(&self, worker_id: usize) {
        info!(worker_id, "worker started");
        loop {
            match self.encoder.queue().dequeue(self.dequeue_timeout_secs).await {
                Ok(Some(id)) => {
                    if let Err(e) = self.process(&id).await {
                        error!(worker_id, encoding_id = %id, error = %e, "encoding job failed");
                        if e.is_retryable() {
                            tokio::time::sleep(self.retry_delay).await;
                        }
                    }
                }
                Ok(None) => continue,
                Err(e) => {
                    error!(worker_id, error = %e, "queue error");
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    /// Run one encoding to a settled state.
    ///
    /// A failed fetch puts the id back on the queue. Ids whose encoding is
    /// already running or settled are dropped.
    pub async fn process(&self, id: &str) -> Result<(), ServiceError> {
        let mut encoding = self.encoder.load_encoding(id).await?;

        match encoding.status {
            EncodingStatus::Queued => {
                if let Err(e) = self.encoder.claim(&mut encoding).await {
                    if e.is_retryable() {
                        self.encoder.queue().enqueue(id).await?;
                        info!(encoding_id = %id, "encoding requeued");
                    }
                    return Err(e);
                }
            }
            EncodingStatus::Assigned => {}
            status => {
                warn!(encoding_id = %id, %status, "skipping encoding that is not pending");
                return Ok(());
            }
        }

        self.encoder.encode(&mut encoding).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::local::memory::MemoryStore;
    use crate::domain::encoding::fixtures::{profile, video};
    use crate::domain::geometry::GeometryMode;
    use crate::domain::workspace::Workspace;
    use crate::ports::storage::{MockStoragePort, StorageError};
    use crate::ports::transcoder::MockTranscoder;
    use tempfile::{tempdir, TempDir};

    type Worker = WorkerService<MemoryStore, MemoryStore, MockStoragePort, MockTranscoder>;

    async fn worker(storage: MockStoragePort, transcoder: MockTranscoder) -> (Worker, MemoryStore, TempDir) {
        let store = MemoryStore::new();
        store.save_video(&video(1920, 1080)).await.unwrap();
        store.save_profile(&profile(640, 480)).await.unwrap();

        let dir = tempdir().unwrap();
        let encoder = Arc::new(EncodingService::new(
            store.clone(),
            store.clone(),
            storage,
            transcoder,
            Workspace::new(dir.path()),
            GeometryMode::NoCrop,
        ));
        let worker = WorkerService::new(encoder, 0.01).with_retry_delay(Duration::ZERO);
        (worker, store, dir)
    }

    #[tokio::test]
    async fn test_process_runs_claim_and_encode() {
        let mut storage = MockStoragePort::new();
        storage.expect_download().times(1).returning(|_, path| {
            std::fs::write(path, b"master").unwrap();
            Ok(())
        });
        storage.expect_upload().times(1).returning(|_, _| Ok(()));
        let mut transcoder = MockTranscoder::new();
        transcoder.expect_transcode().times(1).returning(|_, options| {
            std::fs::write(&options.output_file, b"encoded").unwrap();
            Ok(())
        });

        let (worker, store, dir) = worker(storage, transcoder).await;
        let encoding = worker.encoder.submit("video-1", "profile-1").await.unwrap();
        let id = store.dequeue(0.01).await.unwrap().unwrap();

        worker.process(&id).await.unwrap();

        let stored = store.get_encoding(&encoding.id).await.unwrap().unwrap();
        assert_eq!(stored.status, EncodingStatus::Success);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_requeues() {
        let mut storage = MockStoragePort::new();
        storage
            .expect_download()
            .times(1)
            .returning(|key, _| Err(StorageError::NotFound(key.to_string())));
        let mut transcoder = MockTranscoder::new();
        transcoder.expect_transcode().never();

        let (worker, store, _dir) = worker(storage, transcoder).await;
        let encoding = worker.encoder.submit("video-1", "profile-1").await.unwrap();
        let id = store.dequeue(0.01).await.unwrap().unwrap();

        let err = worker.process(&id).await.unwrap_err();

        assert!(matches!(err, ServiceError::Fetch { .. }));
        assert_eq!(store.queue_len().await, 1);
        let stored = store.get_encoding(&encoding.id).await.unwrap().unwrap();
        assert_eq!(stored.status, EncodingStatus::Queued);
    }

    #[tokio::test]
    async fn test_settled_encodings_are_skipped() {
        let mut storage = MockStoragePort::new();
        storage.expect_download().never();
        let mut transcoder = MockTranscoder::new();
        transcoder.expect_transcode().never();

        let (worker, store, _dir) = worker(storage, transcoder).await;
        let mut encoding = worker.encoder.submit("video-1", "profile-1").await.unwrap();
        encoding.status = EncodingStatus::Error;
        store.save_encoding(&encoding).await.unwrap();

        worker.process(&encoding.id).await.unwrap();
        assert_eq!(
            store.get_encoding(&encoding.id).await.unwrap().unwrap().status,
            EncodingStatus::Error
        );
    }

    #[tokio::test]
    async fn test_unknown_id_is_repository_error() {
        let (worker, _store, _dir) = worker(MockStoragePort::new(), MockTranscoder::new()).await;
        let err = worker.process("missing").await.unwrap_err();
        assert!(matches!(err, ServiceError::Repository(_)));
    }
}
