use crate::ports::repository::RepositoryError;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EncodingQueuePort: Send + Sync {
    /// Push an encoding id onto the pending queue
    async fn enqueue(&self, encoding_id: &str) -> Result<(), RepositoryError>;

    /// Pop the oldest pending id, handing it to exactly one caller.
    /// timeout_secs: 0.0 for infinite (or long poll), >0.0 for specific timeout
    async fn dequeue(&self, timeout_secs: f64) -> Result<Option<String>, RepositoryError>;
}
