//! Redis EncodingQueuePort implementation.

use super::error::RedisStoreError;
use super::pool::RedisPool;
use super::ENCODING_QUEUE;
use crate::ports::queue::EncodingQueuePort;
use crate::ports::repository::RepositoryError;
use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;

#[async_trait]
impl EncodingQueuePort for RedisPool {
    async fn enqueue(&self, encoding_id: &str) -> Result<(), RepositoryError> {
        let mut conn = self.conn().await?;
        conn.lpush::<_, _, ()>(ENCODING_QUEUE, encoding_id)
            .await
            .map_err(RedisStoreError::from)?;
        Ok(())
    }

    async fn dequeue(&self, timeout_secs: f64) -> Result<Option<String>, RepositoryError> {
        let mut conn = self.conn().await?;

        // BRPOP hands each id to a single client
        let result: Option<(String, String)> = conn
            .brpop(ENCODING_QUEUE, timeout_secs)
            .await
            .map_err(RedisStoreError::from)?;
        Ok(result.map(|(_, id)| id))
    }
}
