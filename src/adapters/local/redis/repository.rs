//! Redis EncodingRepository implementation.
//!
//! Records are stored as JSON strings under namespaced keys.

use super::error::RedisStoreError;
use super::pool::RedisPool;
use super::{key, ENCODING_PREFIX, PROFILE_PREFIX, VIDEO_PREFIX};
use crate::domain::encoding::{Encoding, Profile, Video};
use crate::ports::repository::{EncodingRepository, RepositoryError};
use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;

impl RedisPool {
    async fn put<T: Serialize + Sync>(
        &self,
        prefix: &str,
        id: &str,
        record: &T,
    ) -> Result<(), RepositoryError> {
        let json = serde_json::to_string(record)?;
        let mut conn = self.conn().await?;
        conn.set::<_, _, ()>(key(prefix, id), json)
            .await
            .map_err(RedisStoreError::from)?;
        Ok(())
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        prefix: &str,
        id: &str,
    ) -> Result<Option<T>, RepositoryError> {
        let mut conn = self.conn().await?;
        let json: Option<String> = conn
            .get(key(prefix, id))
            .await
            .map_err(RedisStoreError::from)?;
        match json {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl EncodingRepository for RedisPool {
    async fn save_encoding(&self, encoding: &Encoding) -> Result<(), RepositoryError> {
        self.put(ENCODING_PREFIX, &encoding.id, encoding).await
    }

    async fn get_encoding(&self, id: &str) -> Result<Option<Encoding>, RepositoryError> {
        self.fetch(ENCODING_PREFIX, id).await
    }

    async fn save_video(&self, video: &Video) -> Result<(), RepositoryError> {
        self.put(VIDEO_PREFIX, &video.id, video).await
    }

    async fn get_video(&self, id: &str) -> Result<Option<Video>, RepositoryError> {
        self.fetch(VIDEO_PREFIX, id).await
    }

    async fn save_profile(&self, profile: &Profile) -> Result<(), RepositoryError> {
        self.put(PROFILE_PREFIX, &profile.id, profile).await
    }

    async fn get_profile(&self, id: &str) -> Result<Option<Profile>, RepositoryError> {
        self.fetch(PROFILE_PREFIX, id).await
    }
}
