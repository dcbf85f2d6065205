//! In-process store for tests and single-node runs without Redis.

use crate::domain::encoding::{Encoding, Profile, Video};
use crate::ports::queue::EncodingQueuePort;
use crate::ports::repository::{EncodingRepository, RepositoryError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

#[derive(Default)]
struct Tables {
    encodings: HashMap<String, Encoding>,
    videos: HashMap<String, Video>,
    profiles: HashMap<String, Profile>,
}

/// Cloneable handle; clones share the same tables and queue.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    queue: Arc<Mutex<VecDeque<String>>>,
    pending: Arc<Notify>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn queue_len(&self) -> usize {
        self.queue.lock().await.len()
    }
}

#[async_trait]
impl EncodingRepository for MemoryStore {
    async fn save_encoding(&self, encoding: &Encoding) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        tables
            .encodings
            .insert(encoding.id.clone(), encoding.clone());
        Ok(())
    }

    async fn get_encoding(&self, id: &str) -> Result<Option<Encoding>, RepositoryError> {
        Ok(self.tables.lock().await.encodings.get(id).cloned())
    }

    async fn save_video(&self, video: &Video) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        tables.videos.insert(video.id.clone(), video.clone());
        Ok(())
    }

    async fn get_video(&self, id: &str) -> Result<Option<Video>, RepositoryError> {
        Ok(self.tables.lock().await.videos.get(id).cloned())
    }

    async fn save_profile(&self, profile: &Profile) -> Result<(), RepositoryError> {
        let mut tables = self.tables.lock().await;
        tables.profiles.insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn get_profile(&self, id: &str) -> Result<Option<Profile>, RepositoryError> {
        Ok(self.tables.lock().await.profiles.get(id).cloned())
    }
}

#[async_trait]
impl EncodingQueuePort for MemoryStore {
    async fn enqueue(&self, encoding_id: &str) -> Result<(), RepositoryError> {
        self.queue.lock().await.push_back(encoding_id.to_string());
        self.pending.notify_one();
        Ok(())
    }

    async fn dequeue(&self, timeout_secs: f64) -> Result<Option<String>, RepositoryError> {
        if let Some(id) = self.queue.lock().await.pop_front() {
            return Ok(Some(id));
        }

        let notified = self.pending.notified();
        if timeout_secs > 0.0 {
            // Elapsed just means nothing arrived in time
            let _ = tokio::time::timeout(Duration::from_secs_f64(timeout_secs), notified).await;
        } else {
            notified.await;
        }
        Ok(self.queue.lock().await.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::encoding::fixtures::{profile, video};

    #[tokio::test]
    async fn test_records_round_trip() {
        let store = MemoryStore::new();
        let video = video(1920, 1080);
        let profile = profile(640, 480);
        let encoding = Encoding::new(&video, &profile);

        store.save_video(&video).await.unwrap();
        store.save_profile(&profile).await.unwrap();
        store.save_encoding(&encoding).await.unwrap();

        assert_eq!(store.get_video("video-1").await.unwrap(), Some(video));
        assert_eq!(store.get_profile("profile-1").await.unwrap(), Some(profile));
        assert_eq!(
            store.get_encoding(&encoding.id).await.unwrap(),
            Some(encoding)
        );
        assert_eq!(store.get_encoding("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_queue_is_fifo_and_each_id_is_handed_out_once() {
        let store = MemoryStore::new();
        store.enqueue("a").await.unwrap();
        store.enqueue("b").await.unwrap();

        let other = store.clone();
        assert_eq!(store.dequeue(0.01).await.unwrap().as_deref(), Some("a"));
        assert_eq!(other.dequeue(0.01).await.unwrap().as_deref(), Some("b"));
        assert_eq!(store.dequeue(0.01).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_dequeue_wakes_on_enqueue() {
        let store = MemoryStore::new();
        let consumer = store.clone();
        let handle = tokio::spawn(async move { consumer.dequeue(5.0).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        store.enqueue("late").await.unwrap();

        let id = handle.await.unwrap().unwrap();
        assert_eq!(id.as_deref(), Some("late"));
    }
}
