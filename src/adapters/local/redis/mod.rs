//! Redis adapter for local deployment.
//!
//! This module provides Redis-backed implementations of:
//! - `EncodingQueuePort` for handing encoding ids to workers
//! - `EncodingRepository` for encoding, video and profile records

mod error;
mod pool;
mod queue;
mod repository;

pub use error::RedisStoreError;
pub use pool::RedisPool;

/// Redis key constants
const ENCODING_QUEUE: &str = "encoder:queue";
const ENCODING_PREFIX: &str = "encoder:encoding:";
const VIDEO_PREFIX: &str = "encoder:video:";
const PROFILE_PREFIX: &str = "encoder:profile:";

fn key(prefix: &str, id: &str) -> String {
    format!("{}{}", prefix, id)
}
