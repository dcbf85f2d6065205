//! Local adapters for single-node deployment.

pub mod fs;
pub mod http;
pub mod memory;
pub mod redis;

pub use fs::FsStorage;
pub use memory::MemoryStore;
pub use redis::RedisPool;
