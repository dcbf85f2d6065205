//! Encoding Worker - Video Transcoding Job Library
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (state machine, geometry, recipes)
//! - ports/: Trait definitions
//! - adapters/: Concrete implementations (filesystem, Redis, in-memory, ffmpeg, HTTP)
//! - application/: Generic services
//! - config: Environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports for convenience
pub use application::{EncodingService, ServiceError, WorkerService};
pub use config::WorkerConfig;
pub use domain::encoding::{Encoding, Profile, Video};
pub use domain::state::EncodingStatus;
