//! Application layer - Generic services that use ports.

pub mod encoder;
pub mod error;
pub mod worker;

pub use encoder::EncodingService;
pub use error::{EncodeFailure, ServiceError};
pub use worker::WorkerService;
