//! Configuration for the encoding worker.

use crate::domain::geometry::GeometryMode;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid value {value:?} for {key}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WorkerConfig {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Redis connection URL
    pub redis_url: String,
    /// Where source videos are fetched from
    pub source_dir: PathBuf,
    /// Where finished encodings are uploaded to
    pub destination_dir: PathBuf,
    /// Scratch space for master copies and transcoder output
    pub tmp_dir: PathBuf,
    /// Number of concurrent worker loops
    pub workers: usize,
    pub geometry: GeometryMode,
    /// Blocking pop timeout; 0 waits forever
    pub dequeue_timeout_secs: f64,
    /// Kill the transcoder after this long; unset means no limit
    pub transcode_timeout: Option<Duration>,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, applying defaults for absent keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            addr: var("ADDR", "127.0.0.1"),
            port: var("PORT", "3000"),
            redis_url: var("REDIS_URL", "redis://127.0.0.1/"),
            source_dir: PathBuf::from(var("ENCODER_SOURCE_DIR", "./media/source")),
            destination_dir: PathBuf::from(var("ENCODER_DESTINATION_DIR", "./media/encoded")),
            tmp_dir: PathBuf::from(var("ENCODER_TMP_DIR", "./media/tmp")),
            workers: parse("ENCODER_WORKERS", &var("ENCODER_WORKERS", "2"))?,
            geometry: parse("ENCODER_GEOMETRY", &var("ENCODER_GEOMETRY", "nocrop"))?,
            dequeue_timeout_secs: parse(
                "ENCODER_DEQUEUE_TIMEOUT_SECS",
                &var("ENCODER_DEQUEUE_TIMEOUT_SECS", "5"),
            )?,
            transcode_timeout: match lookup("ENCODER_TRANSCODE_TIMEOUT_SECS") {
                Some(raw) => match parse::<u64>("ENCODER_TRANSCODE_TIMEOUT_SECS", &raw)? {
                    0 => None,
                    secs => Some(Duration::from_secs(secs)),
                },
                None => None,
            },
        })
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
