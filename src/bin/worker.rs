//! Worker Binary - Redis-backed encoding workers with a status API
//!
//! It wires up:
//! - Local adapters (filesystem storage, Redis, ffmpeg)
//! - N worker loops pulling encoding ids off the queue
//! - HTTP endpoint for submitting encodings and reading their status

use encoding_worker::adapters::ffmpeg::FfmpegTranscoder;
use encoding_worker::adapters::local::{http, FsStorage, RedisPool};
use encoding_worker::application::{EncodingService, WorkerService};
use encoding_worker::config::WorkerConfig;
use encoding_worker::domain::workspace::Workspace;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match WorkerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    // 1. Adapters
    let redis = match RedisPool::new(&config.redis_url) {
        Ok(pool) => pool,
        Err(e) => {
            error!(error = %e, "failed to connect to Redis");
            std::process::exit(1);
        }
    };

    if let Err(e) = tokio::fs::create_dir_all(&config.tmp_dir).await {
        error!(error = %e, path = %config.tmp_dir.display(), "cannot create workspace");
        std::process::exit(1);
    }

    let storage = FsStorage::new(&config.source_dir, &config.destination_dir);
    let transcoder = match config.transcode_timeout {
        Some(limit) => FfmpegTranscoder::new().with_timeout(limit),
        None => FfmpegTranscoder::new(),
    };

    // 2. Application Services
    let encoder = Arc::new(EncodingService::new(
        redis.clone(),
        redis.clone(),
        storage,
        transcoder,
        Workspace::new(&config.tmp_dir),
        config.geometry,
    ));
    let worker_service = Arc::new(WorkerService::new(encoder.clone(), config.dequeue_timeout_secs));

    // 3. Start Workers
    for i in 0..config.workers {
        let w = worker_service.clone();
        tokio::spawn(async move {
            w.run_worker_loop(i).await;
        });
    }
    info!(workers = config.workers, geometry = ?config.geometry, "started encoding workers");

    // 4. HTTP Layer
    let app = http::router(encoder);
    let bind = format!("{}:{}", config.addr, config.port);
    let listener = match tokio::net::TcpListener::bind(&bind).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, %bind, "failed to bind TCP listener");
            std::process::exit(1);
        }
    };
    info!(%bind, "listening");
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server failed");
        std::process::exit(1);
    }
}
