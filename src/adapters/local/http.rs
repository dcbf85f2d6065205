//! HTTP API for submitting encodings and reading their status.

use crate::application::{EncodingService, ServiceError};
use crate::ports::queue::EncodingQueuePort;
use crate::ports::repository::{EncodingRepository, RepositoryError};
use crate::ports::storage::StoragePort;
use crate::ports::transcoder::Transcoder;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub video_id: String,
    pub profile_id: String,
}

/// `POST /encodings`, `GET /encodings/:id` and `GET /health`.
pub fn router<R, Q, S, T>(encoder: Arc<EncodingService<R, Q, S, T>>) -> Router
where
    R: EncodingRepository + 'static,
    Q: EncodingQueuePort + 'static,
    S: StoragePort + 'static,
    T: Transcoder + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/encodings", post(submit_encoding::<R, Q, S, T>))
        .route("/encodings/:id", get(show_encoding::<R, Q, S, T>))
        .with_state(encoder)
}

async fn health() -> &'static str {
    "ok"
}

async fn submit_encoding<R, Q, S, T>(
    State(encoder): State<Arc<EncodingService<R, Q, S, T>>>,
    Json(request): Json<SubmitRequest>,
) -> Response
where
    R: EncodingRepository + 'static,
    Q: EncodingQueuePort + 'static,
    S: StoragePort + 'static,
    T: Transcoder + 'static,
{
    match encoder.submit(&request.video_id, &request.profile_id).await {
        Ok(encoding) => (StatusCode::CREATED, Json(encoding.show_response())).into_response(),
        Err(e) => error_response(e),
    }
}

async fn show_encoding<R, Q, S, T>(
    State(encoder): State<Arc<EncodingService<R, Q, S, T>>>,
    Path(id): Path<String>,
) -> Response
where
    R: EncodingRepository + 'static,
    Q: EncodingQueuePort + 'static,
    S: StoragePort + 'static,
    T: Transcoder + 'static,
{
    match encoder.load_encoding(&id).await {
        Ok(encoding) => Json(encoding.show_response()).into_response(),
        Err(e) => error_response(e),
    }
}

fn error_response(e: ServiceError) -> Response {
    match e {
        ServiceError::Repository(e @ RepositoryError::NotFound { .. }) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
        e => {
            error!(error = %e, "encoding request failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::local::memory::MemoryStore;
    use crate::domain::encoding::fixtures::{profile, video};
    use crate::domain::encoding::Encoding;
    use crate::domain::geometry::GeometryMode;
    use crate::domain::workspace::Workspace;
    use crate::ports::storage::MockStoragePort;
    use crate::ports::transcoder::MockTranscoder;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use tower::ServiceExt;

    type Service = EncodingService<MemoryStore, MemoryStore, MockStoragePort, MockTranscoder>;

    async fn app() -> (Router, MemoryStore) {
        let store = MemoryStore::new();
        store.save_video(&video(1920, 1080)).await.unwrap();
        store.save_profile(&profile(640, 480)).await.unwrap();
        let encoder: Arc<Service> = Arc::new(EncodingService::new(
            store.clone(),
            store.clone(),
            MockStoragePort::new(),
            MockTranscoder::new(),
            Workspace::new("/tmp/encoder-http"),
            GeometryMode::NoCrop,
        ));
        (router(encoder), store)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_show_returns_encoding_view() {
        let (app, store) = app().await;
        let encoding = Encoding::new(&video(1920, 1080), &profile(640, 480));
        store.save_encoding(&encoding).await.unwrap();

        let (status, body) = send(app, get(&format!("/encodings/{}", encoding.id))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["video"]["id"], encoding.id.as_str());
        assert_eq!(body["video"]["status"], "queued");
        assert!(body["video"].get("error_message").is_none());
    }

    #[tokio::test]
    async fn test_show_unknown_id_is_404() {
        let (app, _) = app().await;
        let (status, body) = send(app, get("/encodings/nope")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "encoding nope not found");
    }

    #[tokio::test]
    async fn test_post_queues_a_new_encoding() {
        let (app, store) = app().await;

        let (status, body) = send(
            app,
            post_json(
                "/encodings",
                json!({ "video_id": "video-1", "profile_id": "profile-1" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["video"]["status"], "queued");
        let id = body["video"]["id"].as_str().unwrap().to_string();
        assert_eq!(store.dequeue(0.01).await.unwrap(), Some(id.clone()));
        assert!(store.get_encoding(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_post_with_unknown_profile_is_404() {
        let (app, store) = app().await;

        let (status, body) = send(
            app,
            post_json(
                "/encodings",
                json!({ "video_id": "video-1", "profile_id": "missing" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "profile missing not found");
        assert_eq!(store.queue_len().await, 0);
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app().await;
        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
