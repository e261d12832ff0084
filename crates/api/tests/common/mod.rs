#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use corae_api::config::{ServerConfig, StoreBackend};
use corae_api::router::build_app_router;
use corae_api::state::AppState;
use corae_core::ffmpeg::{FfmpegError, VideoMetadata, VideoProbe};
use corae_core::storage::LocalBlobStore;
use corae_db::store::MemoryStore;

pub const BOUNDARY: &str = "corae-test-boundary";

/// Reports 30 fps and 10 s for every file.
pub struct StubProbe;

#[async_trait::async_trait]
impl VideoProbe for StubProbe {
    async fn probe(&self, _path: &Path) -> Result<VideoMetadata, FfmpegError> {
        Ok(VideoMetadata {
            frame_rate: Some(30.0),
            duration: Some(10.0),
        })
    }
}

/// Build a test `ServerConfig` with safe defaults and `uploads_dir` as the
/// blob root.
pub fn test_config(uploads_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        uploads_dir,
        max_upload_bytes: 1024 * 1024,
        probe_timeout: Duration::from_secs(1),
        store: StoreBackend::Memory,
    }
}

/// A router over a fresh in-memory store. Keep the temp dir alive for the
/// duration of the test.
pub struct TestApp {
    pub router: Router,
    pub uploads: tempfile::TempDir,
}

pub fn build_test_app() -> TestApp {
    let uploads = tempfile::tempdir().unwrap();
    let config = test_config(uploads.path().to_path_buf());
    let state = AppState {
        store: Arc::new(MemoryStore::new()),
        blobs: Arc::new(LocalBlobStore::new(uploads.path())),
        probe: Arc::new(StubProbe),
        config: Arc::new(config.clone()),
    };
    TestApp {
        router: build_app_router(state, &config).unwrap(),
        uploads,
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn delete(app: &Router, uri: &str) -> Response<Body> {
    send(
        app,
        Request::builder()
            .method(Method::DELETE)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn post_empty(app: &Router, uri: &str) -> Response<Body> {
    send(app, Request::post(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    send(
        app,
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

/// POST a multipart form of `(field, value)` text parts and
/// `(field, filename, bytes)` file parts.
pub async fn post_multipart(
    app: &Router,
    uri: &str,
    texts: &[(&str, &str)],
    files: &[(&str, &str, &[u8])],
) -> Response<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in texts {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, filename, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{filename}\"\r\nContent-Type: video/mp4\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    send(
        app,
        Request::post(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap(),
    )
    .await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Create a project and return its id.
pub async fn create_project(app: &Router, settings: Value) -> i64 {
    let response = post_json(
        app,
        "/api/v1/projects",
        serde_json::json!({ "name": "Study", "settings": settings }),
    )
    .await;
    assert_eq!(response.status(), 201);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Create a session with one clip per entry in `videos` and return the
/// `data` payload.
pub async fn create_session(
    app: &Router,
    project_id: i64,
    names: &[&str],
    videos: &[&str],
) -> Value {
    let mut texts = vec![("description", "Pilot")];
    texts.extend(names.iter().map(|n| ("participants", *n)));
    let files: Vec<(&str, &str, &[u8])> = videos
        .iter()
        .map(|v| ("videos", *v, v.as_bytes()))
        .collect();

    let response = post_multipart(
        app,
        &format!("/api/v1/projects/{project_id}/sessions"),
        &texts,
        &files,
    )
    .await;
    assert_eq!(response.status(), 201);
    body_json(response).await["data"].clone()
}
