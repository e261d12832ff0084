use std::sync::Arc;

use corae_core::ffmpeg::VideoProbe;
use corae_core::storage::BlobStore;
use corae_db::store::EntityStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; every collaborator sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Persistence for every study entity.
    pub store: Arc<dyn EntityStore>,
    /// Uploaded video bytes.
    pub blobs: Arc<dyn BlobStore>,
    /// Frame rate and duration extraction for uploads.
    pub probe: Arc<dyn VideoProbe>,
    pub config: Arc<ServerConfig>,
}
