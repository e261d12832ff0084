//! Route definitions for the `/sessions` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{download, session};
use crate::state::AppState;

/// Routes mounted at `/sessions`.
///
/// ```text
/// GET    /{id}                      -> get_by_id
/// DELETE /{id}                      -> delete
/// POST   /{id}/status               -> toggle_status
/// POST   /{id}/assign               -> assign
/// GET    /{id}/download/aggregate   -> aggregate export
/// GET    /{id}/download/{token}     -> participant export
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(session::get_by_id).delete(session::delete))
        .route("/{id}/status", post(session::toggle_status))
        .route("/{id}/assign", post(session::assign))
        .route("/{id}/download/aggregate", get(download::aggregate))
        .route("/{id}/download/{token}", get(download::participant))
}
