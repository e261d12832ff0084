//! Route definitions for the `/projects` resource.

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::project;
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                 -> list
/// POST   /                 -> create
/// GET    /{id}             -> get_by_id
/// DELETE /{id}             -> delete
/// GET    /{id}/sessions    -> list_sessions
/// POST   /{id}/sessions    -> create_session (multipart)
/// ```
///
/// Session creation carries the video uploads, so it alone accepts bodies
/// up to `max_upload_bytes`.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(project::list).post(project::create))
        .route("/{id}", get(project::get_by_id).delete(project::delete))
        .route(
            "/{id}/sessions",
            get(project::list_sessions).post(project::create_session).layer((
                DefaultBodyLimit::disable(),
                RequestBodyLimitLayer::new(max_upload_bytes),
            )),
        )
}
