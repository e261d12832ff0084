pub mod health;
pub mod participant;
pub mod preset;
pub mod project;
pub mod session;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /presets                               list, create
/// /presets/{id}/settings                 preset settings
///
/// /projects                              list, create
/// /projects/{id}                         get, delete
/// /projects/{id}/sessions                list, create (multipart)
///
/// /sessions/{id}                         get, delete
/// /sessions/{id}/status                  toggle active/archived
/// /sessions/{id}/assign                  re-run assignment
/// /sessions/{id}/download/aggregate      session export
/// /sessions/{id}/download/{token}        participant export
///
/// /join/{token}                          participant entry
/// /annotator/{token}                     annotator view, submission
/// ```
pub fn api_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .nest("/presets", preset::router())
        .nest("/projects", project::router(max_upload_bytes))
        .nest("/sessions", session::router())
        .merge(participant::router())
}
