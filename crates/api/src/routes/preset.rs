//! Route definitions for the `/presets` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::preset;
use crate::state::AppState;

/// Routes mounted at `/presets`.
///
/// ```text
/// GET    /                 -> list
/// POST   /                 -> create
/// GET    /{id}/settings    -> get_settings
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(preset::list).post(preset::create))
        .route("/{id}/settings", get(preset::get_settings))
}
