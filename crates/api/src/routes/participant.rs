//! Participant-facing routes, addressed by token.

use axum::routing::get;
use axum::Router;

use crate::handlers::annotator;
use crate::state::AppState;

/// ```text
/// GET    /join/{token}         -> join (redirects to the annotator)
/// GET    /annotator/{token}    -> view
/// POST   /annotator/{token}    -> submit
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/join/{token}", get(annotator::join))
        .route(
            "/annotator/{token}",
            get(annotator::view).post(annotator::submit),
        )
}
