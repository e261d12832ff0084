//! Handlers for the `/sessions` resource.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use corae_core::types::DbId;
use corae_lifecycle::{AssignmentEngine, SessionSetup, StudyCatalog, Teardown};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/sessions/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let session = StudyCatalog::new(state.store.as_ref()).get_session(id).await?;
    Ok(Json(DataResponse { data: session }))
}

/// POST /api/v1/sessions/{id}/status
///
/// Toggle between active and archived.
pub async fn toggle_status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let session = SessionSetup::new(
        state.store.as_ref(),
        state.blobs.as_ref(),
        state.probe.as_ref(),
    )
    .toggle_session_status(id)
    .await?;
    Ok(Json(DataResponse { data: session }))
}

/// POST /api/v1/sessions/{id}/assign
///
/// Re-run assignment over the session. Existing associations are kept.
pub async fn assign(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let associations = AssignmentEngine::new(state.store.as_ref())
        .assign_session(id)
        .await?;
    Ok(Json(DataResponse { data: associations }))
}

/// DELETE /api/v1/sessions/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let report = Teardown::new(state.store.as_ref(), state.blobs.as_ref())
        .delete_session(id)
        .await?;
    Ok(Json(DataResponse { data: report }))
}
