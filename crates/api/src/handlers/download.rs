//! Export downloads.
//!
//! These return the bare export document (no `data` envelope) as a JSON
//! attachment.

use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use corae_core::export::{participant_filename, session_filename};
use corae_core::types::DbId;
use corae_lifecycle::ExportAggregator;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/v1/sessions/{id}/download/{token}
pub async fn participant(
    State(state): State<AppState>,
    Path((session_id, token)): Path<(DbId, String)>,
) -> AppResult<impl IntoResponse> {
    let export = ExportAggregator::new(state.store.as_ref())
        .export_participant_in_session(session_id, &token)
        .await?;
    attachment(&export, participant_filename(export.participant_internal_id))
}

/// GET /api/v1/sessions/{id}/download/aggregate
pub async fn aggregate(
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let export = ExportAggregator::new(state.store.as_ref())
        .export_session_aggregate(session_id)
        .await?;
    attachment(&export, session_filename(session_id))
}

fn attachment<T: Serialize>(document: &T, filename: String) -> AppResult<impl IntoResponse> {
    let body = serde_json::to_vec_pretty(document)
        .map_err(|e| AppError::InternalError(format!("Failed to serialize export: {e}")))?;
    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "application/json".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    ))
}
