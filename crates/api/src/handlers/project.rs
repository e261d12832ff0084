//! Handlers for the `/projects` resource and its sessions.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use corae_core::settings::SettingsOverrides;
use corae_core::types::DbId;
use corae_lifecycle::{NewSession, SessionSetup, StudyCatalog, Teardown, VideoUpload};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
    /// Start from this preset's settings instead of the defaults.
    pub preset_id: Option<DbId>,
    #[serde(default)]
    pub settings: SettingsOverrides,
}

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateProjectRequest>,
) -> AppResult<impl IntoResponse> {
    let project = StudyCatalog::new(state.store.as_ref())
        .create_project(&input.name, input.description, input.preset_id, &input.settings)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects
pub async fn list(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let projects = StudyCatalog::new(state.store.as_ref()).list_projects().await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let project = StudyCatalog::new(state.store.as_ref()).get_project(id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// DELETE /api/v1/projects/{id}
///
/// Removes the project with all its sessions and their stored videos.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let report = Teardown::new(state.store.as_ref(), state.blobs.as_ref())
        .delete_project(id)
        .await?;
    Ok(Json(DataResponse { data: report }))
}

/// GET /api/v1/projects/{id}/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let sessions = StudyCatalog::new(state.store.as_ref()).list_sessions(id).await?;
    Ok(Json(DataResponse { data: sessions }))
}

/// POST /api/v1/projects/{id}/sessions
///
/// Multipart form:
/// - `description`: optional text
/// - `participants`: one text field per participant, in order
/// - `videos`: one file field per video; in coupled projects the n-th video
///   belongs to the n-th participant
pub async fn create_session(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut input = NewSession::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "description" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                input.description = Some(text);
            }
            "participants" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                input.participant_names.push(text);
            }
            "videos" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::BadRequest("video field without a filename".into()))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                input.uploads.push(VideoUpload {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown form field");
            }
        }
    }

    let created = SessionSetup::new(
        state.store.as_ref(),
        state.blobs.as_ref(),
        state.probe.as_ref(),
    )
    .create_session(id, input)
    .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}
