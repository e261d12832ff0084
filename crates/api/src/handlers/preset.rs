//! Handlers for the `/presets` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use corae_core::settings::SettingsOverrides;
use corae_core::types::DbId;
use corae_lifecycle::StudyCatalog;
use serde::Deserialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePresetRequest {
    pub name: String,
    pub description: Option<String>,
    /// Values that differ from the defaults.
    #[serde(default)]
    pub settings: SettingsOverrides,
}

/// POST /api/v1/presets
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreatePresetRequest>,
) -> AppResult<impl IntoResponse> {
    let preset = StudyCatalog::new(state.store.as_ref())
        .create_preset(&input.name, input.description, &input.settings)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: preset })))
}

/// GET /api/v1/presets
pub async fn list(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let presets = StudyCatalog::new(state.store.as_ref()).list_presets().await?;
    Ok(Json(DataResponse { data: presets }))
}

/// GET /api/v1/presets/{id}/settings
///
/// Used to prefill the project form when a preset is picked.
pub async fn get_settings(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let settings = StudyCatalog::new(state.store.as_ref())
        .preset_settings(id)
        .await?;
    Ok(Json(DataResponse { data: settings }))
}
