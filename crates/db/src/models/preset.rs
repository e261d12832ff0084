//! Preset entity model and DTOs.
//!
//! A preset is a named settings template; projects copy its settings at
//! creation time and never reference the preset afterwards.

use corae_core::settings::StudySettings;
use corae_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A preset row from the `presets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Preset {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub settings_id: DbId,
    pub token: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreatePreset {
    pub name: String,
    pub description: Option<String>,
    pub token: String,
    pub settings: StudySettings,
}
