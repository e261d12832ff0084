//! Project entity model and DTOs.

use corae_core::settings::StudySettings;
use corae_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub settings_id: DbId,
    pub token: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for creating a project together with its own settings row.
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub token: String,
    pub settings: StudySettings,
}
