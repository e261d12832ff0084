//! Video entity model and DTOs.

use corae_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A video row from the `videos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Video {
    pub id: DbId,
    pub session_id: DbId,
    /// Original upload filename.
    pub filename: String,
    /// Path relative to the uploads root.
    pub filepath: String,
    pub token: String,
    pub duration: Option<f64>,
    pub frame_rate: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateVideo {
    pub session_id: DbId,
    pub filename: String,
    pub filepath: String,
    pub token: String,
    pub duration: Option<f64>,
    pub frame_rate: Option<f64>,
}
