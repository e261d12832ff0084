//! Annotation entity model.

use corae_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `annotations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Annotation {
    pub id: DbId,
    pub participant_id: DbId,
    pub video_id: DbId,
    pub timecode: f64,
    pub frame_number: i32,
    pub slider_position: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Row counts from recording one submission batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionOutcome {
    pub inserted: usize,
    /// Events whose identity key was already stored.
    pub duplicates: usize,
}
