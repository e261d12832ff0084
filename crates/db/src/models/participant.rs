//! Participant entity model.

use corae_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A participant row from the `participants` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Participant {
    pub id: DbId,
    pub session_id: DbId,
    /// Researcher-supplied display name (the export's external id).
    pub name: String,
    pub token: String,
    pub has_accessed: bool,
    pub last_accessed: Option<Timestamp>,
    pub has_submitted: bool,
    /// Percent complete, 0..=100.
    pub progress: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
