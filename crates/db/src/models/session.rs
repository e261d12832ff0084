//! Session entity model and DTOs.

use corae_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::status::{SessionStatus, StatusId};

/// A session row from the `sessions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Session {
    pub id: DbId,
    pub project_id: DbId,
    pub description: Option<String>,
    pub status_id: StatusId,
    pub token: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Session {
    /// Typed status; unknown IDs read as active.
    pub fn status(&self) -> SessionStatus {
        SessionStatus::from_id(self.status_id).unwrap_or(SessionStatus::Active)
    }
}

/// A participant to insert alongside a new session.
#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub name: String,
    pub token: String,
}

/// Input for creating a session and its participants in one transaction.
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub project_id: DbId,
    pub description: Option<String>,
    pub token: String,
    pub participants: Vec<NewParticipant>,
}
