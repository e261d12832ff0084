//! Participant/video association model.

use corae_core::assignment::AssociationState;
use corae_core::settings::{Coupling, Ordering};
use corae_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `participant_videos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Association {
    pub id: DbId,
    pub participant_id: DbId,
    pub video_id: DbId,
    pub owner: bool,
    #[sqlx(rename = "view_order")]
    #[serde(rename = "order")]
    pub order: Option<i32>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Association {
    pub fn state(&self) -> AssociationState {
        AssociationState {
            participant_id: self.participant_id,
            video_id: self.video_id,
            owner: self.owner,
            order: self.order,
        }
    }
}

/// One assignment invocation: the participant list and video pool in the
/// order the planner should see them, plus the session's policy.
#[derive(Debug, Clone)]
pub struct AssignmentRequest {
    pub participants: Vec<DbId>,
    pub videos: Vec<DbId>,
    pub coupling: Coupling,
    pub ordering: Ordering,
}
