//! Repository for the `participants` table.
//!
//! Participants are inserted by [`SessionRepo`](crate::repositories::SessionRepo)
//! and updated by annotation submission; this repo covers reads and the join
//! bookkeeping.

use corae_core::types::DbId;
use sqlx::PgPool;

use crate::models::participant::Participant;

pub(crate) const COLUMNS: &str = "id, session_id, name, token, has_accessed, last_accessed, \
                                  has_submitted, progress, created_at, updated_at";

pub struct ParticipantRepo;

impl ParticipantRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Participant>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM participants WHERE id = $1");
        sqlx::query_as::<_, Participant>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All participants of a session in id (creation) order.
    pub async fn list_by_session(
        pool: &PgPool,
        session_id: DbId,
    ) -> Result<Vec<Participant>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM participants WHERE session_id = $1 ORDER BY id");
        sqlx::query_as::<_, Participant>(&query)
            .bind(session_id)
            .fetch_all(pool)
            .await
    }

    /// Record that the participant opened their link.
    pub async fn mark_accessed(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Participant>, sqlx::Error> {
        let query = format!(
            "UPDATE participants SET has_accessed = TRUE, last_accessed = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Participant>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
