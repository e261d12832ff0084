//! Repository for the `sessions` table.

use corae_core::types::DbId;
use sqlx::PgPool;

use crate::models::participant::Participant;
use crate::models::session::{CreateSession, Session};
use crate::models::status::SessionStatus;
use crate::repositories::participant_repo;

const COLUMNS: &str = "id, project_id, description, status_id, token, created_at, updated_at";

pub struct SessionRepo;

impl SessionRepo {
    /// Insert a session (status active) and all of its participants in one
    /// transaction. Participants are returned in insertion order.
    pub async fn create_with_participants(
        pool: &PgPool,
        input: &CreateSession,
    ) -> Result<(Session, Vec<Participant>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO sessions (project_id, description, status_id, token)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let session = sqlx::query_as::<_, Session>(&query)
            .bind(input.project_id)
            .bind(&input.description)
            .bind(SessionStatus::Active.id())
            .bind(&input.token)
            .fetch_one(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO participants (session_id, name, token)
             VALUES ($1, $2, $3)
             RETURNING {}",
            participant_repo::COLUMNS
        );
        let mut participants = Vec::with_capacity(input.participants.len());
        for p in &input.participants {
            let row = sqlx::query_as::<_, Participant>(&query)
                .bind(session.id)
                .bind(&p.name)
                .bind(&p.token)
                .fetch_one(&mut *tx)
                .await?;
            participants.push(row);
        }

        tx.commit().await?;
        Ok((session, participants))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Session>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sessions WHERE id = $1");
        sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a project's sessions, most recently created first.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<Session>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions WHERE project_id = $1 ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Set a session's status. Returns `None` if the session does not exist.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: SessionStatus,
    ) -> Result<Option<Session>, sqlx::Error> {
        let query = format!("UPDATE sessions SET status_id = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .bind(status.id())
            .fetch_optional(pool)
            .await
    }
}
