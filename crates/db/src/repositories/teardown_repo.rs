//! Explicit subtree deletion.
//!
//! Foreign keys restrict deletes, so rows are removed child-first:
//! annotations, associations, videos, participants, sessions, then (for a
//! project) the project and its settings row. Stored files are returned for
//! the caller to remove after commit.

use corae_core::types::DbId;
use sqlx::{PgConnection, PgPool};

pub struct TeardownRepo;

impl TeardownRepo {
    /// Delete a session subtree. Returns `None` if the session does not exist,
    /// otherwise the relative paths of its videos.
    pub async fn delete_session(
        pool: &PgPool,
        session_id: DbId,
    ) -> Result<Option<Vec<String>>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let paths = Self::delete_sessions_in(&mut *tx, &[session_id]).await?;
        let removed = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;
        if removed.rows_affected() == 0 {
            return Ok(None);
        }
        tx.commit().await?;
        Ok(Some(paths))
    }

    /// Delete a project and everything below it. Returns `None` if the
    /// project does not exist, otherwise the relative paths of its videos.
    pub async fn delete_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Option<Vec<String>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let session_ids: Vec<(DbId,)> =
            sqlx::query_as("SELECT id FROM sessions WHERE project_id = $1 ORDER BY id")
                .bind(project_id)
                .fetch_all(&mut *tx)
                .await?;
        let session_ids: Vec<DbId> = session_ids.into_iter().map(|(id,)| id).collect();

        let paths = Self::delete_sessions_in(&mut *tx, &session_ids).await?;
        sqlx::query("DELETE FROM sessions WHERE project_id = $1")
            .bind(project_id)
            .execute(&mut *tx)
            .await?;

        let settings_id: Option<(DbId,)> =
            sqlx::query_as("DELETE FROM projects WHERE id = $1 RETURNING settings_id")
                .bind(project_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((settings_id,)) = settings_id else {
            return Ok(None);
        };
        sqlx::query("DELETE FROM settings WHERE id = $1")
            .bind(settings_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(paths))
    }

    /// Remove everything below the given sessions, leaving the session rows.
    async fn delete_sessions_in(
        conn: &mut PgConnection,
        session_ids: &[DbId],
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query(
            "DELETE FROM annotations
             WHERE participant_id IN (SELECT id FROM participants WHERE session_id = ANY($1))
                OR video_id IN (SELECT id FROM videos WHERE session_id = ANY($1))",
        )
        .bind(session_ids)
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            "DELETE FROM participant_videos
             WHERE participant_id IN (SELECT id FROM participants WHERE session_id = ANY($1))
                OR video_id IN (SELECT id FROM videos WHERE session_id = ANY($1))",
        )
        .bind(session_ids)
        .execute(&mut *conn)
        .await?;

        let paths: Vec<(String,)> = sqlx::query_as(
            "DELETE FROM videos WHERE session_id = ANY($1) RETURNING filepath",
        )
        .bind(session_ids)
        .fetch_all(&mut *conn)
        .await?;

        sqlx::query("DELETE FROM participants WHERE session_id = ANY($1)")
            .bind(session_ids)
            .execute(&mut *conn)
            .await?;

        Ok(paths.into_iter().map(|(p,)| p).collect())
    }
}
