//! Repository for the `videos` table.

use corae_core::types::DbId;
use sqlx::PgPool;

use crate::models::video::{CreateVideo, Video};

const COLUMNS: &str =
    "id, session_id, filename, filepath, token, duration, frame_rate, created_at, updated_at";

pub struct VideoRepo;

impl VideoRepo {
    pub async fn create(pool: &PgPool, input: &CreateVideo) -> Result<Video, sqlx::Error> {
        let query = format!(
            "INSERT INTO videos (session_id, filename, filepath, token, duration, frame_rate)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Video>(&query)
            .bind(input.session_id)
            .bind(&input.filename)
            .bind(&input.filepath)
            .bind(&input.token)
            .bind(input.duration)
            .bind(input.frame_rate)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id = $1");
        sqlx::query_as::<_, Video>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// A session's video pool in id (upload) order.
    pub async fn list_by_session(
        pool: &PgPool,
        session_id: DbId,
    ) -> Result<Vec<Video>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM videos WHERE session_id = $1 ORDER BY id");
        sqlx::query_as::<_, Video>(&query)
            .bind(session_id)
            .fetch_all(pool)
            .await
    }
}
