//! Repository for the `participant_videos` join table.

use corae_core::assignment::AssociationState;
use corae_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::association::Association;

const COLUMNS: &str = "id, participant_id, video_id, owner, view_order, created_at, updated_at";

pub struct AssociationRepo;

impl AssociationRepo {
    /// Associations of any of `participant_ids`.
    pub async fn list_for_participants(
        pool: &PgPool,
        participant_ids: &[DbId],
    ) -> Result<Vec<Association>, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::list_for_participants_in(&mut *conn, participant_ids).await
    }

    pub async fn list_for_participants_in(
        conn: &mut PgConnection,
        participant_ids: &[DbId],
    ) -> Result<Vec<Association>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM participant_videos
             WHERE participant_id = ANY($1)
             ORDER BY participant_id, view_order NULLS FIRST, video_id"
        );
        sqlx::query_as::<_, Association>(&query)
            .bind(participant_ids)
            .fetch_all(conn)
            .await
    }

    /// Lock the participant rows in id order so concurrent assignment runs
    /// over the same participants serialize.
    ///
    /// Returns the ids that exist.
    pub async fn lock_participants_in(
        conn: &mut PgConnection,
        participant_ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT id FROM participants WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(participant_ids)
        .fetch_all(conn)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Upsert one planned association. An existing owner flag is never cleared.
    pub async fn upsert_in(
        conn: &mut PgConnection,
        row: &AssociationState,
    ) -> Result<Association, sqlx::Error> {
        let query = format!(
            "INSERT INTO participant_videos (participant_id, video_id, owner, view_order)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (participant_id, video_id)
             DO UPDATE SET owner = participant_videos.owner OR EXCLUDED.owner,
                           view_order = EXCLUDED.view_order
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Association>(&query)
            .bind(row.participant_id)
            .bind(row.video_id)
            .bind(row.owner)
            .bind(row.order)
            .fetch_one(conn)
            .await
    }
}
