//! Repository for the `annotations` table.

use corae_core::annotation::NewAnnotation;
use corae_core::types::DbId;
use sqlx::PgPool;

use crate::models::annotation::{Annotation, SubmissionOutcome};

const COLUMNS: &str = "id, participant_id, video_id, timecode, frame_number, slider_position, \
                       created_at, updated_at";

pub struct AnnotationRepo;

impl AnnotationRepo {
    /// Insert a submission batch and mark the participant as submitted, in
    /// one transaction.
    ///
    /// Events whose identity key already exists are skipped by the unique
    /// constraint and counted as duplicates. `progress`, when given, must
    /// already be validated.
    pub async fn record_submission(
        pool: &PgPool,
        participant_id: DbId,
        annotations: &[NewAnnotation],
        progress: Option<f64>,
    ) -> Result<SubmissionOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut outcome = SubmissionOutcome::default();

        for a in annotations {
            let result = sqlx::query(
                "INSERT INTO annotations
                    (participant_id, video_id, timecode, frame_number, slider_position)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (participant_id, video_id, timecode, frame_number) DO NOTHING",
            )
            .bind(a.participant_id)
            .bind(a.video_id)
            .bind(a.timecode)
            .bind(a.frame_number)
            .bind(a.slider_position)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                outcome.inserted += 1;
            } else {
                outcome.duplicates += 1;
            }
        }

        sqlx::query(
            "UPDATE participants
             SET has_submitted = TRUE, progress = COALESCE($2, progress)
             WHERE id = $1",
        )
        .bind(participant_id)
        .bind(progress)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(outcome)
    }

    /// A participant's annotations on one video in creation order.
    pub async fn list_for(
        pool: &PgPool,
        participant_id: DbId,
        video_id: DbId,
    ) -> Result<Vec<Annotation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM annotations
             WHERE participant_id = $1 AND video_id = $2
             ORDER BY id"
        );
        sqlx::query_as::<_, Annotation>(&query)
            .bind(participant_id)
            .bind(video_id)
            .fetch_all(pool)
            .await
    }
}
