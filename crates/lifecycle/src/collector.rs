//! Annotation collection.
//!
//! Ingestion policy: a submission is processed video by video and event by
//! event. Video keys that are unparsable, unknown or not associated with the
//! participant are skipped, as are entries that are not a list of events.
//! Malformed events are rejected one at a time. The remaining events commit
//! together with `has_submitted` in one transaction.

use std::collections::{HashMap, HashSet};

use corae_core::annotation::{
    collapse_duplicates, parse_progress, parse_video_key, validate_event, AnnotationEvent,
    NewAnnotation, Submission,
};
use corae_core::assignment::{sort_for_viewing, AssociationState};
use corae_core::error::CoreError;
use corae_core::types::DbId;
use corae_db::models::video::Video;
use corae_db::store::EntityStore;
use serde::Serialize;

/// Summary of one accepted submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubmissionReport {
    pub inserted: usize,
    /// Events already stored, or repeated within the batch.
    pub duplicates: usize,
    /// Video keys that were ignored.
    pub skipped_videos: Vec<String>,
    pub rejected_events: usize,
    /// Progress stored by this submission, if any.
    pub progress: Option<f64>,
}

/// A video in a participant's annotation queue.
#[derive(Debug, Clone, Serialize)]
pub struct QueueEntry {
    pub order: i32,
    pub video: Video,
}

pub struct AnnotationCollector<'a> {
    store: &'a dyn EntityStore,
}

impl<'a> AnnotationCollector<'a> {
    pub fn new(store: &'a dyn EntityStore) -> Self {
        Self { store }
    }

    /// Ingest a submission for `participant_id`.
    ///
    /// An invalid `progress` does not stop the events from being stored;
    /// the batch commits without the progress update and the call then
    /// returns [`CoreError::Validation`].
    pub async fn accept_submission(
        &self,
        participant_id: DbId,
        submission: &Submission,
    ) -> Result<SubmissionReport, CoreError> {
        if self.store.find_participant(participant_id).await?.is_none() {
            return Err(CoreError::NotFound {
                entity: "Participant",
                id: participant_id,
            });
        }

        let associated: HashSet<DbId> = self
            .store
            .list_associations(&[participant_id])
            .await?
            .iter()
            .map(|a| a.video_id)
            .collect();

        let mut report = SubmissionReport::default();
        let mut batch: Vec<NewAnnotation> = Vec::new();

        for (key, entry) in &submission.annotations {
            let Some(video_id) = parse_video_key(key).filter(|id| associated.contains(id)) else {
                tracing::warn!(
                    participant_id,
                    video_key = %key,
                    "Skipping annotations for unknown or unassigned video",
                );
                report.skipped_videos.push(key.clone());
                continue;
            };
            let Some(events) = entry.as_array() else {
                tracing::warn!(
                    participant_id,
                    video_id,
                    "Skipping annotations that are not a list of events",
                );
                report.skipped_videos.push(key.clone());
                continue;
            };

            for (index, raw) in events.iter().enumerate() {
                let parsed = serde_json::from_value::<AnnotationEvent>(raw.clone())
                    .map_err(|e| CoreError::Validation(e.to_string()))
                    .and_then(|event| validate_event(participant_id, video_id, &event));
                match parsed {
                    Ok(annotation) => batch.push(annotation),
                    Err(e) => {
                        tracing::warn!(
                            participant_id,
                            video_id,
                            index,
                            error = %e,
                            "Rejecting malformed annotation event",
                        );
                        report.rejected_events += 1;
                    }
                }
            }
        }

        report.duplicates = collapse_duplicates(&mut batch);

        let progress = submission
            .progress
            .as_ref()
            .map_or(Ok(None), parse_progress);
        let stored_progress = progress.as_ref().ok().copied().flatten();

        let outcome = self
            .store
            .record_submission(participant_id, &batch, stored_progress)
            .await?;
        report.inserted = outcome.inserted;
        report.duplicates += outcome.duplicates;
        report.progress = stored_progress;

        tracing::info!(
            participant_id,
            inserted = report.inserted,
            duplicates = report.duplicates,
            skipped_videos = report.skipped_videos.len(),
            rejected_events = report.rejected_events,
            "Annotations recorded",
        );

        progress?;
        Ok(report)
    }

    /// The videos `participant_id` must annotate, in viewing order.
    /// Owned videos are never part of the queue.
    pub async fn participant_queue(
        &self,
        participant_id: DbId,
    ) -> Result<Vec<QueueEntry>, CoreError> {
        let mut states: Vec<AssociationState> = self
            .store
            .list_associations(&[participant_id])
            .await?
            .iter()
            .filter(|a| !a.owner)
            .map(|a| a.state())
            .collect();
        sort_for_viewing(&mut states);

        let participant = self
            .store
            .find_participant(participant_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Participant",
                id: participant_id,
            })?;
        let mut videos: HashMap<DbId, Video> = self
            .store
            .list_videos(participant.session_id)
            .await?
            .into_iter()
            .map(|v| (v.id, v))
            .collect();

        let mut queue = Vec::with_capacity(states.len());
        for state in states {
            let video = videos.remove(&state.video_id).ok_or(CoreError::NotFound {
                entity: "Video",
                id: state.video_id,
            })?;
            queue.push(QueueEntry {
                order: state.order.unwrap_or_default(),
                video,
            });
        }
        Ok(queue)
    }
}
