//! Session creation: participants, uploads, probing and assignment.

use std::path::Path;

use corae_core::assignment::check_counts;
use corae_core::entity::EntityKind;
use corae_core::error::CoreError;
use corae_core::ffmpeg::{VideoMetadata, VideoProbe};
use corae_core::settings::{StudySettings, MAX_LABEL_LEN};
use corae_core::storage::{validate_video_extension, video_relative_path, BlobStore};
use corae_core::types::DbId;
use corae_db::models::association::Association;
use corae_db::models::participant::Participant;
use corae_db::models::session::{CreateSession, NewParticipant, Session};
use corae_db::models::video::{CreateVideo, Video};
use corae_db::store::EntityStore;
use serde::Serialize;

use crate::assignment::AssignmentEngine;
use crate::context;
use crate::identity::TokenIdentity;
use crate::teardown::Teardown;

/// An uploaded clip awaiting storage.
#[derive(Debug, Clone)]
pub struct VideoUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Researcher input for a new session.
#[derive(Debug, Clone, Default)]
pub struct NewSession {
    pub description: Option<String>,
    pub participant_names: Vec<String>,
    pub uploads: Vec<VideoUpload>,
}

/// Everything created for a new session.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedSession {
    pub session: Session,
    pub participants: Vec<Participant>,
    pub videos: Vec<Video>,
    pub associations: Vec<Association>,
}

pub struct SessionSetup<'a> {
    store: &'a dyn EntityStore,
    blobs: &'a dyn BlobStore,
    probe: &'a dyn VideoProbe,
}

impl<'a> SessionSetup<'a> {
    pub fn new(
        store: &'a dyn EntityStore,
        blobs: &'a dyn BlobStore,
        probe: &'a dyn VideoProbe,
    ) -> Self {
        Self {
            store,
            blobs,
            probe,
        }
    }

    /// Create a session under `project_id`.
    ///
    /// Input is validated before anything is written. If storing a video or
    /// running the assignment fails, the new session is torn down again
    /// (rows and files) and the error is returned.
    pub async fn create_session(
        &self,
        project_id: DbId,
        input: NewSession,
    ) -> Result<CreatedSession, CoreError> {
        let project = self
            .store
            .find_project(project_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Project",
                id: project_id,
            })?;
        let settings = context::load_project_settings(self.store, &project).await?;
        let (names, extensions) = validate_new_session(&settings, &input)?;

        let identity = TokenIdentity::new(self.store);
        let session_token = identity.generate_token(EntityKind::Session).await?;
        let participant_tokens = identity
            .generate_tokens(EntityKind::Participant, names.len())
            .await?;

        let (session, participants) = self
            .store
            .create_session(&CreateSession {
                project_id,
                description: input
                    .description
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty()),
                token: session_token,
                participants: names
                    .into_iter()
                    .zip(participant_tokens)
                    .map(|(name, token)| NewParticipant { name, token })
                    .collect(),
            })
            .await?;

        tracing::info!(
            project_id,
            session_id = session.id,
            participants = participants.len(),
            videos = input.uploads.len(),
            "Session created",
        );

        let mut saved_paths = Vec::with_capacity(input.uploads.len());
        let populated = self
            .populate(
                project_id,
                &session,
                &participants,
                &settings,
                &input.uploads,
                &extensions,
                &mut saved_paths,
            )
            .await;

        match populated {
            Ok((videos, associations)) => Ok(CreatedSession {
                session,
                participants,
                videos,
                associations,
            }),
            Err(e) => {
                tracing::error!(
                    session_id = session.id,
                    error = %e,
                    "Session setup failed, tearing down",
                );
                self.rollback(session.id, &saved_paths).await;
                Err(e)
            }
        }
    }

    /// Flip a session between active and archived.
    pub async fn toggle_session_status(&self, session_id: DbId) -> Result<Session, CoreError> {
        let session = self
            .store
            .find_session(session_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Session",
                id: session_id,
            })?;
        let next = session.status().toggled();
        let updated = self
            .store
            .set_session_status(session_id, next)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Session",
                id: session_id,
            })?;

        tracing::info!(session_id, status = next.as_str(), "Session status changed");
        Ok(updated)
    }

    /// Store, probe and record each upload, then assign.
    #[allow(clippy::too_many_arguments)]
    async fn populate(
        &self,
        project_id: DbId,
        session: &Session,
        participants: &[Participant],
        settings: &StudySettings,
        uploads: &[VideoUpload],
        extensions: &[String],
        saved_paths: &mut Vec<String>,
    ) -> Result<(Vec<Video>, Vec<Association>), CoreError> {
        let identity = TokenIdentity::new(self.store);
        let mut videos = Vec::with_capacity(uploads.len());

        for (upload, ext) in uploads.iter().zip(extensions) {
            let token = identity.generate_token(EntityKind::Video).await?;
            let relative = video_relative_path(project_id, session.id, &token, ext);
            let stored = self.blobs.save(&upload.bytes, &relative).await?;
            let stored = stored.to_string_lossy().to_string();
            saved_paths.push(stored.clone());

            let metadata = self.probe_metadata(&self.blobs.resolve(Path::new(&stored))).await;
            let video = self
                .store
                .create_video(&CreateVideo {
                    session_id: session.id,
                    filename: upload.filename.clone(),
                    filepath: stored,
                    token,
                    duration: metadata.duration,
                    frame_rate: metadata.frame_rate,
                })
                .await?;
            videos.push(video);
        }

        let participant_ids: Vec<DbId> = participants.iter().map(|p| p.id).collect();
        let video_ids: Vec<DbId> = videos.iter().map(|v| v.id).collect();
        let associations = AssignmentEngine::new(self.store)
            .assign(
                &participant_ids,
                &video_ids,
                settings.coupling,
                settings.ordering,
            )
            .await?;

        Ok((videos, associations))
    }

    /// Best-effort metadata; a failed probe yields empty metadata.
    async fn probe_metadata(&self, path: &Path) -> VideoMetadata {
        match self.probe.probe(path).await {
            Ok(metadata) => metadata,
            Err(e) => {
                let e = CoreError::from(e);
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Storing video without metadata",
                );
                VideoMetadata::default()
            }
        }
    }

    async fn rollback(&self, session_id: DbId, saved_paths: &[String]) {
        if let Err(e) = self.store.delete_session_tree(session_id).await {
            tracing::error!(session_id, error = %e, "Failed to remove rows of a failed session");
        }
        // Files saved before their row was written are not known to the store.
        let report = Teardown::new(self.store, self.blobs)
            .remove_files(saved_paths)
            .await;
        if !report.files_failed.is_empty() {
            tracing::warn!(
                session_id,
                files_failed = report.files_failed.len(),
                "Some uploaded files of a failed session remain on disk",
            );
        }
    }
}

/// Check a new session against the project settings. Returns the trimmed
/// participant names and each upload's extension.
fn validate_new_session(
    settings: &StudySettings,
    input: &NewSession,
) -> Result<(Vec<String>, Vec<String>), CoreError> {
    if input.participant_names.is_empty() {
        return Err(CoreError::Validation(
            "a session needs at least one participant".into(),
        ));
    }
    let mut names = Vec::with_capacity(input.participant_names.len());
    for name in &input.participant_names {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(CoreError::Validation(
                "participant names must not be empty".into(),
            ));
        }
        if trimmed.len() > MAX_LABEL_LEN {
            return Err(CoreError::Validation(format!(
                "participant name too long: {} chars (max {MAX_LABEL_LEN})",
                trimmed.len()
            )));
        }
        names.push(trimmed.to_string());
    }

    let capacity = usize::try_from(settings.capacity).unwrap_or(0);
    if names.len() > capacity {
        return Err(CoreError::Validation(format!(
            "{} participants exceed the project capacity of {}",
            names.len(),
            settings.capacity
        )));
    }

    if input.uploads.is_empty() {
        return Err(CoreError::Validation(
            "a session needs at least one video".into(),
        ));
    }
    let extensions = input
        .uploads
        .iter()
        .map(|u| validate_video_extension(&u.filename))
        .collect::<Result<Vec<_>, _>>()?;

    check_counts(names.len(), input.uploads.len(), settings.coupling)?;
    Ok((names, extensions))
}
