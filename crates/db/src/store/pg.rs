use corae_core::annotation::NewAnnotation;
use corae_core::assignment::{plan_assignment, AssignmentInput, AssociationState};
use corae_core::entity::EntityKind;
use corae_core::error::CoreError;
use corae_core::types::DbId;

use super::{db_error, EntityStore};
use crate::models::annotation::{Annotation, SubmissionOutcome};
use crate::models::association::{Association, AssignmentRequest};
use crate::models::participant::Participant;
use crate::models::preset::{CreatePreset, Preset};
use crate::models::project::{CreateProject, Project};
use crate::models::session::{CreateSession, Session};
use crate::models::settings::Settings;
use crate::models::status::SessionStatus;
use crate::models::video::{CreateVideo, Video};
use crate::repositories::{
    AnnotationRepo, AssociationRepo, ParticipantRepo, PresetRepo, ProjectRepo, SessionRepo,
    SettingsRepo, TeardownRepo, TokenRepo, VideoRepo,
};
use crate::DbPool;

/// [`EntityStore`] on PostgreSQL, delegating to the repository layer.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl EntityStore for PgStore {
    async fn health_check(&self) -> Result<(), CoreError> {
        crate::health_check(&self.pool).await.map_err(db_error)
    }

    async fn token_exists(&self, kind: EntityKind, token: &str) -> Result<bool, CoreError> {
        TokenRepo::exists(&self.pool, kind, token)
            .await
            .map_err(db_error)
    }

    async fn find_id_by_token(
        &self,
        kind: EntityKind,
        token: &str,
    ) -> Result<Option<DbId>, CoreError> {
        TokenRepo::find_id(&self.pool, kind, token)
            .await
            .map_err(db_error)
    }

    async fn create_preset(&self, input: &CreatePreset) -> Result<Preset, CoreError> {
        PresetRepo::create(&self.pool, input).await.map_err(db_error)
    }

    async fn find_preset(&self, id: DbId) -> Result<Option<Preset>, CoreError> {
        PresetRepo::find_by_id(&self.pool, id).await.map_err(db_error)
    }

    async fn list_presets(&self) -> Result<Vec<Preset>, CoreError> {
        PresetRepo::list(&self.pool).await.map_err(db_error)
    }

    async fn create_project(&self, input: &CreateProject) -> Result<Project, CoreError> {
        ProjectRepo::create(&self.pool, input).await.map_err(db_error)
    }

    async fn find_project(&self, id: DbId) -> Result<Option<Project>, CoreError> {
        ProjectRepo::find_by_id(&self.pool, id).await.map_err(db_error)
    }

    async fn list_projects(&self) -> Result<Vec<Project>, CoreError> {
        ProjectRepo::list(&self.pool).await.map_err(db_error)
    }

    async fn find_settings(&self, id: DbId) -> Result<Option<Settings>, CoreError> {
        SettingsRepo::find_by_id(&self.pool, id).await.map_err(db_error)
    }

    async fn create_session(
        &self,
        input: &CreateSession,
    ) -> Result<(Session, Vec<Participant>), CoreError> {
        SessionRepo::create_with_participants(&self.pool, input)
            .await
            .map_err(db_error)
    }

    async fn find_session(&self, id: DbId) -> Result<Option<Session>, CoreError> {
        SessionRepo::find_by_id(&self.pool, id).await.map_err(db_error)
    }

    async fn list_sessions(&self, project_id: DbId) -> Result<Vec<Session>, CoreError> {
        SessionRepo::list_by_project(&self.pool, project_id)
            .await
            .map_err(db_error)
    }

    async fn set_session_status(
        &self,
        id: DbId,
        status: SessionStatus,
    ) -> Result<Option<Session>, CoreError> {
        SessionRepo::set_status(&self.pool, id, status)
            .await
            .map_err(db_error)
    }

    async fn find_participant(&self, id: DbId) -> Result<Option<Participant>, CoreError> {
        ParticipantRepo::find_by_id(&self.pool, id)
            .await
            .map_err(db_error)
    }

    async fn list_participants(&self, session_id: DbId) -> Result<Vec<Participant>, CoreError> {
        ParticipantRepo::list_by_session(&self.pool, session_id)
            .await
            .map_err(db_error)
    }

    async fn mark_accessed(&self, id: DbId) -> Result<Option<Participant>, CoreError> {
        ParticipantRepo::mark_accessed(&self.pool, id)
            .await
            .map_err(db_error)
    }

    async fn create_video(&self, input: &CreateVideo) -> Result<Video, CoreError> {
        VideoRepo::create(&self.pool, input).await.map_err(db_error)
    }

    async fn find_video(&self, id: DbId) -> Result<Option<Video>, CoreError> {
        VideoRepo::find_by_id(&self.pool, id).await.map_err(db_error)
    }

    async fn list_videos(&self, session_id: DbId) -> Result<Vec<Video>, CoreError> {
        VideoRepo::list_by_session(&self.pool, session_id)
            .await
            .map_err(db_error)
    }

    async fn list_associations(
        &self,
        participant_ids: &[DbId],
    ) -> Result<Vec<Association>, CoreError> {
        AssociationRepo::list_for_participants(&self.pool, participant_ids)
            .await
            .map_err(db_error)
    }

    async fn apply_assignment(
        &self,
        request: &AssignmentRequest,
    ) -> Result<Vec<Association>, CoreError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let locked = AssociationRepo::lock_participants_in(&mut *tx, &request.participants)
            .await
            .map_err(db_error)?;
        if let Some(&missing) = request.participants.iter().find(|id| !locked.contains(id)) {
            return Err(CoreError::NotFound {
                entity: "Participant",
                id: missing,
            });
        }

        let existing: Vec<AssociationState> =
            AssociationRepo::list_for_participants_in(&mut *tx, &request.participants)
                .await
                .map_err(db_error)?
                .iter()
                .map(Association::state)
                .collect();

        let input = AssignmentInput {
            participants: &request.participants,
            videos: &request.videos,
            coupling: request.coupling,
            ordering: request.ordering,
            existing: &existing,
        };
        let plan = plan_assignment(&input, &mut rand::rng())?;

        for row in &plan {
            AssociationRepo::upsert_in(&mut *tx, row)
                .await
                .map_err(db_error)?;
        }

        let stored = AssociationRepo::list_for_participants_in(&mut *tx, &request.participants)
            .await
            .map_err(db_error)?;
        tx.commit().await.map_err(db_error)?;

        tracing::debug!(
            participants = request.participants.len(),
            videos = request.videos.len(),
            rows = plan.len(),
            "Assignment applied",
        );
        Ok(stored)
    }

    async fn record_submission(
        &self,
        participant_id: DbId,
        annotations: &[NewAnnotation],
        progress: Option<f64>,
    ) -> Result<SubmissionOutcome, CoreError> {
        AnnotationRepo::record_submission(&self.pool, participant_id, annotations, progress)
            .await
            .map_err(db_error)
    }

    async fn list_annotations(
        &self,
        participant_id: DbId,
        video_id: DbId,
    ) -> Result<Vec<Annotation>, CoreError> {
        AnnotationRepo::list_for(&self.pool, participant_id, video_id)
            .await
            .map_err(db_error)
    }

    async fn delete_session_tree(&self, id: DbId) -> Result<Option<Vec<String>>, CoreError> {
        TeardownRepo::delete_session(&self.pool, id)
            .await
            .map_err(db_error)
    }

    async fn delete_project_tree(&self, id: DbId) -> Result<Option<Vec<String>>, CoreError> {
        TeardownRepo::delete_project(&self.pool, id)
            .await
            .map_err(db_error)
    }
}
