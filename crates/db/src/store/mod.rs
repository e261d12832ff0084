//! The persistence contract consumed by the lifecycle engines.
//!
//! Every method is a unit of work: it either applies completely or leaves the
//! store untouched. Uniqueness (tokens, association pairs, annotation identity
//! keys) is enforced by the store, not by callers.

use corae_core::annotation::NewAnnotation;
use corae_core::entity::EntityKind;
use corae_core::error::CoreError;
use corae_core::types::DbId;

use crate::models::annotation::{Annotation, SubmissionOutcome};
use crate::models::association::{Association, AssignmentRequest};
use crate::models::participant::Participant;
use crate::models::preset::{CreatePreset, Preset};
use crate::models::project::{CreateProject, Project};
use crate::models::session::{CreateSession, Session};
use crate::models::settings::Settings;
use crate::models::status::SessionStatus;
use crate::models::video::{CreateVideo, Video};

mod memory;
mod pg;

pub use memory::{FailPoint, MemoryStore};
pub use pg::PgStore;

/// Transactional CRUD over the study entities.
#[async_trait::async_trait]
pub trait EntityStore: Send + Sync {
    async fn health_check(&self) -> Result<(), CoreError>;

    /* --- tokens --- */

    async fn token_exists(&self, kind: EntityKind, token: &str) -> Result<bool, CoreError>;
    async fn find_id_by_token(
        &self,
        kind: EntityKind,
        token: &str,
    ) -> Result<Option<DbId>, CoreError>;

    /* --- presets, projects, settings --- */

    async fn create_preset(&self, input: &CreatePreset) -> Result<Preset, CoreError>;
    async fn find_preset(&self, id: DbId) -> Result<Option<Preset>, CoreError>;
    async fn list_presets(&self) -> Result<Vec<Preset>, CoreError>;

    async fn create_project(&self, input: &CreateProject) -> Result<Project, CoreError>;
    async fn find_project(&self, id: DbId) -> Result<Option<Project>, CoreError>;
    async fn list_projects(&self) -> Result<Vec<Project>, CoreError>;

    async fn find_settings(&self, id: DbId) -> Result<Option<Settings>, CoreError>;

    /* --- sessions and participants --- */

    /// Insert the session and its participants atomically.
    async fn create_session(
        &self,
        input: &CreateSession,
    ) -> Result<(Session, Vec<Participant>), CoreError>;
    async fn find_session(&self, id: DbId) -> Result<Option<Session>, CoreError>;
    async fn list_sessions(&self, project_id: DbId) -> Result<Vec<Session>, CoreError>;
    async fn set_session_status(
        &self,
        id: DbId,
        status: SessionStatus,
    ) -> Result<Option<Session>, CoreError>;

    async fn find_participant(&self, id: DbId) -> Result<Option<Participant>, CoreError>;
    /// Participants of a session in id order.
    async fn list_participants(&self, session_id: DbId) -> Result<Vec<Participant>, CoreError>;
    /// Set `has_accessed` and stamp `last_accessed`.
    async fn mark_accessed(&self, id: DbId) -> Result<Option<Participant>, CoreError>;

    /* --- videos --- */

    async fn create_video(&self, input: &CreateVideo) -> Result<Video, CoreError>;
    async fn find_video(&self, id: DbId) -> Result<Option<Video>, CoreError>;
    /// Videos of a session in id order.
    async fn list_videos(&self, session_id: DbId) -> Result<Vec<Video>, CoreError>;

    /* --- associations --- */

    async fn list_associations(
        &self,
        participant_ids: &[DbId],
    ) -> Result<Vec<Association>, CoreError>;

    /// Plan and apply one assignment invocation in a single transaction,
    /// serialized against concurrent invocations over the same participants.
    /// Returns every association of the requested participants afterwards.
    async fn apply_assignment(
        &self,
        request: &AssignmentRequest,
    ) -> Result<Vec<Association>, CoreError>;

    /* --- annotations --- */

    /// Insert the batch (skipping existing identity keys), set
    /// `has_submitted`, and store `progress` if given, all atomically.
    async fn record_submission(
        &self,
        participant_id: DbId,
        annotations: &[NewAnnotation],
        progress: Option<f64>,
    ) -> Result<SubmissionOutcome, CoreError>;

    /// A participant's annotations on one video in creation order.
    async fn list_annotations(
        &self,
        participant_id: DbId,
        video_id: DbId,
    ) -> Result<Vec<Annotation>, CoreError>;

    /* --- teardown --- */

    /// Delete a session subtree; returns the stored video paths, or `None`
    /// if the session does not exist.
    async fn delete_session_tree(&self, id: DbId) -> Result<Option<Vec<String>>, CoreError>;
    /// Delete a project subtree including its settings; returns the stored
    /// video paths, or `None` if the project does not exist.
    async fn delete_project_tree(&self, id: DbId) -> Result<Option<Vec<String>>, CoreError>;
}

/// Classify a sqlx error into a domain error.
///
/// - Unique violations on `uq_` constraints map to `Conflict`.
/// - Check and foreign-key violations map to `Validation`.
/// - Everything else is a `Storage` failure, logged here.
pub(crate) fn db_error(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some("23505") => {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return CoreError::Conflict(format!(
                        "Duplicate value violates unique constraint: {constraint}"
                    ));
                }
            }
            Some("23514") | Some("23503") => {
                return CoreError::Validation(db_err.message().to_string());
            }
            _ => {}
        }
    }
    tracing::error!(error = %err, "Database error");
    CoreError::Storage(err.to_string())
}
