//! Loading an entity together with its ancestors.

use corae_core::error::CoreError;
use corae_core::settings::StudySettings;
use corae_core::types::DbId;
use corae_db::models::participant::Participant;
use corae_db::models::project::Project;
use corae_db::models::session::Session;
use corae_db::store::EntityStore;

/// A session with its project and the project's parsed settings.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session: Session,
    pub project: Project,
    pub settings: StudySettings,
}

/// A participant with everything above it.
#[derive(Debug, Clone)]
pub struct ParticipantContext {
    pub participant: Participant,
    pub session: Session,
    pub project: Project,
    pub settings: StudySettings,
}

pub async fn load_project_settings(
    store: &dyn EntityStore,
    project: &Project,
) -> Result<StudySettings, CoreError> {
    store
        .find_settings(project.settings_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Settings",
            id: project.settings_id,
        })?
        .values()
}

pub async fn load_session(
    store: &dyn EntityStore,
    session_id: DbId,
) -> Result<SessionContext, CoreError> {
    let session = store
        .find_session(session_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Session",
            id: session_id,
        })?;
    let project = store
        .find_project(session.project_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Project",
            id: session.project_id,
        })?;
    let settings = load_project_settings(store, &project).await?;
    Ok(SessionContext {
        session,
        project,
        settings,
    })
}

pub async fn load_participant(
    store: &dyn EntityStore,
    participant_id: DbId,
) -> Result<ParticipantContext, CoreError> {
    let participant = store
        .find_participant(participant_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Participant",
            id: participant_id,
        })?;
    let SessionContext {
        session,
        project,
        settings,
    } = load_session(store, participant.session_id).await?;
    Ok(ParticipantContext {
        participant,
        session,
        project,
        settings,
    })
}
