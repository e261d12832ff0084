//! Presets, projects and read access to sessions.

use corae_core::entity::EntityKind;
use corae_core::error::CoreError;
use corae_core::settings::{SettingsOverrides, StudySettings, MAX_LABEL_LEN};
use corae_core::types::DbId;
use corae_db::models::participant::Participant;
use corae_db::models::preset::{CreatePreset, Preset};
use corae_db::models::project::{CreateProject, Project};
use corae_db::models::session::Session;
use corae_db::models::video::Video;
use corae_db::store::EntityStore;
use serde::Serialize;

use crate::context;
use crate::identity::TokenIdentity;

/// A project with its resolved settings.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub settings: StudySettings,
}

/// A session with its participants and video pool.
#[derive(Debug, Clone, Serialize)]
pub struct SessionDetail {
    #[serde(flatten)]
    pub session: Session,
    pub status: &'static str,
    pub participants: Vec<Participant>,
    pub videos: Vec<Video>,
}

pub struct StudyCatalog<'a> {
    store: &'a dyn EntityStore,
}

impl<'a> StudyCatalog<'a> {
    pub fn new(store: &'a dyn EntityStore) -> Self {
        Self { store }
    }

    /* --- presets --- */

    /// Create a settings template from defaults plus `overrides`.
    pub async fn create_preset(
        &self,
        name: &str,
        description: Option<String>,
        overrides: &SettingsOverrides,
    ) -> Result<Preset, CoreError> {
        let name = validate_name("preset", name)?;
        let settings = StudySettings::default().with_overrides(overrides);
        settings.validate()?;

        let token = TokenIdentity::new(self.store)
            .generate_token(EntityKind::Preset)
            .await?;
        let preset = self
            .store
            .create_preset(&CreatePreset {
                name,
                description: normalize_description(description),
                token,
                settings,
            })
            .await?;

        tracing::info!(preset_id = preset.id, name = %preset.name, "Preset created");
        Ok(preset)
    }

    pub async fn list_presets(&self) -> Result<Vec<Preset>, CoreError> {
        self.store.list_presets().await
    }

    pub async fn preset_settings(&self, preset_id: DbId) -> Result<StudySettings, CoreError> {
        let preset = self
            .store
            .find_preset(preset_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Preset",
                id: preset_id,
            })?;
        self.store
            .find_settings(preset.settings_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Settings",
                id: preset.settings_id,
            })?
            .values()
    }

    /* --- projects --- */

    /// Create a project with its own copy of the preset's settings (or the
    /// defaults) and `overrides` applied on top.
    pub async fn create_project(
        &self,
        name: &str,
        description: Option<String>,
        preset_id: Option<DbId>,
        overrides: &SettingsOverrides,
    ) -> Result<ProjectDetail, CoreError> {
        let name = validate_name("project", name)?;
        let base = match preset_id {
            Some(id) => self.preset_settings(id).await?,
            None => StudySettings::default(),
        };
        let settings = base.with_overrides(overrides);
        settings.validate()?;

        let token = TokenIdentity::new(self.store)
            .generate_token(EntityKind::Project)
            .await?;
        let project = self
            .store
            .create_project(&CreateProject {
                name,
                description: normalize_description(description),
                token,
                settings: settings.clone(),
            })
            .await?;

        tracing::info!(
            project_id = project.id,
            preset_id = ?preset_id,
            coupling = settings.coupling.as_str(),
            ordering = settings.ordering.as_str(),
            "Project created",
        );
        Ok(ProjectDetail { project, settings })
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>, CoreError> {
        self.store.list_projects().await
    }

    pub async fn get_project(&self, project_id: DbId) -> Result<ProjectDetail, CoreError> {
        let project = self.find_project(project_id).await?;
        let settings = context::load_project_settings(self.store, &project).await?;
        Ok(ProjectDetail { project, settings })
    }

    /* --- sessions --- */

    pub async fn list_sessions(&self, project_id: DbId) -> Result<Vec<Session>, CoreError> {
        self.find_project(project_id).await?;
        self.store.list_sessions(project_id).await
    }

    pub async fn get_session(&self, session_id: DbId) -> Result<SessionDetail, CoreError> {
        let session = self
            .store
            .find_session(session_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Session",
                id: session_id,
            })?;
        let participants = self.store.list_participants(session_id).await?;
        let videos = self.store.list_videos(session_id).await?;
        Ok(SessionDetail {
            status: session.status().as_str(),
            session,
            participants,
            videos,
        })
    }

    async fn find_project(&self, project_id: DbId) -> Result<Project, CoreError> {
        self.store
            .find_project(project_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Project",
                id: project_id,
            })
    }
}

fn validate_name(what: &str, name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{what} name must not be empty")));
    }
    if trimmed.len() > MAX_LABEL_LEN {
        return Err(CoreError::Validation(format!(
            "{what} name too long: {} chars (max {MAX_LABEL_LEN})",
            trimmed.len()
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}
