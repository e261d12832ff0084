//! In-process [`EntityStore`].
//!
//! Every write clones the current state, applies the change to the copy and
//! swaps it in only if the whole operation succeeded, which gives the same
//! all-or-nothing behaviour as a database transaction. Failures can be armed
//! at named points to exercise that rollback in tests.

use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use corae_core::annotation::NewAnnotation;
use corae_core::assignment::{plan_assignment, AssignmentInput, AssociationState};
use corae_core::entity::EntityKind;
use corae_core::error::CoreError;
use corae_core::settings::StudySettings;
use corae_core::types::DbId;
use tokio::sync::Mutex;

use super::EntityStore;
use crate::models::annotation::{Annotation, SubmissionOutcome};
use crate::models::association::{Association, AssignmentRequest};
use crate::models::participant::Participant;
use crate::models::preset::{CreatePreset, Preset};
use crate::models::project::{CreateProject, Project};
use crate::models::session::{CreateSession, Session};
use crate::models::settings::Settings;
use crate::models::status::SessionStatus;
use crate::models::video::{CreateVideo, Video};

/// Named points at which an armed failure aborts a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    /// After the first association row of an assignment is written.
    Assignment,
    /// After the first annotation of a submission is written.
    Submission,
    CreateSession,
    CreateVideo,
    Teardown,
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    next_id: DbId,
    settings: BTreeMap<DbId, Settings>,
    presets: BTreeMap<DbId, Preset>,
    projects: BTreeMap<DbId, Project>,
    sessions: BTreeMap<DbId, Session>,
    participants: BTreeMap<DbId, Participant>,
    videos: BTreeMap<DbId, Video>,
    associations: BTreeMap<(DbId, DbId), Association>,
    annotations: Vec<Annotation>,
}

#[derive(Debug, Default)]
struct Inner {
    state: MemoryState,
    armed: HashSet<FailPoint>,
}

/// [`EntityStore`] held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next write passing `point` fail with a storage error.
    pub async fn arm_failure(&self, point: FailPoint) {
        self.inner.lock().await.armed.insert(point);
    }

    /// Number of stored association rows.
    pub async fn association_count(&self) -> usize {
        self.inner.lock().await.state.associations.len()
    }

    /// Number of stored annotation rows.
    pub async fn annotation_count(&self) -> usize {
        self.inner.lock().await.state.annotations.len()
    }

    /// Run `f` against a copy of the state and commit the copy on success.
    async fn write<T>(
        &self,
        f: impl FnOnce(&mut MemoryState, &mut Tripwire<'_>) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let mut inner = self.inner.lock().await;
        let mut draft = inner.state.clone();
        let mut tripwire = Tripwire {
            armed: &mut inner.armed,
        };
        let value = f(&mut draft, &mut tripwire)?;
        inner.state = draft;
        Ok(value)
    }

    async fn read<T>(&self, f: impl FnOnce(&MemoryState) -> T) -> T {
        let inner = self.inner.lock().await;
        f(&inner.state)
    }
}

/// One-shot failure trigger handed to write closures.
struct Tripwire<'a> {
    armed: &'a mut HashSet<FailPoint>,
}

impl Tripwire<'_> {
    fn check(&mut self, point: FailPoint) -> Result<(), CoreError> {
        if self.armed.remove(&point) {
            return Err(CoreError::Storage(format!("injected failure at {point:?}")));
        }
        Ok(())
    }
}

impl MemoryState {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn token_taken(&self, kind: EntityKind, token: &str) -> bool {
        self.find_id_by_token(kind, token).is_some()
    }

    fn find_id_by_token(&self, kind: EntityKind, token: &str) -> Option<DbId> {
        match kind {
            EntityKind::Project => self.projects.values().find(|r| r.token == token).map(|r| r.id),
            EntityKind::Preset => self.presets.values().find(|r| r.token == token).map(|r| r.id),
            EntityKind::Session => self.sessions.values().find(|r| r.token == token).map(|r| r.id),
            EntityKind::Participant => self
                .participants
                .values()
                .find(|r| r.token == token)
                .map(|r| r.id),
            EntityKind::Video => self.videos.values().find(|r| r.token == token).map(|r| r.id),
        }
    }

    /// Mirror of the `uq_{table}_token` constraints.
    fn claim_token(&self, kind: EntityKind, token: &str) -> Result<(), CoreError> {
        if self.token_taken(kind, token) {
            return Err(CoreError::Conflict(format!(
                "Duplicate value violates unique constraint: uq_{}_token",
                kind.table()
            )));
        }
        Ok(())
    }

    fn insert_settings(&mut self, values: &StudySettings) -> DbId {
        let id = self.next_id();
        let now = Utc::now();
        self.settings.insert(
            id,
            Settings {
                id,
                method: values.method.clone(),
                capacity: values.capacity,
                coupling: values.coupling.as_str().to_string(),
                ordering: values.ordering.as_str().to_string(),
                bounding: values.bounding.as_str().to_string(),
                granularity: values.granularity,
                axis: values.axis.clone(),
                ceiling: values.ceiling.clone(),
                floor: values.floor.clone(),
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    fn associations_for(&self, participant_ids: &[DbId]) -> Vec<Association> {
        let mut rows: Vec<Association> = self
            .associations
            .values()
            .filter(|a| participant_ids.contains(&a.participant_id))
            .cloned()
            .collect();
        rows.sort_by_key(|a| {
            (
                a.participant_id,
                a.order.is_some(),
                a.order.unwrap_or(0),
                a.video_id,
            )
        });
        rows
    }

    /// Remove everything below the given sessions and return video paths.
    fn delete_below_sessions(&mut self, session_ids: &[DbId]) -> Vec<String> {
        let participant_ids: HashSet<DbId> = self
            .participants
            .values()
            .filter(|p| session_ids.contains(&p.session_id))
            .map(|p| p.id)
            .collect();
        let video_ids: HashSet<DbId> = self
            .videos
            .values()
            .filter(|v| session_ids.contains(&v.session_id))
            .map(|v| v.id)
            .collect();

        self.annotations.retain(|a| {
            !participant_ids.contains(&a.participant_id) && !video_ids.contains(&a.video_id)
        });
        self.associations.retain(|(p, v), _| {
            !participant_ids.contains(p) && !video_ids.contains(v)
        });

        let mut paths = Vec::with_capacity(video_ids.len());
        for id in &video_ids {
            if let Some(video) = self.videos.remove(id) {
                paths.push((video.id, video.filepath));
            }
        }
        paths.sort();
        self.participants.retain(|id, _| !participant_ids.contains(id));
        paths.into_iter().map(|(_, path)| path).collect()
    }
}

#[async_trait::async_trait]
impl EntityStore for MemoryStore {
    async fn health_check(&self) -> Result<(), CoreError> {
        Ok(())
    }

    async fn token_exists(&self, kind: EntityKind, token: &str) -> Result<bool, CoreError> {
        Ok(self.read(|s| s.token_taken(kind, token)).await)
    }

    async fn find_id_by_token(
        &self,
        kind: EntityKind,
        token: &str,
    ) -> Result<Option<DbId>, CoreError> {
        Ok(self.read(|s| s.find_id_by_token(kind, token)).await)
    }

    async fn create_preset(&self, input: &CreatePreset) -> Result<Preset, CoreError> {
        self.write(|s, _| {
            s.claim_token(EntityKind::Preset, &input.token)?;
            let settings_id = s.insert_settings(&input.settings);
            let id = s.next_id();
            let now = Utc::now();
            let preset = Preset {
                id,
                name: input.name.clone(),
                description: input.description.clone(),
                settings_id,
                token: input.token.clone(),
                created_at: now,
                updated_at: now,
            };
            s.presets.insert(id, preset.clone());
            Ok(preset)
        })
        .await
    }

    async fn find_preset(&self, id: DbId) -> Result<Option<Preset>, CoreError> {
        Ok(self.read(|s| s.presets.get(&id).cloned()).await)
    }

    async fn list_presets(&self) -> Result<Vec<Preset>, CoreError> {
        let mut presets = self.read(|s| s.presets.values().cloned().collect::<Vec<_>>()).await;
        presets.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(presets)
    }

    async fn create_project(&self, input: &CreateProject) -> Result<Project, CoreError> {
        self.write(|s, _| {
            s.claim_token(EntityKind::Project, &input.token)?;
            let settings_id = s.insert_settings(&input.settings);
            let id = s.next_id();
            let now = Utc::now();
            let project = Project {
                id,
                name: input.name.clone(),
                description: input.description.clone(),
                settings_id,
                token: input.token.clone(),
                created_at: now,
                updated_at: now,
            };
            s.projects.insert(id, project.clone());
            Ok(project)
        })
        .await
    }

    async fn find_project(&self, id: DbId) -> Result<Option<Project>, CoreError> {
        Ok(self.read(|s| s.projects.get(&id).cloned()).await)
    }

    async fn list_projects(&self) -> Result<Vec<Project>, CoreError> {
        // Newest first, matching the SQL ordering.
        Ok(self
            .read(|s| s.projects.values().rev().cloned().collect())
            .await)
    }

    async fn find_settings(&self, id: DbId) -> Result<Option<Settings>, CoreError> {
        Ok(self.read(|s| s.settings.get(&id).cloned()).await)
    }

    async fn create_session(
        &self,
        input: &CreateSession,
    ) -> Result<(Session, Vec<Participant>), CoreError> {
        self.write(|s, trip| {
            if !s.projects.contains_key(&input.project_id) {
                return Err(CoreError::Validation(format!(
                    "project {} does not exist",
                    input.project_id
                )));
            }
            s.claim_token(EntityKind::Session, &input.token)?;
            let id = s.next_id();
            let now = Utc::now();
            let session = Session {
                id,
                project_id: input.project_id,
                description: input.description.clone(),
                status_id: SessionStatus::Active.id(),
                token: input.token.clone(),
                created_at: now,
                updated_at: now,
            };
            s.sessions.insert(id, session.clone());

            let mut participants = Vec::with_capacity(input.participants.len());
            for p in &input.participants {
                s.claim_token(EntityKind::Participant, &p.token)?;
                let pid = s.next_id();
                let participant = Participant {
                    id: pid,
                    session_id: id,
                    name: p.name.clone(),
                    token: p.token.clone(),
                    has_accessed: false,
                    last_accessed: None,
                    has_submitted: false,
                    progress: 0.0,
                    created_at: now,
                    updated_at: now,
                };
                s.participants.insert(pid, participant.clone());
                participants.push(participant);
                trip.check(FailPoint::CreateSession)?;
            }
            Ok((session, participants))
        })
        .await
    }

    async fn find_session(&self, id: DbId) -> Result<Option<Session>, CoreError> {
        Ok(self.read(|s| s.sessions.get(&id).cloned()).await)
    }

    async fn list_sessions(&self, project_id: DbId) -> Result<Vec<Session>, CoreError> {
        Ok(self
            .read(|s| {
                s.sessions
                    .values()
                    .rev()
                    .filter(|r| r.project_id == project_id)
                    .cloned()
                    .collect()
            })
            .await)
    }

    async fn set_session_status(
        &self,
        id: DbId,
        status: SessionStatus,
    ) -> Result<Option<Session>, CoreError> {
        self.write(|s, _| {
            Ok(s.sessions.get_mut(&id).map(|session| {
                session.status_id = status.id();
                session.updated_at = Utc::now();
                session.clone()
            }))
        })
        .await
    }

    async fn find_participant(&self, id: DbId) -> Result<Option<Participant>, CoreError> {
        Ok(self.read(|s| s.participants.get(&id).cloned()).await)
    }

    async fn list_participants(&self, session_id: DbId) -> Result<Vec<Participant>, CoreError> {
        Ok(self
            .read(|s| {
                s.participants
                    .values()
                    .filter(|p| p.session_id == session_id)
                    .cloned()
                    .collect()
            })
            .await)
    }

    async fn mark_accessed(&self, id: DbId) -> Result<Option<Participant>, CoreError> {
        self.write(|s, _| {
            Ok(s.participants.get_mut(&id).map(|p| {
                let now = Utc::now();
                p.has_accessed = true;
                p.last_accessed = Some(now);
                p.updated_at = now;
                p.clone()
            }))
        })
        .await
    }

    async fn create_video(&self, input: &CreateVideo) -> Result<Video, CoreError> {
        self.write(|s, trip| {
            if !s.sessions.contains_key(&input.session_id) {
                return Err(CoreError::Validation(format!(
                    "session {} does not exist",
                    input.session_id
                )));
            }
            s.claim_token(EntityKind::Video, &input.token)?;
            trip.check(FailPoint::CreateVideo)?;
            let id = s.next_id();
            let now = Utc::now();
            let video = Video {
                id,
                session_id: input.session_id,
                filename: input.filename.clone(),
                filepath: input.filepath.clone(),
                token: input.token.clone(),
                duration: input.duration,
                frame_rate: input.frame_rate,
                created_at: now,
                updated_at: now,
            };
            s.videos.insert(id, video.clone());
            Ok(video)
        })
        .await
    }

    async fn find_video(&self, id: DbId) -> Result<Option<Video>, CoreError> {
        Ok(self.read(|s| s.videos.get(&id).cloned()).await)
    }

    async fn list_videos(&self, session_id: DbId) -> Result<Vec<Video>, CoreError> {
        Ok(self
            .read(|s| {
                s.videos
                    .values()
                    .filter(|v| v.session_id == session_id)
                    .cloned()
                    .collect()
            })
            .await)
    }

    async fn list_associations(
        &self,
        participant_ids: &[DbId],
    ) -> Result<Vec<Association>, CoreError> {
        Ok(self.read(|s| s.associations_for(participant_ids)).await)
    }

    async fn apply_assignment(
        &self,
        request: &AssignmentRequest,
    ) -> Result<Vec<Association>, CoreError> {
        self.write(|s, trip| {
            if let Some(&missing) = request
                .participants
                .iter()
                .find(|id| !s.participants.contains_key(id))
            {
                return Err(CoreError::NotFound {
                    entity: "Participant",
                    id: missing,
                });
            }
            if let Some(&missing) = request.videos.iter().find(|id| !s.videos.contains_key(id)) {
                return Err(CoreError::NotFound {
                    entity: "Video",
                    id: missing,
                });
            }

            let existing: Vec<AssociationState> = s
                .associations_for(&request.participants)
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

            let now = Utc::now();
            for (index, row) in plan.iter().enumerate() {
                let key = (row.participant_id, row.video_id);
                match s.associations.get_mut(&key) {
                    Some(current) => {
                        current.owner = current.owner || row.owner;
                        current.order = row.order;
                        current.updated_at = now;
                    }
                    None => {
                        let id = s.next_id();
                        s.associations.insert(
                            key,
                            Association {
                                id,
                                participant_id: row.participant_id,
                                video_id: row.video_id,
                                owner: row.owner,
                                order: row.order,
                                created_at: now,
                                updated_at: now,
                            },
                        );
                    }
                }
                if index == 0 {
                    trip.check(FailPoint::Assignment)?;
                }
            }

            Ok(s.associations_for(&request.participants))
        })
        .await
    }

    async fn record_submission(
        &self,
        participant_id: DbId,
        annotations: &[NewAnnotation],
        progress: Option<f64>,
    ) -> Result<SubmissionOutcome, CoreError> {
        self.write(|s, trip| {
            if !s.participants.contains_key(&participant_id) {
                return Err(CoreError::NotFound {
                    entity: "Participant",
                    id: participant_id,
                });
            }

            let mut keys: HashSet<_> = s
                .annotations
                .iter()
                .filter(|a| a.participant_id == participant_id)
                .map(|a| {
                    (
                        a.participant_id,
                        a.video_id,
                        a.timecode.to_bits(),
                        a.frame_number,
                    )
                })
                .collect();

            let now = Utc::now();
            let mut outcome = SubmissionOutcome::default();
            for a in annotations {
                if !keys.insert(a.identity()) {
                    outcome.duplicates += 1;
                    continue;
                }
                let id = s.next_id();
                s.annotations.push(Annotation {
                    id,
                    participant_id: a.participant_id,
                    video_id: a.video_id,
                    timecode: a.timecode,
                    frame_number: a.frame_number,
                    slider_position: a.slider_position,
                    created_at: now,
                    updated_at: now,
                });
                outcome.inserted += 1;
                if outcome.inserted == 1 {
                    trip.check(FailPoint::Submission)?;
                }
            }

            if let Some(p) = s.participants.get_mut(&participant_id) {
                p.has_submitted = true;
                if let Some(progress) = progress {
                    p.progress = progress;
                }
                p.updated_at = now;
            }
            Ok(outcome)
        })
        .await
    }

    async fn list_annotations(
        &self,
        participant_id: DbId,
        video_id: DbId,
    ) -> Result<Vec<Annotation>, CoreError> {
        Ok(self
            .read(|s| {
                s.annotations
                    .iter()
                    .filter(|a| a.participant_id == participant_id && a.video_id == video_id)
                    .cloned()
                    .collect()
            })
            .await)
    }

    async fn delete_session_tree(&self, id: DbId) -> Result<Option<Vec<String>>, CoreError> {
        self.write(|s, trip| {
            if !s.sessions.contains_key(&id) {
                return Ok(None);
            }
            let paths = s.delete_below_sessions(&[id]);
            trip.check(FailPoint::Teardown)?;
            s.sessions.remove(&id);
            Ok(Some(paths))
        })
        .await
    }

    async fn delete_project_tree(&self, id: DbId) -> Result<Option<Vec<String>>, CoreError> {
        self.write(|s, trip| {
            let Some(project) = s.projects.get(&id).cloned() else {
                return Ok(None);
            };
            let session_ids: Vec<DbId> = s
                .sessions
                .values()
                .filter(|r| r.project_id == id)
                .map(|r| r.id)
                .collect();
            let paths = s.delete_below_sessions(&session_ids);
            trip.check(FailPoint::Teardown)?;
            s.sessions.retain(|_, r| r.project_id != id);
            s.projects.remove(&id);
            s.settings.remove(&project.settings_id);
            Ok(Some(paths))
        })
        .await
    }
}
