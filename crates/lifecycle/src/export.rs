//! Read-only export documents.

use corae_core::assignment::{sort_for_viewing, AssociationState};
use corae_core::entity::EntityKind;
use corae_core::error::CoreError;
use corae_core::export::{AnnotationExport, ParticipantExport, SessionExport, VideoExport};
use corae_core::types::DbId;
use corae_db::models::participant::Participant;
use corae_db::models::project::Project;
use corae_db::models::session::Session;
use corae_db::store::EntityStore;

use crate::context;
use crate::identity::TokenIdentity;

pub struct ExportAggregator<'a> {
    store: &'a dyn EntityStore,
}

impl<'a> ExportAggregator<'a> {
    pub fn new(store: &'a dyn EntityStore) -> Self {
        Self { store }
    }

    /// Everything one participant recorded. Videos are listed owned first,
    /// then by queue order, then by id; annotations in creation order.
    pub async fn export_participant(
        &self,
        participant_id: DbId,
    ) -> Result<ParticipantExport, CoreError> {
        let ctx = context::load_participant(self.store, participant_id).await?;
        self.build(&ctx.participant, &ctx.session, &ctx.project).await
    }

    /// Export the participant holding `token`, which must belong to
    /// `session_id`.
    pub async fn export_participant_in_session(
        &self,
        session_id: DbId,
        token: &str,
    ) -> Result<ParticipantExport, CoreError> {
        let participant_id = TokenIdentity::new(self.store)
            .verify_token(EntityKind::Participant, token)
            .await?;
        let ctx = context::load_participant(self.store, participant_id).await?;
        if ctx.session.id != session_id {
            tracing::warn!(
                participant_id,
                session_id,
                "Participant does not belong to the requested session",
            );
            return Err(CoreError::TokenNotFound {
                entity: EntityKind::Participant.label(),
            });
        }
        self.build(&ctx.participant, &ctx.session, &ctx.project).await
    }

    /// Every participant of a session, in id order.
    pub async fn export_session_aggregate(
        &self,
        session_id: DbId,
    ) -> Result<SessionExport, CoreError> {
        let ctx = context::load_session(self.store, session_id).await?;
        let participants = self.store.list_participants(session_id).await?;

        let mut documents = Vec::with_capacity(participants.len());
        for participant in &participants {
            documents.push(self.build(participant, &ctx.session, &ctx.project).await?);
        }

        Ok(SessionExport {
            session_id,
            description: ctx.session.description.clone(),
            participant_count: documents.len(),
            participants: documents,
        })
    }

    async fn build(
        &self,
        participant: &Participant,
        session: &Session,
        project: &Project,
    ) -> Result<ParticipantExport, CoreError> {
        let mut associations: Vec<AssociationState> = self
            .store
            .list_associations(&[participant.id])
            .await?
            .iter()
            .map(|a| a.state())
            .collect();
        sort_for_viewing(&mut associations);

        let mut videos = Vec::with_capacity(associations.len());
        for association in &associations {
            let video = self
                .store
                .find_video(association.video_id)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "Video",
                    id: association.video_id,
                })?;
            let annotations = self
                .store
                .list_annotations(participant.id, video.id)
                .await?
                .into_iter()
                .map(|a| AnnotationExport {
                    timecode: a.timecode,
                    frame_number: a.frame_number,
                    slider_position: a.slider_position,
                })
                .collect();

            videos.push(VideoExport {
                video_id: video.id,
                duration: video.duration,
                frame_rate: video.frame_rate,
                annotations,
            });
        }

        Ok(ParticipantExport {
            participant_external_id: participant.name.clone(),
            participant_internal_id: participant.id,
            project_id: project.id,
            project_token: project.token.clone(),
            session_id: session.id,
            session_token: session.token.clone(),
            participant_token: participant.token.clone(),
            videos,
        })
    }
}
