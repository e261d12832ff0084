//! Assignment engine: distributes a session's videos to its participants.

use corae_core::assignment::check_counts;
use corae_core::error::CoreError;
use corae_core::settings::{Coupling, Ordering};
use corae_core::types::DbId;
use corae_db::models::association::{Association, AssignmentRequest};
use corae_db::store::EntityStore;

use crate::context;

pub struct AssignmentEngine<'a> {
    store: &'a dyn EntityStore,
}

impl<'a> AssignmentEngine<'a> {
    pub fn new(store: &'a dyn EntityStore) -> Self {
        Self { store }
    }

    /// Build (or re-confirm) associations for `participants` over `videos`.
    ///
    /// In coupled mode participant `i` owns video `i`; a count mismatch fails
    /// before anything is written. The whole invocation is one transaction
    /// and repeating it with the same inputs leaves the stored state as is.
    pub async fn assign(
        &self,
        participants: &[DbId],
        videos: &[DbId],
        coupling: Coupling,
        ordering: Ordering,
    ) -> Result<Vec<Association>, CoreError> {
        check_counts(participants.len(), videos.len(), coupling)?;

        let rows = self
            .store
            .apply_assignment(&AssignmentRequest {
                participants: participants.to_vec(),
                videos: videos.to_vec(),
                coupling,
                ordering,
            })
            .await?;

        tracing::info!(
            participants = participants.len(),
            videos = videos.len(),
            coupling = coupling.as_str(),
            ordering = ordering.as_str(),
            associations = rows.len(),
            "Videos assigned",
        );
        Ok(rows)
    }

    /// Re-run assignment over a stored session with its project's settings.
    /// Participants and videos are taken in id order.
    pub async fn assign_session(&self, session_id: DbId) -> Result<Vec<Association>, CoreError> {
        let ctx = context::load_session(self.store, session_id).await?;
        let participants: Vec<DbId> = self
            .store
            .list_participants(session_id)
            .await?
            .iter()
            .map(|p| p.id)
            .collect();
        let videos: Vec<DbId> = self
            .store
            .list_videos(session_id)
            .await?
            .iter()
            .map(|v| v.id)
            .collect();

        self.assign(
            &participants,
            &videos,
            ctx.settings.coupling,
            ctx.settings.ordering,
        )
        .await
    }
}
