//! Anonymous token issuance and verification.

use std::collections::HashSet;

use corae_core::entity::EntityKind;
use corae_core::error::CoreError;
use corae_core::token::{self, MAX_TOKEN_ATTEMPTS};
use corae_core::types::DbId;
use corae_db::models::participant::Participant;
use corae_db::store::EntityStore;

/// Issues and verifies per-kind tokens.
///
/// `G` draws candidates; the default draws random alphanumerics. Tests
/// substitute a deterministic generator to exercise collisions.
pub struct TokenIdentity<'a, G = fn() -> String> {
    store: &'a dyn EntityStore,
    generator: G,
}

impl<'a> TokenIdentity<'a> {
    pub fn new(store: &'a dyn EntityStore) -> Self {
        Self {
            store,
            generator: token::generate_candidate,
        }
    }
}

impl<'a, G> TokenIdentity<'a, G>
where
    G: Fn() -> String + Sync,
{
    pub fn with_generator(store: &'a dyn EntityStore, generator: G) -> Self {
        Self { store, generator }
    }

    /// Draw a token not yet used within `kind`'s namespace.
    ///
    /// Gives up with [`CoreError::TokenExhaustion`] after
    /// [`MAX_TOKEN_ATTEMPTS`] colliding candidates.
    pub async fn generate_token(&self, kind: EntityKind) -> Result<String, CoreError> {
        self.generate_excluding(kind, &HashSet::new()).await
    }

    /// Draw `count` distinct tokens, none yet used within `kind`'s namespace.
    pub async fn generate_tokens(
        &self,
        kind: EntityKind,
        count: usize,
    ) -> Result<Vec<String>, CoreError> {
        let mut issued = HashSet::with_capacity(count);
        let mut tokens = Vec::with_capacity(count);
        for _ in 0..count {
            let token = self.generate_excluding(kind, &issued).await?;
            issued.insert(token.clone());
            tokens.push(token);
        }
        Ok(tokens)
    }

    async fn generate_excluding(
        &self,
        kind: EntityKind,
        pending: &HashSet<String>,
    ) -> Result<String, CoreError> {
        for attempt in 1..=MAX_TOKEN_ATTEMPTS {
            let candidate = (self.generator)();
            if pending.contains(&candidate) || self.store.token_exists(kind, &candidate).await? {
                tracing::debug!(kind = kind.as_str(), attempt, "Token candidate collided");
                continue;
            }
            return Ok(candidate);
        }

        tracing::error!(
            kind = kind.as_str(),
            attempts = MAX_TOKEN_ATTEMPTS,
            "Token generation exhausted",
        );
        Err(CoreError::TokenExhaustion {
            entity: kind.label(),
        })
    }

    /// Resolve `token` to the id of the `kind` entity carrying it.
    pub async fn verify_token(&self, kind: EntityKind, token: &str) -> Result<DbId, CoreError> {
        let not_found = || CoreError::TokenNotFound {
            entity: kind.label(),
        };
        if !token::is_well_formed(token) {
            return Err(not_found());
        }
        self.store
            .find_id_by_token(kind, token)
            .await?
            .ok_or_else(not_found)
    }

    /// Join: verify a participant token and record the access.
    pub async fn resolve_participant(&self, token: &str) -> Result<Participant, CoreError> {
        let id = self.verify_token(EntityKind::Participant, token).await?;
        let participant = self
            .store
            .mark_accessed(id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Participant",
                id,
            })?;

        tracing::info!(
            participant_id = participant.id,
            session_id = participant.session_id,
            "Participant joined",
        );
        Ok(participant)
    }
}
