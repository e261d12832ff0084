use crate::types::DbId;

/// Domain error shared by every layer of the study backend.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("No {entity} matches the supplied token")]
    TokenNotFound { entity: &'static str },

    #[error("Unable to generate a unique {entity} token after the maximum number of attempts")]
    TokenExhaustion { entity: &'static str },

    #[error(
        "Coupled assignment requires one video per participant: \
         got {participants} participants and {videos} videos"
    )]
    AssignmentMismatch { participants: usize, videos: usize },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage failure: {0}")]
    Storage(String),

    #[error("Video metadata probe failed: {0}")]
    MetadataProbe(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
