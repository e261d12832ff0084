//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument. Methods suffixed `_in` take a
//! `&mut PgConnection` so a caller can compose them inside one transaction.

pub mod annotation_repo;
pub mod association_repo;
pub mod participant_repo;
pub mod preset_repo;
pub mod project_repo;
pub mod session_repo;
pub mod settings_repo;
pub mod teardown_repo;
pub mod token_repo;
pub mod video_repo;

pub use annotation_repo::AnnotationRepo;
pub use association_repo::AssociationRepo;
pub use participant_repo::ParticipantRepo;
pub use preset_repo::PresetRepo;
pub use project_repo::ProjectRepo;
pub use session_repo::SessionRepo;
pub use settings_repo::SettingsRepo;
pub use teardown_repo::TeardownRepo;
pub use token_repo::TokenRepo;
pub use video_repo::VideoRepo;
