//! Session assignment and annotation lifecycle.
//!
//! Each engine borrows its collaborators (`&dyn EntityStore` and, where
//! needed, blob storage and the video probe) for the duration of one request.
//! None of them hold state between calls.

pub mod assignment;
pub mod catalog;
pub mod collector;
pub mod context;
pub mod export;
pub mod identity;
pub mod setup;
pub mod teardown;

pub use assignment::AssignmentEngine;
pub use catalog::StudyCatalog;
pub use collector::{AnnotationCollector, SubmissionReport};
pub use export::ExportAggregator;
pub use identity::TokenIdentity;
pub use setup::{CreatedSession, NewSession, SessionSetup, VideoUpload};
pub use teardown::{Teardown, TeardownReport};
