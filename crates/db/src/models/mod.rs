//! Row structs and insert DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus the input struct its repository inserts from.

pub mod annotation;
pub mod association;
pub mod participant;
pub mod preset;
pub mod project;
pub mod session;
pub mod settings;
pub mod status;
pub mod video;
