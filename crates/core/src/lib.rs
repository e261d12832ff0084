//! Domain logic for the CORAE study backend.
//!
//! Everything here is free of database access. Collaborators that touch the
//! outside world (video probing, blob storage) are expressed as traits so the
//! lifecycle engines can be driven by fakes in tests.

pub mod annotation;
pub mod assignment;
pub mod entity;
pub mod error;
pub mod export;
pub mod ffmpeg;
pub mod settings;
pub mod storage;
pub mod token;
pub mod types;
