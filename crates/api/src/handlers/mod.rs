pub mod annotator;
pub mod download;
pub mod preset;
pub mod project;
pub mod session;
