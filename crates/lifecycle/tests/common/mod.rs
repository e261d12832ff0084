//! Shared fixtures for lifecycle tests.

#![allow(dead_code)]

use std::path::Path;

use corae_core::ffmpeg::{FfmpegError, VideoMetadata, VideoProbe};
use corae_core::settings::{Coupling, Ordering, SettingsOverrides};
use corae_core::storage::LocalBlobStore;
use corae_db::store::MemoryStore;
use corae_lifecycle::catalog::ProjectDetail;
use corae_lifecycle::{CreatedSession, NewSession, SessionSetup, StudyCatalog, VideoUpload};

/// Reports the same metadata for every file.
pub struct FixedProbe(pub VideoMetadata);

#[async_trait::async_trait]
impl VideoProbe for FixedProbe {
    async fn probe(&self, _path: &Path) -> Result<VideoMetadata, FfmpegError> {
        Ok(self.0)
    }
}

/// Behaves as if ffprobe is not installed.
pub struct MissingProbe;

#[async_trait::async_trait]
impl VideoProbe for MissingProbe {
    async fn probe(&self, _path: &Path) -> Result<VideoMetadata, FfmpegError> {
        Err(FfmpegError::NotFound(std::io::ErrorKind::NotFound.into()))
    }
}

pub fn clip_metadata() -> VideoMetadata {
    VideoMetadata {
        frame_rate: Some(30.0),
        duration: Some(12.5),
    }
}

/// A store, a blob root in a temp dir, and a probe with fixed metadata.
pub struct Harness {
    pub store: MemoryStore,
    pub blobs: LocalBlobStore,
    pub probe: FixedProbe,
    pub dir: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        Self {
            store: MemoryStore::new(),
            blobs: LocalBlobStore::new(dir.path()),
            probe: FixedProbe(clip_metadata()),
            dir,
        }
    }

    pub fn setup(&self) -> SessionSetup<'_> {
        SessionSetup::new(&self.store, &self.blobs, &self.probe)
    }

    pub async fn project(
        &self,
        coupling: Coupling,
        ordering: Ordering,
        capacity: i32,
    ) -> ProjectDetail {
        let overrides = SettingsOverrides {
            coupling: Some(coupling),
            ordering: Some(ordering),
            capacity: Some(capacity),
            ..Default::default()
        };
        StudyCatalog::new(&self.store)
            .create_project("Gaze study", None, None, &overrides)
            .await
            .unwrap()
    }

    pub async fn session(&self, project_id: i64, names: &[&str], files: &[&str]) -> CreatedSession {
        self.setup()
            .create_session(project_id, new_session(names, files))
            .await
            .unwrap()
    }

    /// Number of regular files below the blob root.
    pub fn stored_file_count(&self) -> usize {
        count_files(self.dir.path())
    }
}

pub fn new_session(names: &[&str], files: &[&str]) -> NewSession {
    NewSession {
        description: Some("Pilot".into()),
        participant_names: names.iter().map(|n| n.to_string()).collect(),
        uploads: files
            .iter()
            .map(|f| VideoUpload {
                filename: f.to_string(),
                bytes: f.as_bytes().to_vec(),
            })
            .collect(),
    }
}

fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|e| {
                    let path = e.path();
                    if path.is_dir() {
                        count_files(&path)
                    } else {
                        1
                    }
                })
                .sum()
        })
        .unwrap_or(0)
}
