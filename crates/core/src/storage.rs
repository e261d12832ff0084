//! Stored video files.
//!
//! Uploaded clips live below a single root directory at
//! `{root}/{project_id}/{session_id}/{token}.{ext}`. The database stores the
//! path relative to the root so the root can move between deployments.

use std::path::{Component, Path, PathBuf};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Container extensions accepted for upload (lowercase, no dot).
pub const ALLOWED_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "flv", "mkv"];

/// Default upload root, relative to the working directory.
pub const DEFAULT_UPLOADS_DIR: &str = "instance/uploads";

// ---------------------------------------------------------------------------
// Validation and layout
// ---------------------------------------------------------------------------

/// Return the lowercase extension of `filename` if it is an accepted container.
pub fn validate_video_extension(filename: &str) -> Result<String, CoreError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(CoreError::Validation(format!(
            "File '{filename}' has an unsupported type. Allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )))
    }
}

/// Relative storage path for a video.
pub fn video_relative_path(project_id: DbId, session_id: DbId, token: &str, ext: &str) -> PathBuf {
    PathBuf::from(project_id.to_string())
        .join(session_id.to_string())
        .join(format!("{token}.{ext}"))
}

/// Reject absolute paths and any `..` component.
fn ensure_contained(relative: &Path) -> Result<(), CoreError> {
    let escapes = relative.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes || relative.as_os_str().is_empty() {
        return Err(CoreError::Validation(format!(
            "Storage path '{}' is not a relative path below the uploads root",
            relative.display()
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Blob store collaborator
// ---------------------------------------------------------------------------

/// Byte storage for uploaded videos, addressed by relative path.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `bytes` to `relative`, creating parent directories.
    /// Returns the stored relative path.
    async fn save(&self, bytes: &[u8], relative: &Path) -> Result<PathBuf, CoreError>;

    /// Remove the blob at `relative`.
    async fn delete(&self, relative: &Path) -> Result<(), CoreError>;

    /// Absolute location of `relative`, for collaborators that need a real file.
    fn resolve(&self, relative: &Path) -> PathBuf;
}

/// [`BlobStore`] on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait::async_trait]
impl BlobStore for LocalBlobStore {
    async fn save(&self, bytes: &[u8], relative: &Path) -> Result<PathBuf, CoreError> {
        ensure_contained(relative)?;
        let target = self.root.join(relative);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                CoreError::Storage(format!("creating {}: {e}", parent.display()))
            })?;
        }
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| CoreError::Storage(format!("writing {}: {e}", target.display())))?;
        Ok(relative.to_path_buf())
    }

    async fn delete(&self, relative: &Path) -> Result<(), CoreError> {
        ensure_contained(relative)?;
        let target = self.root.join(relative);
        tokio::fs::remove_file(&target)
            .await
            .map_err(|e| CoreError::Storage(format!("removing {}: {e}", target.display())))
    }

    fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }
}
