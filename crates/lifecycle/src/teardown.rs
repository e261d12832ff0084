//! Subtree deletion with file cleanup.
//!
//! Rows are removed in one store transaction first; files are removed
//! afterwards. A file that cannot be removed is logged and counted but does
//! not fail the deletion, since the rows referencing it are already gone.

use std::path::Path;

use corae_core::error::CoreError;
use corae_core::storage::BlobStore;
use corae_core::types::DbId;
use corae_db::store::EntityStore;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    pub files_removed: usize,
    /// Paths whose removal failed.
    pub files_failed: Vec<String>,
}

pub struct Teardown<'a> {
    store: &'a dyn EntityStore,
    blobs: &'a dyn BlobStore,
}

impl<'a> Teardown<'a> {
    pub fn new(store: &'a dyn EntityStore, blobs: &'a dyn BlobStore) -> Self {
        Self { store, blobs }
    }

    pub async fn delete_project(&self, project_id: DbId) -> Result<TeardownReport, CoreError> {
        let paths = self
            .store
            .delete_project_tree(project_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Project",
                id: project_id,
            })?;
        let report = self.remove_files(&paths).await;
        tracing::info!(
            project_id,
            files_removed = report.files_removed,
            files_failed = report.files_failed.len(),
            "Project deleted",
        );
        Ok(report)
    }

    pub async fn delete_session(&self, session_id: DbId) -> Result<TeardownReport, CoreError> {
        let paths = self
            .store
            .delete_session_tree(session_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Session",
                id: session_id,
            })?;
        let report = self.remove_files(&paths).await;
        tracing::info!(
            session_id,
            files_removed = report.files_removed,
            files_failed = report.files_failed.len(),
            "Session deleted",
        );
        Ok(report)
    }

    /// Remove stored files, logging failures.
    pub(crate) async fn remove_files(&self, paths: &[String]) -> TeardownReport {
        let mut report = TeardownReport::default();
        for path in paths {
            match self.blobs.delete(Path::new(path)).await {
                Ok(()) => report.files_removed += 1,
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Failed to remove stored video");
                    report.files_failed.push(path.clone());
                }
            }
        }
        report
    }
}
