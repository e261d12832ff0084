mod common;

use std::path::Path;

use assert_matches::assert_matches;
use corae_core::error::CoreError;
use corae_core::settings::{Coupling, Ordering};
use corae_core::storage::BlobStore;
use corae_db::store::{EntityStore, FailPoint};
use corae_lifecycle::{Teardown, TeardownReport};

use common::Harness;

#[tokio::test]
async fn deleting_session_removes_rows_and_files() {
    let h = Harness::new();
    let project = h.project(Coupling::Coupled, Ordering::Ordered, 2).await;
    let created = h
        .session(project.project.id, &["A", "B"], &["1.mp4", "2.mp4"])
        .await;
    assert_eq!(h.stored_file_count(), 2);

    let report = Teardown::new(&h.store, &h.blobs)
        .delete_session(created.session.id)
        .await
        .unwrap();

    assert_eq!(report, TeardownReport { files_removed: 2, files_failed: vec![] });
    assert_eq!(h.stored_file_count(), 0);
    assert!(h.store.find_session(created.session.id).await.unwrap().is_none());
    assert!(h.store.find_participant(created.participants[0].id).await.unwrap().is_none());
    assert_eq!(h.store.association_count().await, 0);
    // The project survives.
    assert!(h.store.find_project(project.project.id).await.unwrap().is_some());
}

#[tokio::test]
async fn deleting_project_removes_every_session() {
    let h = Harness::new();
    let project = h.project(Coupling::Coupled, Ordering::Ordered, 2).await;
    h.session(project.project.id, &["A"], &["1.mp4"]).await;
    h.session(project.project.id, &["B"], &["2.mp4"]).await;

    let report = Teardown::new(&h.store, &h.blobs)
        .delete_project(project.project.id)
        .await
        .unwrap();

    assert_eq!(report.files_removed, 2);
    assert!(h.store.find_project(project.project.id).await.unwrap().is_none());
    assert!(h.store.find_settings(project.project.settings_id).await.unwrap().is_none());
    assert_eq!(h.stored_file_count(), 0);
}

#[tokio::test]
async fn missing_file_is_reported_not_fatal() {
    let h = Harness::new();
    let project = h.project(Coupling::Coupled, Ordering::Ordered, 2).await;
    let created = h
        .session(project.project.id, &["A", "B"], &["1.mp4", "2.mp4"])
        .await;
    let gone = &created.videos[0].filepath;
    std::fs::remove_file(h.blobs.resolve(Path::new(gone))).unwrap();

    let report = Teardown::new(&h.store, &h.blobs)
        .delete_session(created.session.id)
        .await
        .unwrap();

    assert_eq!(report.files_removed, 1);
    assert_eq!(report.files_failed, vec![gone.clone()]);
    assert!(h.store.find_session(created.session.id).await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let h = Harness::new();
    let err = Teardown::new(&h.store, &h.blobs)
        .delete_session(77)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::NotFound { entity: "Session", id: 77 });
}

#[tokio::test]
async fn failed_delete_keeps_rows_and_files() {
    let h = Harness::new();
    let project = h.project(Coupling::Coupled, Ordering::Ordered, 2).await;
    let created = h
        .session(project.project.id, &["A", "B"], &["1.mp4", "2.mp4"])
        .await;
    h.store.arm_failure(FailPoint::Teardown).await;

    let err = Teardown::new(&h.store, &h.blobs)
        .delete_session(created.session.id)
        .await
        .unwrap_err();

    assert_matches!(err, CoreError::Storage(_));
    assert_eq!(h.stored_file_count(), 2);
    assert!(h.store.find_session(created.session.id).await.unwrap().is_some());
    assert_eq!(h.store.association_count().await, 4);
}
