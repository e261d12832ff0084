mod common;

use assert_matches::assert_matches;
use corae_core::error::CoreError;
use corae_core::settings::{Coupling, Ordering};
use corae_core::storage::BlobStore;
use corae_db::models::status::SessionStatus;
use corae_db::store::{EntityStore, FailPoint};
use corae_lifecycle::{SessionSetup, StudyCatalog};

use common::{new_session, Harness, MissingProbe};

#[tokio::test]
async fn creates_participants_videos_and_associations() {
    let h = Harness::new();
    let project = h.project(Coupling::Coupled, Ordering::Ordered, 3).await;

    let created = h
        .session(project.project.id, &["P1", "P2", "P3"], &["a.mp4", "b.mov", "c.mkv"])
        .await;

    assert_eq!(created.participants.len(), 3);
    assert_eq!(created.videos.len(), 3);
    assert_eq!(created.associations.len(), 9);
    assert_eq!(created.session.description.as_deref(), Some("Pilot"));
    assert_eq!(h.stored_file_count(), 3);

    for video in &created.videos {
        assert_eq!(video.frame_rate, Some(30.0));
        assert_eq!(video.duration, Some(12.5));
        assert!(h.blobs.resolve(std::path::Path::new(&video.filepath)).exists());
    }
}

#[tokio::test]
async fn failed_probe_stores_video_without_metadata() {
    let h = Harness::new();
    let project = h.project(Coupling::Coupled, Ordering::Ordered, 2).await;

    let created = SessionSetup::new(&h.store, &h.blobs, &MissingProbe)
        .create_session(project.project.id, new_session(&["A"], &["a.mp4"]))
        .await
        .unwrap();

    assert_eq!(created.videos[0].frame_rate, None);
    assert_eq!(created.videos[0].duration, None);
}

#[tokio::test]
async fn invalid_input_writes_nothing() {
    let h = Harness::new();
    let project = h.project(Coupling::Coupled, Ordering::Ordered, 2).await;

    let err = h
        .setup()
        .create_session(project.project.id, new_session(&["A", "B"], &["a.mp4"]))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::AssignmentMismatch { participants: 2, videos: 1 });

    let err = h
        .setup()
        .create_session(project.project.id, new_session(&["A"], &["a.txt"]))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Validation(_));

    assert!(h.store.list_sessions(project.project.id).await.unwrap().is_empty());
    assert_eq!(h.stored_file_count(), 0);
}

#[tokio::test]
async fn unknown_project_is_not_found() {
    let h = Harness::new();
    let err = h
        .setup()
        .create_session(404, new_session(&["A"], &["a.mp4"]))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::NotFound { entity: "Project", id: 404 });
}

#[tokio::test]
async fn video_failure_rolls_back_rows_and_files() {
    let h = Harness::new();
    let project = h.project(Coupling::Coupled, Ordering::Ordered, 2).await;
    h.store.arm_failure(FailPoint::CreateVideo).await;

    let err = h
        .setup()
        .create_session(project.project.id, new_session(&["A", "B"], &["a.mp4", "b.mp4"]))
        .await
        .unwrap_err();

    assert_matches!(err, CoreError::Storage(_));
    assert!(h.store.list_sessions(project.project.id).await.unwrap().is_empty());
    assert_eq!(h.store.association_count().await, 0);
    assert_eq!(h.stored_file_count(), 0);
}

#[tokio::test]
async fn assignment_failure_rolls_back_session() {
    let h = Harness::new();
    let project = h.project(Coupling::Coupled, Ordering::Random, 2).await;
    h.store.arm_failure(FailPoint::Assignment).await;

    let err = h
        .setup()
        .create_session(project.project.id, new_session(&["A", "B"], &["a.mp4", "b.mp4"]))
        .await
        .unwrap_err();

    assert_matches!(err, CoreError::Storage(_));
    assert!(h.store.list_sessions(project.project.id).await.unwrap().is_empty());
    assert_eq!(h.store.association_count().await, 0);
    assert_eq!(h.stored_file_count(), 0);
}

#[tokio::test]
async fn toggle_status_flips_between_active_and_archived() {
    let h = Harness::new();
    let project = h.project(Coupling::Coupled, Ordering::Ordered, 2).await;
    let created = h.session(project.project.id, &["A"], &["a.mp4"]).await;
    assert_eq!(created.session.status(), SessionStatus::Active);

    let archived = h.setup().toggle_session_status(created.session.id).await.unwrap();
    assert_eq!(archived.status(), SessionStatus::Archived);

    let active = h.setup().toggle_session_status(created.session.id).await.unwrap();
    assert_eq!(active.status(), SessionStatus::Active);
}

#[tokio::test]
async fn session_detail_lists_children() {
    let h = Harness::new();
    let project = h.project(Coupling::Decoupled, Ordering::Ordered, 2).await;
    let created = h.session(project.project.id, &["A", "B"], &["a.mp4"]).await;

    let detail = StudyCatalog::new(&h.store)
        .get_session(created.session.id)
        .await
        .unwrap();
    assert_eq!(detail.status, "active");
    assert_eq!(detail.participants.len(), 2);
    assert_eq!(detail.videos.len(), 1);
}
