mod common;

use assert_matches::assert_matches;
use corae_core::annotation::Submission;
use corae_core::error::CoreError;
use corae_core::settings::{Coupling, Ordering};
use corae_lifecycle::{AnnotationCollector, ExportAggregator};
use serde_json::json;

use common::Harness;

#[tokio::test]
async fn participant_export_lists_owned_then_queue() {
    let h = Harness::new();
    let project = h.project(Coupling::Coupled, Ordering::Ordered, 2).await;
    let created = h
        .session(project.project.id, &["Alice", "Bob"], &["a.mp4", "b.mp4"])
        .await;
    let alice = &created.participants[0];
    let submission: Submission = serde_json::from_value(json!({
        "annotations": {
            created.videos[1].id.to_string(): [
                {"timestamp": 1.0, "video_frame": 30, "slider_position": 3.0},
                {"timestamp": 0.5, "video_frame": 15, "slider_position": -2.0}
            ]
        }
    }))
    .unwrap();
    AnnotationCollector::new(&h.store)
        .accept_submission(alice.id, &submission)
        .await
        .unwrap();

    let export = ExportAggregator::new(&h.store)
        .export_participant(alice.id)
        .await
        .unwrap();

    assert_eq!(export.participant_external_id, "Alice");
    assert_eq!(export.participant_token, alice.token);
    assert_eq!(export.session_token, created.session.token);
    assert_eq!(export.project_token, project.project.token);

    let video_ids: Vec<_> = export.videos.iter().map(|v| v.video_id).collect();
    assert_eq!(video_ids, vec![created.videos[0].id, created.videos[1].id]);
    assert!(export.videos[0].annotations.is_empty());

    // Creation order, not timecode order.
    let frames: Vec<_> = export.videos[1].annotations.iter().map(|a| a.frame_number).collect();
    assert_eq!(frames, vec![30, 15]);
    assert_eq!(export.videos[1].frame_rate, Some(30.0));
}

#[tokio::test]
async fn export_bytes_are_stable() {
    let h = Harness::new();
    let project = h.project(Coupling::Decoupled, Ordering::Random, 3).await;
    let created = h
        .session(project.project.id, &["A", "B", "C"], &["1.mp4", "2.mp4"])
        .await;

    let exporter = ExportAggregator::new(&h.store);
    let session_id = created.session.id;
    let first = exporter.export_session_aggregate(session_id).await.unwrap();
    let second = exporter.export_session_aggregate(session_id).await.unwrap();
    let (first, second) = (
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap(),
    );
    assert_eq!(first, second);

    let aggregate: serde_json::Value = serde_json::from_slice(&first).unwrap();
    assert_eq!(aggregate["Number of Participants"], 3);
    assert_eq!(aggregate["Description"], "Pilot");
    assert_eq!(aggregate["Session ID"], created.session.id);
    assert_eq!(aggregate["Participants Data"][0]["participant_external_id"], "A");
}

#[tokio::test]
async fn token_from_another_session_is_rejected() {
    let h = Harness::new();
    let project = h.project(Coupling::Coupled, Ordering::Ordered, 2).await;
    let first = h.session(project.project.id, &["A"], &["1.mp4"]).await;
    let second = h.session(project.project.id, &["B"], &["2.mp4"]).await;

    let exporter = ExportAggregator::new(&h.store);
    let ok = exporter
        .export_participant_in_session(first.session.id, &first.participants[0].token)
        .await
        .unwrap();
    assert_eq!(ok.participant_internal_id, first.participants[0].id);

    let err = exporter
        .export_participant_in_session(first.session.id, &second.participants[0].token)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::TokenNotFound { .. });
}
