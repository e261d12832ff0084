mod common;

use std::collections::HashSet;

use assert_matches::assert_matches;
use corae_core::assignment::AssociationState;
use corae_core::error::CoreError;
use corae_core::settings::{Coupling, Ordering};
use corae_db::store::{EntityStore, FailPoint};
use corae_lifecycle::{AnnotationCollector, AssignmentEngine};

use common::Harness;

fn states(rows: &[corae_db::models::association::Association]) -> Vec<AssociationState> {
    rows.iter().map(|a| a.state()).collect()
}

#[tokio::test]
async fn coupled_three_by_three() {
    let h = Harness::new();
    let project = h.project(Coupling::Coupled, Ordering::Random, 3).await;
    let created = h
        .session(project.project.id, &["P1", "P2", "P3"], &["1.mp4", "2.mp4", "3.mp4"])
        .await;

    for (i, participant) in created.participants.iter().enumerate() {
        let mine: Vec<_> = created
            .associations
            .iter()
            .filter(|a| a.participant_id == participant.id)
            .collect();
        assert_eq!(mine.len(), 3);

        let owned: Vec<_> = mine.iter().filter(|a| a.owner).collect();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].video_id, created.videos[i].id);
        assert_eq!(owned[0].order, None);

        let mut orders: Vec<i32> =
            mine.iter().filter(|a| !a.owner).filter_map(|a| a.order).collect();
        orders.sort_unstable();
        assert_eq!(orders, vec![1, 2]);
    }
}

#[tokio::test]
async fn reassignment_is_idempotent() {
    let h = Harness::new();
    let project = h.project(Coupling::Coupled, Ordering::Random, 3).await;
    let created = h
        .session(project.project.id, &["P1", "P2", "P3"], &["1.mp4", "2.mp4", "3.mp4"])
        .await;

    let engine = AssignmentEngine::new(&h.store);
    let again = engine.assign_session(created.session.id).await.unwrap();
    let third = engine.assign_session(created.session.id).await.unwrap();

    assert_eq!(states(&created.associations), states(&again));
    assert_eq!(states(&again), states(&third));
    assert_eq!(h.store.association_count().await, 9);
}

#[tokio::test]
async fn alice_and_bob_each_annotate_the_other() {
    let h = Harness::new();
    let project = h.project(Coupling::Coupled, Ordering::Random, 2).await;
    let created = h
        .session(project.project.id, &["Alice", "Bob"], &["alice.mp4", "bob.mp4"])
        .await;
    let (alice, bob) = (&created.participants[0], &created.participants[1]);
    let (alice_clip, bob_clip) = (&created.videos[0], &created.videos[1]);

    let collector = AnnotationCollector::new(&h.store);
    let alice_queue = collector.participant_queue(alice.id).await.unwrap();
    let bob_queue = collector.participant_queue(bob.id).await.unwrap();

    assert_eq!(alice_queue.len(), 1);
    assert_eq!(alice_queue[0].video.id, bob_clip.id);
    assert_eq!(alice_queue[0].order, 1);
    assert_eq!(bob_queue.len(), 1);
    assert_eq!(bob_queue[0].video.id, alice_clip.id);
}

#[tokio::test]
async fn decoupled_pool_goes_to_everyone_in_order() {
    let h = Harness::new();
    let project = h.project(Coupling::Decoupled, Ordering::Ordered, 2).await;
    let created = h
        .session(project.project.id, &["A", "B"], &["1.mp4", "2.mp4", "3.mp4"])
        .await;

    let collector = AnnotationCollector::new(&h.store);
    for participant in &created.participants {
        let queue = collector.participant_queue(participant.id).await.unwrap();
        let ids: Vec<_> = queue.iter().map(|q| q.video.id).collect();
        let expected: Vec<_> = created.videos.iter().map(|v| v.id).collect();
        assert_eq!(ids, expected);
    }
    assert!(created.associations.iter().all(|a| !a.owner));
}

#[tokio::test]
async fn random_queues_are_permutations() {
    let h = Harness::new();
    let project = h.project(Coupling::Decoupled, Ordering::Random, 2).await;
    let created = h
        .session(project.project.id, &["A", "B"], &["1.mp4", "2.mp4", "3.mp4", "4.mp4"])
        .await;

    let pool: HashSet<_> = created.videos.iter().map(|v| v.id).collect();
    let collector = AnnotationCollector::new(&h.store);
    for participant in &created.participants {
        let queue = collector.participant_queue(participant.id).await.unwrap();
        let ids: HashSet<_> = queue.iter().map(|q| q.video.id).collect();
        let orders: Vec<_> = queue.iter().map(|q| q.order).collect();
        assert_eq!(ids, pool);
        assert_eq!(orders, vec![1, 2, 3, 4]);
    }
}

#[tokio::test]
async fn mismatch_is_rejected_before_writing() {
    let h = Harness::new();
    let project = h.project(Coupling::Coupled, Ordering::Ordered, 3).await;
    let created = h.session(project.project.id, &["A", "B"], &["1.mp4", "2.mp4"]).await;
    let before = h.store.association_count().await;

    let ids: Vec<_> = created.participants.iter().map(|p| p.id).collect();
    let err = AssignmentEngine::new(&h.store)
        .assign(&ids, &[created.videos[0].id], Coupling::Coupled, Ordering::Ordered)
        .await
        .unwrap_err();

    assert_matches!(err, CoreError::AssignmentMismatch { participants: 2, videos: 1 });
    assert_eq!(h.store.association_count().await, before);
}

#[tokio::test]
async fn failed_invocation_leaves_previous_state() {
    let h = Harness::new();
    let project = h.project(Coupling::Decoupled, Ordering::Random, 2).await;
    let created = h.session(project.project.id, &["A", "B"], &["1.mp4", "2.mp4"]).await;
    let ids: Vec<_> = created.participants.iter().map(|p| p.id).collect();
    let before = states(&h.store.list_associations(&ids).await.unwrap());

    h.store.arm_failure(FailPoint::Assignment).await;
    let err = AssignmentEngine::new(&h.store)
        .assign_session(created.session.id)
        .await
        .unwrap_err();

    assert_matches!(err, CoreError::Storage(_));
    assert_eq!(states(&h.store.list_associations(&ids).await.unwrap()), before);
}

#[tokio::test]
async fn concurrent_reassignment_matches_single_run() {
    let h = Harness::new();
    let project = h.project(Coupling::Coupled, Ordering::Random, 3).await;
    let created = h
        .session(project.project.id, &["P1", "P2", "P3"], &["1.mp4", "2.mp4", "3.mp4"])
        .await;

    let engine = AssignmentEngine::new(&h.store);
    let (first, second) = tokio::join!(
        engine.assign_session(created.session.id),
        engine.assign_session(created.session.id),
    );

    assert_eq!(states(&first.unwrap()), states(&created.associations));
    assert_eq!(states(&second.unwrap()), states(&created.associations));
    assert_eq!(h.store.association_count().await, 9);
}
