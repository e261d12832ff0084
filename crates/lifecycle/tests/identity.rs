mod common;

use std::collections::HashSet;

use assert_matches::assert_matches;
use corae_core::entity::EntityKind;
use corae_core::error::CoreError;
use corae_core::settings::{Coupling, Ordering};
use corae_db::store::{EntityStore, MemoryStore};
use corae_lifecycle::TokenIdentity;

use common::Harness;

#[tokio::test]
async fn ten_thousand_tokens_are_distinct() {
    let store = MemoryStore::new();
    let tokens = TokenIdentity::new(&store)
        .generate_tokens(EntityKind::Participant, 10_000)
        .await
        .unwrap();

    let unique: HashSet<_> = tokens.iter().collect();
    assert_eq!(unique.len(), 10_000);
}

#[tokio::test]
async fn constant_generator_exhausts_against_existing_token() {
    let h = Harness::new();
    let project = h.project(Coupling::Coupled, Ordering::Ordered, 2).await;
    let taken = project.project.token.clone();

    let identity = TokenIdentity::with_generator(&h.store, move || taken.clone());
    let err = identity.generate_token(EntityKind::Project).await.unwrap_err();
    assert_matches!(err, CoreError::TokenExhaustion { .. });

    // Other namespaces are independent.
    assert!(identity.generate_token(EntityKind::Session).await.is_ok());
}

#[tokio::test]
async fn constant_generator_cannot_fill_a_batch() {
    let store = MemoryStore::new();
    let identity = TokenIdentity::with_generator(&store, || "SameSame".to_string());
    let err = identity
        .generate_tokens(EntityKind::Participant, 2)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::TokenExhaustion { .. });
}

#[tokio::test]
async fn join_marks_participant_accessed() {
    let h = Harness::new();
    let project = h.project(Coupling::Coupled, Ordering::Ordered, 2).await;
    let created = h.session(project.project.id, &["A"], &["1.mp4"]).await;
    let token = &created.participants[0].token;
    assert!(!created.participants[0].has_accessed);

    let joined = TokenIdentity::new(&h.store)
        .resolve_participant(token)
        .await
        .unwrap();
    assert!(joined.has_accessed);
    assert!(joined.last_accessed.is_some());

    let stored = h.store.find_participant(joined.id).await.unwrap().unwrap();
    assert!(stored.has_accessed);
}

#[tokio::test]
async fn unknown_or_malformed_tokens_are_not_found() {
    let store = MemoryStore::new();
    let identity = TokenIdentity::new(&store);

    for token in ["NoSuch01", "", "has spaces!"] {
        let err = identity
            .verify_token(EntityKind::Participant, token)
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::TokenNotFound { entity: "Participant" });
    }
}
