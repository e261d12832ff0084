//! Participant/video assignment planning.
//!
//! [`plan_assignment`] computes the complete association set for a session
//! from the participant list, the video pool, the coupling/ordering policy
//! and whatever associations already exist. It performs no I/O; the caller
//! applies the returned rows atomically with upsert-by-key semantics.
//!
//! Invariants of the produced plan:
//!
//! - exactly one row per (participant, pool video) pair;
//! - in coupled mode participant `i` owns video `i`, and an owner flag that is
//!   already set is never cleared;
//! - each participant's non-owned rows carry `order = 1..K` contiguously;
//! - owned rows carry no order;
//! - an existing valid `1..K` ordering is preserved, so planning against the
//!   output of a previous plan reproduces it exactly.

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::error::CoreError;
use crate::settings::{Coupling, Ordering};
use crate::types::DbId;

/// State of one participant/video association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AssociationState {
    pub participant_id: DbId,
    pub video_id: DbId,
    pub owner: bool,
    pub order: Option<i32>,
}

/// Everything the planner needs to know about one invocation.
#[derive(Debug, Clone, Copy)]
pub struct AssignmentInput<'a> {
    pub participants: &'a [DbId],
    pub videos: &'a [DbId],
    pub coupling: Coupling,
    pub ordering: Ordering,
    pub existing: &'a [AssociationState],
}

/// Check the coupled-mode count precondition.
pub fn check_counts(
    participants: usize,
    videos: usize,
    coupling: Coupling,
) -> Result<(), CoreError> {
    if coupling == Coupling::Coupled && participants != videos {
        return Err(CoreError::AssignmentMismatch {
            participants,
            videos,
        });
    }
    Ok(())
}

/// Compute the full association set for `input`.
///
/// `rng` is only consulted for participants in random mode whose queue has
/// no valid existing ordering.
pub fn plan_assignment<R: Rng + ?Sized>(
    input: &AssignmentInput<'_>,
    rng: &mut R,
) -> Result<Vec<AssociationState>, CoreError> {
    check_counts(input.participants.len(), input.videos.len(), input.coupling)?;
    ensure_distinct("participant", input.participants)?;
    ensure_distinct("video", input.videos)?;

    let existing: HashMap<(DbId, DbId), &AssociationState> = input
        .existing
        .iter()
        .map(|a| ((a.participant_id, a.video_id), a))
        .collect();

    let mut plan = Vec::with_capacity(input.participants.len() * input.videos.len());

    for (index, &participant_id) in input.participants.iter().enumerate() {
        let owned = owned_videos(input, index, participant_id)?;

        for &video_id in &owned {
            plan.push(AssociationState {
                participant_id,
                video_id,
                owner: true,
                order: None,
            });
        }

        let queue: Vec<DbId> = input
            .videos
            .iter()
            .copied()
            .filter(|v| !owned.contains(v))
            .collect();

        let orders = match preserved_orders(&queue, participant_id, &existing) {
            Some(orders) => orders,
            None => fresh_orders(queue.len(), input.ordering, rng),
        };

        for (video_id, order) in queue.into_iter().zip(orders) {
            plan.push(AssociationState {
                participant_id,
                video_id,
                owner: false,
                order: Some(order),
            });
        }
    }

    Ok(plan)
}

/// Sort associations into viewing order: owned rows first, then ascending
/// `order`, ties broken by video id.
pub fn sort_for_viewing(associations: &mut [AssociationState]) {
    associations.sort_by_key(|a| (a.order.is_some(), a.order.unwrap_or(0), a.video_id));
}

/// Videos `participant_id` owns after this invocation.
fn owned_videos(
    input: &AssignmentInput<'_>,
    index: usize,
    participant_id: DbId,
) -> Result<Vec<DbId>, CoreError> {
    let already_owned: Vec<DbId> = input
        .existing
        .iter()
        .filter(|a| a.participant_id == participant_id && a.owner)
        .map(|a| a.video_id)
        .collect();

    match input.coupling {
        Coupling::Coupled => {
            let contributed = input.videos[index];
            if let Some(other) = already_owned.iter().find(|&&v| v != contributed) {
                return Err(CoreError::Conflict(format!(
                    "participant {participant_id} already owns video {other}; \
                     cannot assign ownership of video {contributed}"
                )));
            }
            Ok(vec![contributed])
        }
        // Ownership is immutable, so rows owned earlier stay owned.
        Coupling::Decoupled => Ok(input
            .videos
            .iter()
            .copied()
            .filter(|v| already_owned.contains(v))
            .collect()),
    }
}

/// Existing orders for `queue` if they already form exactly `1..=K`.
fn preserved_orders(
    queue: &[DbId],
    participant_id: DbId,
    existing: &HashMap<(DbId, DbId), &AssociationState>,
) -> Option<Vec<i32>> {
    let orders: Vec<i32> = queue
        .iter()
        .map(|&video_id| {
            existing
                .get(&(participant_id, video_id))
                .filter(|a| !a.owner)
                .and_then(|a| a.order)
        })
        .collect::<Option<_>>()?;

    let mut sorted = orders.clone();
    sorted.sort_unstable();
    let contiguous = sorted
        .iter()
        .enumerate()
        .all(|(i, &order)| i64::from(order) == i as i64 + 1);

    contiguous.then_some(orders)
}

/// Orders `1..=len`, shuffled in random mode.
fn fresh_orders<R: Rng + ?Sized>(len: usize, ordering: Ordering, rng: &mut R) -> Vec<i32> {
    let mut orders: Vec<i32> = (1..=len as i32).collect();
    if ordering == Ordering::Random {
        orders.shuffle(rng);
    }
    orders
}

fn ensure_distinct(what: &str, ids: &[DbId]) -> Result<(), CoreError> {
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id) {
            return Err(CoreError::Validation(format!(
                "{what} {id} appears more than once in the assignment input"
            )));
        }
    }
    Ok(())
}
