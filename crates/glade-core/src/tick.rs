//! Single-tick resolution: drained intents in, committed state and a
//! [`TickResult`] out.
//!
//! [`run_tick`] is the non-suspending heart of the scheduler. It runs the
//! movement pipeline (validate, resolve, enact) and then the action
//! applier against the post-move world, assembles the tick's result, and
//! verifies the world invariants before returning.
//!
//! If the invariants do not hold — which signals a defect in the
//! resolution path, never bad input — the world is rolled back to its
//! pre-resolution state and a fatal error is returned. Silent recovery is
//! forbidden; the scheduler exits the process on this path.

use std::collections::BTreeMap;

use glade_types::{Direction, EntityId, Intent, MoveRecord, TickResult, Utterance};
use glade_world::{World, WorldError};
use tracing::{debug, error};

use crate::actions;
use crate::resolver::{self, MoveClaim};

/// Errors that can occur during tick resolution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// Resolution produced inconsistent state. The world has been rolled
    /// back to its pre-resolution snapshot; the server must exit.
    #[error("tick {tick_id} aborted, state rolled back: {source}")]
    Aborted {
        /// The tick that failed.
        tick_id: u64,
        /// The underlying violation.
        source: WorldError,
    },
}

/// What one tick produced: the result record plus the utterances held for
/// the next tick's observations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    /// The committed result.
    pub result: TickResult,
    /// Words spoken this tick.
    pub utterances: Vec<Utterance>,
}

impl TickOutcome {
    /// An empty outcome for the given tick (used before the first tick).
    pub const fn empty(tick_id: u64) -> Self {
        Self {
            result: TickResult::empty(tick_id),
            utterances: Vec::new(),
        }
    }
}

/// Resolve and enact one tick against `world`.
///
/// `intents` is the drained queue: at most one intent per entity, already
/// authenticated at the boundary. Movement resolves first; actions then
/// apply in `entity_id` order against post-move positions.
///
/// # Errors
///
/// Returns [`TickError::Aborted`] if enactment or the post-tick invariant
/// check fails; the world is rolled back to its pre-resolution state
/// before the error is returned.
pub fn run_tick(
    world: &mut World,
    intents: &BTreeMap<EntityId, Intent>,
) -> Result<TickOutcome, TickError> {
    let tick_id = world.tick();
    let checkpoint = world.clone();

    match resolve_and_apply(world, intents, tick_id) {
        Ok(outcome) => Ok(outcome),
        Err(source) => {
            error!(tick_id, error = %source, "FATAL: tick aborted, rolling back world state");
            *world = checkpoint;
            Err(TickError::Aborted { tick_id, source })
        }
    }
}

/// The fallible body of [`run_tick`], separated so rollback lives in one
/// place.
fn resolve_and_apply(
    world: &mut World,
    intents: &BTreeMap<EntityId, Intent>,
    tick_id: u64,
) -> Result<TickOutcome, WorldError> {
    // --- Movement: validate ---
    let mut move_records: Vec<MoveRecord> = Vec::new();
    let mut claims: Vec<MoveClaim> = Vec::new();

    for (entity_id, intent) in intents {
        let Intent::Move { direction } = intent else {
            continue;
        };
        // A no-direction move is a wait, not a claim.
        if *direction == Direction::None {
            continue;
        }
        let Some(entity) = world.get_entity(entity_id) else {
            continue;
        };
        let from = entity.position;
        match resolver::validate_move(world, from, *direction) {
            Ok(to) => claims.push(MoveClaim {
                entity_id: entity_id.clone(),
                from,
                to,
            }),
            Err(reason) => {
                let to = from.step(*direction).unwrap_or(from);
                move_records.push(MoveRecord {
                    entity_id: entity_id.clone(),
                    from,
                    to,
                    success: false,
                    reason: Some(reason),
                });
            }
        }
    }

    // --- Movement: resolve and enact ---
    let resolved = resolver::resolve(world, claims);
    let winner_moves: Vec<(EntityId, glade_types::Position)> = resolved
        .winners
        .iter()
        .map(|claim| (claim.entity_id.clone(), claim.to))
        .collect();
    world.apply_moves(&winner_moves)?;

    for claim in resolved.winners {
        move_records.push(MoveRecord {
            entity_id: claim.entity_id,
            from: claim.from,
            to: claim.to,
            success: true,
            reason: None,
        });
    }
    for (claim, reason) in resolved.losers {
        move_records.push(MoveRecord {
            entity_id: claim.entity_id,
            from: claim.from,
            to: claim.to,
            success: false,
            reason: Some(reason),
        });
    }
    move_records.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));

    // --- Actions, against post-move positions ---
    let action_outcome = actions::apply_actions(world, intents);

    let result = TickResult {
        tick_id,
        moves: move_records,
        actions: action_outcome.records,
        object_changes: action_outcome.object_changes,
        spawns: Vec::new(),
        despawns: Vec::new(),
    };

    world.check_invariants()?;

    debug!(
        tick_id,
        moves = result.moves.len(),
        actions = result.actions.len(),
        object_changes = result.object_changes.len(),
        "Tick resolved"
    );

    Ok(TickOutcome {
        result,
        utterances: action_outcome.utterances,
    })
}
