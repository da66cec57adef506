//! Movement conflict resolution: claims in, winners and losers out.
//!
//! Resolution is a pure function. Given the same set of claims and the
//! same world, it returns the same outcome regardless of submission order
//! or timing; the only entity attribute it consults for tie-breaking is
//! the id.
//!
//! Conflicts are detected in a fixed order:
//!
//! 1. **Swap** — two claims exchanging positions both fail.
//! 2. **Cycle** — a rotation of three or more movers all fail. Linear
//!    chains are not cycles and succeed atomically.
//! 3. **Contested** — of several claims on one destination, the
//!    lexicographically smallest entity id wins.
//! 4. **Blocked** — a destination held by an entity that is not vacating
//!    it fails the claim. This step iterates to a fixed point so that a
//!    loser of an earlier rule blocks the claims behind it.
//!
//! Validation (bounds, walkability, the anti-corner-cut rule) happens
//! before a claim enters resolution at all.

use std::collections::{BTreeMap, BTreeSet};

use glade_types::{Direction, EntityId, MoveFailure, Position};
use glade_world::World;

/// A validated move claim: one entity, one origin, one destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveClaim {
    /// The claiming entity.
    pub entity_id: EntityId,
    /// The entity's position at tick start.
    pub from: Position,
    /// The claimed destination, exactly one king-move away.
    pub to: Position,
}

/// The outcome of resolving one tick's claims.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedMoves {
    /// Claims whose moves succeed, in entity-id order.
    pub winners: Vec<MoveClaim>,
    /// Claims whose moves fail, with per-claim reasons, in entity-id order.
    pub losers: Vec<(MoveClaim, MoveFailure)>,
}

/// Validate a move one step in `direction` from `from`.
///
/// Returns the destination on success. The caller must not pass
/// [`Direction::None`]; a no-direction move is a wait and never becomes a
/// claim.
///
/// # Errors
///
/// Returns [`MoveFailure::OutOfBounds`] for destinations outside the grid,
/// [`MoveFailure::NotWalkable`] for blocked destination tiles, and
/// [`MoveFailure::CornerCut`] for diagonal steps where either intervening
/// cardinal neighbor is non-walkable.
pub fn validate_move(
    world: &World,
    from: Position,
    direction: Direction,
) -> Result<Position, MoveFailure> {
    let to = from.step(direction).ok_or(MoveFailure::OutOfBounds)?;
    if !world.in_bounds(to) {
        return Err(MoveFailure::OutOfBounds);
    }
    if !world.is_walkable(to) {
        return Err(MoveFailure::NotWalkable);
    }
    if let Some((first, second)) = direction.cardinal_components() {
        let corner_a = from.step(first).ok_or(MoveFailure::OutOfBounds)?;
        let corner_b = from.step(second).ok_or(MoveFailure::OutOfBounds)?;
        if !world.is_walkable(corner_a) || !world.is_walkable(corner_b) {
            return Err(MoveFailure::CornerCut);
        }
    }
    Ok(to)
}

/// Resolve one tick's validated claims against the current world.
///
/// Pure and deterministic: claims are indexed by entity id before any rule
/// runs, so the input order is irrelevant.
pub fn resolve(world: &World, claims: Vec<MoveClaim>) -> ResolvedMoves {
    let mut by_id: BTreeMap<EntityId, MoveClaim> = BTreeMap::new();
    for claim in claims {
        by_id.insert(claim.entity_id.clone(), claim);
    }

    // Origins are unique: one entity per tile, one claim per entity.
    let origin_of: BTreeMap<Position, EntityId> = by_id
        .values()
        .map(|claim| (claim.from, claim.entity_id.clone()))
        .collect();

    let mut failed: BTreeMap<EntityId, MoveFailure> = BTreeMap::new();

    fail_swaps(&by_id, &origin_of, &mut failed);
    fail_cycles(&by_id, &origin_of, &mut failed);
    fail_contested(&by_id, &mut failed);
    fail_blocked(world, &by_id, &mut failed);

    let mut resolved = ResolvedMoves::default();
    for (id, claim) in by_id {
        match failed.get(&id) {
            Some(reason) => resolved.losers.push((claim, *reason)),
            None => resolved.winners.push(claim),
        }
    }
    resolved
}

/// Rule 1: both members of a position exchange fail.
fn fail_swaps(
    by_id: &BTreeMap<EntityId, MoveClaim>,
    origin_of: &BTreeMap<Position, EntityId>,
    failed: &mut BTreeMap<EntityId, MoveFailure>,
) {
    let mut swappers: BTreeSet<EntityId> = BTreeSet::new();
    for (id, claim) in by_id {
        let Some(other_id) = origin_of.get(&claim.to) else {
            continue;
        };
        let Some(other) = by_id.get(other_id) else {
            continue;
        };
        if other_id != id && other.to == claim.from {
            swappers.insert(id.clone());
            swappers.insert(other_id.clone());
        }
    }
    for id in swappers {
        failed.insert(id, MoveFailure::Swap);
    }
}

/// Rule 2: rotations of three or more movers fail.
///
/// The claim graph is functional — each live claimant has at most one
/// successor (the live claimant currently standing on its destination) —
/// so a colored walk finds every cycle in linear time. Two-cycles were
/// already removed as swaps, and a claim's destination is never its own
/// origin, so any cycle found here has length three or more.
fn fail_cycles(
    by_id: &BTreeMap<EntityId, MoveClaim>,
    origin_of: &BTreeMap<Position, EntityId>,
    failed: &mut BTreeMap<EntityId, MoveFailure>,
) {
    // Walk state: absent = unvisited, false = on the current path,
    // true = fully explored.
    let mut done: BTreeMap<EntityId, bool> = BTreeMap::new();

    let successor = |id: &EntityId, failed: &BTreeMap<EntityId, MoveFailure>| {
        let claim = by_id.get(id)?;
        let next = origin_of.get(&claim.to)?;
        if failed.contains_key(next) {
            return None;
        }
        Some(next.clone())
    };

    for start in by_id.keys() {
        if failed.contains_key(start) || done.contains_key(start) {
            continue;
        }

        let mut path: Vec<EntityId> = Vec::new();
        let mut current = start.clone();
        loop {
            done.insert(current.clone(), false);
            path.push(current.clone());

            match successor(&current, failed) {
                Some(next) => match done.get(&next) {
                    // Reached the current path again: a cycle.
                    Some(false) => {
                        let members: Vec<EntityId> = path
                            .iter()
                            .skip_while(|id| **id != next)
                            .cloned()
                            .collect();
                        for member in members {
                            failed.insert(member, MoveFailure::Cycle);
                        }
                        break;
                    }
                    // Reached an already-explored chain: no cycle here.
                    Some(true) => break,
                    None => current = next,
                },
                None => break,
            }
        }
        for id in path {
            done.insert(id, true);
        }
    }
}

/// Rule 3: of several live claims on one destination, the smallest entity
/// id wins; the rest are contested.
fn fail_contested(
    by_id: &BTreeMap<EntityId, MoveClaim>,
    failed: &mut BTreeMap<EntityId, MoveFailure>,
) {
    let mut groups: BTreeMap<Position, Vec<EntityId>> = BTreeMap::new();
    for (id, claim) in by_id {
        if !failed.contains_key(id) {
            // Iteration is in id order, so each group is sorted already.
            groups.entry(claim.to).or_default().push(id.clone());
        }
    }
    for contenders in groups.into_values() {
        for loser in contenders.into_iter().skip(1) {
            failed.insert(loser, MoveFailure::Contested);
        }
    }
}

/// Rule 4: a destination held by an entity that is not vacating fails the
/// claim. Iterates to a fixed point so freshly failed claims block the
/// claims behind them.
fn fail_blocked(
    world: &World,
    by_id: &BTreeMap<EntityId, MoveClaim>,
    failed: &mut BTreeMap<EntityId, MoveFailure>,
) {
    loop {
        let mut newly_blocked: Vec<EntityId> = Vec::new();
        for (id, claim) in by_id {
            if failed.contains_key(id) {
                continue;
            }
            let Some(occupant) = world.entity_at(claim.to) else {
                continue;
            };
            let vacating = by_id.contains_key(&occupant.entity_id)
                && !failed.contains_key(&occupant.entity_id);
            if !vacating {
                newly_blocked.push(id.clone());
            }
        }
        if newly_blocked.is_empty() {
            return;
        }
        for id in newly_blocked {
            failed.insert(id, MoveFailure::Blocked);
        }
    }
}
