//! End-to-end resolution scenarios with literal values.
//!
//! Each scenario drives [`glade_core::tick::run_tick`] against a small
//! hand-built world and asserts exact outcomes: final positions, tick
//! result records, and the world invariants afterwards. The late-intent
//! scenario (deadline behavior) lives with the scheduler's own tests,
//! where virtual time is available.

#![allow(clippy::unwrap_used)]

use std::collections::{BTreeMap, BTreeSet};

use glade_core::tick::run_tick;
use glade_types::{
    Direction, Entity, EntityId, Intent, Inventory, MoveFailure, ObjectId, Position, Tile,
    WorldObject,
};
use glade_world::World;

fn spawn(world: &mut World, id: &str, x: i32, y: i32) {
    world
        .spawn_entity(Entity {
            entity_id: EntityId::new(id),
            position: Position::new(x, y),
            entity_type: String::from("walker"),
            tags: BTreeSet::new(),
            status_bits: 0,
            inventory: Inventory::new(),
            spawn_tick: 0,
        })
        .unwrap();
}

fn position_of(world: &World, id: &str) -> Position {
    world.get_entity(&EntityId::new(id)).unwrap().position
}

fn go(direction: Direction) -> Intent {
    Intent::Move { direction }
}

/// S1: two entities chain east along a 3x1 strip in one tick.
#[test]
fn s1_chain_moves_succeed_together() {
    let mut world = World::new(3, 1);
    spawn(&mut world, "a", 0, 0);
    spawn(&mut world, "b", 1, 0);
    let _ = world.advance_tick();

    let mut intents = BTreeMap::new();
    intents.insert(EntityId::new("a"), go(Direction::E));
    intents.insert(EntityId::new("b"), go(Direction::E));

    let outcome = run_tick(&mut world, &intents).unwrap();

    assert_eq!(position_of(&world, "a"), Position::new(1, 0));
    assert_eq!(position_of(&world, "b"), Position::new(2, 0));

    let moves = &outcome.result.moves;
    assert_eq!(moves.len(), 2);
    let a = moves.iter().find(|m| m.entity_id.as_str() == "a").unwrap();
    assert!(a.success);
    assert_eq!((a.from, a.to), (Position::new(0, 0), Position::new(1, 0)));
    let b = moves.iter().find(|m| m.entity_id.as_str() == "b").unwrap();
    assert!(b.success);
    assert_eq!((b.from, b.to), (Position::new(1, 0), Position::new(2, 0)));

    world.check_invariants().unwrap();
}

/// S2: a swap fails both movers and nobody moves.
#[test]
fn s2_swap_fails_both() {
    let mut world = World::new(2, 1);
    spawn(&mut world, "a", 0, 0);
    spawn(&mut world, "b", 1, 0);
    let _ = world.advance_tick();

    let mut intents = BTreeMap::new();
    intents.insert(EntityId::new("a"), go(Direction::E));
    intents.insert(EntityId::new("b"), go(Direction::W));

    let outcome = run_tick(&mut world, &intents).unwrap();

    assert_eq!(position_of(&world, "a"), Position::new(0, 0));
    assert_eq!(position_of(&world, "b"), Position::new(1, 0));
    assert!(outcome.result.moves.iter().all(|m| !m.success));
    assert!(
        outcome
            .result
            .moves
            .iter()
            .all(|m| m.reason == Some(MoveFailure::Swap))
    );

    world.check_invariants().unwrap();
}

/// S3: two claims on one empty tile; the lexicographically smaller id wins.
#[test]
fn s3_contested_tile_goes_to_smallest_id() {
    let mut world = World::new(3, 1);
    spawn(&mut world, "a", 0, 0);
    spawn(&mut world, "b", 2, 0);
    let _ = world.advance_tick();

    let mut intents = BTreeMap::new();
    intents.insert(EntityId::new("a"), go(Direction::E));
    intents.insert(EntityId::new("b"), go(Direction::W));

    let outcome = run_tick(&mut world, &intents).unwrap();

    assert_eq!(position_of(&world, "a"), Position::new(1, 0));
    assert_eq!(position_of(&world, "b"), Position::new(2, 0));

    let b = outcome
        .result
        .moves
        .iter()
        .find(|m| m.entity_id.as_str() == "b")
        .unwrap();
    assert!(!b.success);
    assert_eq!(b.reason, Some(MoveFailure::Contested));

    world.check_invariants().unwrap();
}

/// S4: the anti-corner-cut rule rejects a diagonal past a blocked cardinal.
#[test]
fn s4_diagonal_corner_cut_rejected_at_validation() {
    let mut world = World::new(3, 3);
    spawn(&mut world, "a", 0, 0);
    world
        .set_tile(
            Position::new(0, 1),
            Tile {
                walkable: false,
                opaque: false,
                floor_type: String::from("rock"),
            },
        )
        .unwrap();
    let _ = world.advance_tick();

    let mut intents = BTreeMap::new();
    intents.insert(EntityId::new("a"), go(Direction::Se));

    let outcome = run_tick(&mut world, &intents).unwrap();

    assert_eq!(position_of(&world, "a"), Position::new(0, 0));
    let record = outcome.result.moves.first().unwrap();
    assert!(!record.success);
    assert_eq!(record.reason, Some(MoveFailure::CornerCut));

    world.check_invariants().unwrap();
}

/// S5: collecting one berry moves the counter from "3" to "2" and credits
/// the actor's inventory, with the change recorded.
#[test]
fn s5_collect_transfers_one_berry() {
    let mut world = World::new(10, 10);
    spawn(&mut world, "a", 5, 5);
    let mut state = BTreeMap::new();
    state.insert(String::from("berry_count"), String::from("3"));
    world
        .add_object(WorldObject {
            object_id: ObjectId::new("bush1"),
            position: Position::new(5, 5),
            object_type: String::from("berry_bush"),
            state,
            walkable: true,
            opaque: false,
        })
        .unwrap();
    let _ = world.advance_tick();

    let mut intents = BTreeMap::new();
    intents.insert(
        EntityId::new("a"),
        Intent::Collect {
            object_id: ObjectId::new("bush1"),
            item_type: String::from("berry"),
            quantity: 1,
        },
    );

    let outcome = run_tick(&mut world, &intents).unwrap();

    assert_eq!(
        world
            .get_object(&ObjectId::new("bush1"))
            .unwrap()
            .state
            .get("berry_count")
            .map(String::as_str),
        Some("2")
    );
    assert_eq!(
        world
            .get_entity(&EntityId::new("a"))
            .unwrap()
            .inventory
            .count("berry"),
        1
    );

    let change = outcome.result.object_changes.first().unwrap();
    assert_eq!(change.object_id, ObjectId::new("bush1"));
    assert_eq!(change.field, "berry_count");
    assert_eq!(change.old_value, "3");
    assert_eq!(change.new_value, "2");

    world.check_invariants().unwrap();
}

/// A crowded grid churned for many ticks keeps every invariant at each
/// tick boundary.
#[test]
fn invariants_hold_across_a_crowded_run() {
    let mut world = World::new(4, 4);
    // Nine entities on a 16-tile grid, everyone pushing toward a corner.
    let ids = ["a", "b", "c", "d", "e", "f", "g", "h", "i"];
    let mut index = 0_usize;
    for y in 0..3 {
        for x in 0..3 {
            if let Some(id) = ids.get(index) {
                spawn(&mut world, id, x, y);
            }
            index = index.saturating_add(1);
        }
    }

    let headings = [
        Direction::N,
        Direction::Ne,
        Direction::E,
        Direction::Se,
        Direction::S,
        Direction::Sw,
        Direction::W,
        Direction::Nw,
    ];

    for round in 0_usize..24 {
        let _ = world.advance_tick();
        let mut intents = BTreeMap::new();
        for (offset, id) in ids.iter().enumerate() {
            let pick = round
                .saturating_add(offset.saturating_mul(3))
                .checked_rem(headings.len())
                .unwrap_or(0);
            let direction = headings.get(pick).copied().unwrap_or(Direction::E);
            intents.insert(EntityId::new(*id), go(direction));
        }
        let outcome = run_tick(&mut world, &intents).unwrap();
        world.check_invariants().unwrap();

        // Every submitted move produced exactly one record.
        assert_eq!(outcome.result.moves.len(), ids.len());
    }
}
