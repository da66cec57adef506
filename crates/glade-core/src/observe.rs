//! Observation generation: per-entity, per-tick views of the world.
//!
//! An observation is assembled at tick start from the committed world
//! state and the previous tick's [`TickResult`]. It is self-contained —
//! everything inside the observer's Chebyshev radius plus the events the
//! observer could have witnessed — so a controller that missed frames can
//! resynchronize without history.
//!
//! Visibility is a radius check composed with the [`is_visible`] hook.
//! The hook is where a future version consults opaque tiles with a
//! ray-trace; in v1 it admits everything in radius.

use glade_types::{
    Entity, EntityView, Observation, ObservedEvent, ObjectView, Position, SelfView, TickResult,
    TileView, Utterance,
};
use glade_world::World;

/// Radii governing what an observer perceives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationSettings {
    /// Chebyshev visibility radius.
    pub radius: u32,
    /// Utterance hearing radius.
    pub hearing_radius: u32,
}

/// Line-of-sight hook between two positions.
///
/// v1 returns `true` for every pair — the radius cap is the only filter.
/// v2+ may trace the ray between the positions and consult `opaque`
/// tiles; callers already compose this with the radius check, so the
/// upgrade is local to this function.
pub const fn is_visible(_observer: Position, _target: Position, _world: &World) -> bool {
    true
}

/// Whether `target` is within `radius` of `observer` and passes the
/// line-of-sight hook.
fn in_view(observer: Position, target: Position, radius: u32, world: &World) -> bool {
    observer.chebyshev_distance(target) <= radius && is_visible(observer, target, world)
}

/// Assemble the observation for one entity at the start of the current
/// tick.
///
/// `prev` is the fully committed result of the previous tick, and
/// `utterances` are the words spoken during it. `deadline_ms` is the
/// advisory wall-clock time at which the current tick's intent deadline
/// fires.
pub fn build_observation(
    world: &World,
    observer: &Entity,
    settings: ObservationSettings,
    prev: &TickResult,
    utterances: &[Utterance],
    deadline_ms: i64,
) -> Observation {
    let origin = observer.position;
    let radius = settings.radius;

    let visible_tiles: Vec<TileView> = world
        .explicit_tiles()
        .filter(|(position, _)| in_view(origin, **position, radius, world))
        .map(|(position, tile)| TileView {
            position: *position,
            walkable: tile.walkable,
            opaque: tile.opaque,
            floor_type: tile.floor_type.clone(),
        })
        .collect();

    let visible_entities: Vec<EntityView> = world
        .entities()
        .filter(|entity| entity.entity_id != observer.entity_id)
        .filter(|entity| in_view(origin, entity.position, radius, world))
        .map(|entity| EntityView {
            entity_id: entity.entity_id.clone(),
            entity_type: entity.entity_type.clone(),
            position: entity.position,
            tags: entity.tags.iter().cloned().collect(),
        })
        .collect();

    let visible_objects: Vec<ObjectView> = world
        .objects()
        .filter(|object| in_view(origin, object.position, radius, world))
        .map(|object| ObjectView {
            object_id: object.object_id.clone(),
            object_type: object.object_type.clone(),
            position: object.position,
            state: object.state.clone(),
        })
        .collect();

    let events = derive_events(world, origin, settings, prev, utterances);

    Observation {
        tick_id: world.tick(),
        deadline_ms,
        self_view: SelfView {
            entity_id: observer.entity_id.clone(),
            position: origin,
            inventory: observer.inventory.clone(),
            status_bits: observer.status_bits,
        },
        visible_tiles,
        visible_entities,
        visible_objects,
        events,
    }
}

/// Derive the events an observer at `origin` could have witnessed from
/// the previous tick's committed result.
fn derive_events(
    world: &World,
    origin: Position,
    settings: ObservationSettings,
    prev: &TickResult,
    utterances: &[Utterance],
) -> Vec<ObservedEvent> {
    let radius = settings.radius;
    let mut events = Vec::new();

    for record in &prev.moves {
        if !record.success {
            continue;
        }
        let saw_from = in_view(origin, record.from, radius, world);
        let saw_to = in_view(origin, record.to, radius, world);
        if saw_from || saw_to {
            events.push(ObservedEvent::EntityMoved {
                entity_id: record.entity_id.clone(),
                from: record.from,
                to: record.to,
            });
        }
        if !saw_from && saw_to {
            events.push(ObservedEvent::EntityEntered {
                entity_id: record.entity_id.clone(),
                position: record.to,
            });
        }
        if saw_from && !saw_to {
            events.push(ObservedEvent::EntityLeft {
                entity_id: record.entity_id.clone(),
                position: record.from,
            });
        }
    }

    for spawned in &prev.spawns {
        if in_view(origin, spawned.position, radius, world) {
            events.push(ObservedEvent::EntityEntered {
                entity_id: spawned.entity_id.clone(),
                position: spawned.position,
            });
        }
    }
    for departed in &prev.despawns {
        if in_view(origin, departed.position, radius, world) {
            events.push(ObservedEvent::EntityLeft {
                entity_id: departed.entity_id.clone(),
                position: departed.position,
            });
        }
    }

    for change in &prev.object_changes {
        let visible = world
            .get_object(&change.object_id)
            .is_some_and(|object| in_view(origin, object.position, radius, world));
        if visible {
            events.push(ObservedEvent::ObjectChanged {
                object_id: change.object_id.clone(),
                field: change.field.clone(),
                old_value: change.old_value.clone(),
                new_value: change.new_value.clone(),
            });
        }
    }

    for utterance in utterances {
        if origin.chebyshev_distance(utterance.position) <= settings.hearing_radius {
            events.push(ObservedEvent::Utterance {
                entity_id: utterance.entity_id.clone(),
                text: utterance.text.clone(),
                channel: utterance.channel.clone(),
            });
        }
    }

    events
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use glade_types::{EntityId, Inventory, MoveRecord, ObjectId, Tile, WorldObject};

    use super::*;

    const SETTINGS: ObservationSettings = ObservationSettings {
        radius: 5,
        hearing_radius: 5,
    };

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

    fn observe(world: &World, id: &str, prev: &TickResult) -> Observation {
        let observer = world.get_entity(&EntityId::new(id)).unwrap();
        build_observation(world, observer, SETTINGS, prev, &[], 0)
    }

    #[test]
    fn observation_is_bounded_by_chebyshev_radius() {
        let mut world = World::new(20, 20);
        spawn(&mut world, "me", 10, 10);
        spawn(&mut world, "near", 15, 10);
        spawn(&mut world, "corner", 5, 5);
        spawn(&mut world, "far", 16, 10);

        let obs = observe(&world, "me", &TickResult::empty(0));
        let seen: Vec<&str> = obs
            .visible_entities
            .iter()
            .map(|e| e.entity_id.as_str())
            .collect();
        assert!(seen.contains(&"near"));
        assert!(seen.contains(&"corner"));
        assert!(!seen.contains(&"far"));
    }

    #[test]
    fn observer_does_not_see_itself_in_entities() {
        let mut world = World::new(10, 10);
        spawn(&mut world, "me", 5, 5);
        let obs = observe(&world, "me", &TickResult::empty(0));
        assert!(obs.visible_entities.is_empty());
        assert_eq!(obs.self_view.entity_id, EntityId::new("me"));
    }

    #[test]
    fn objects_and_tiles_honor_the_radius() {
        let mut world = World::new(20, 20);
        spawn(&mut world, "me", 10, 10);
        world
            .add_object(WorldObject {
                object_id: ObjectId::new("bush-near"),
                position: Position::new(12, 12),
                object_type: String::from("berry_bush"),
                state: std::collections::BTreeMap::new(),
                walkable: true,
                opaque: false,
            })
            .unwrap();
        world
            .add_object(WorldObject {
                object_id: ObjectId::new("bush-far"),
                position: Position::new(1, 1),
                object_type: String::from("berry_bush"),
                state: std::collections::BTreeMap::new(),
                walkable: true,
                opaque: false,
            })
            .unwrap();
        world
            .set_tile(
                Position::new(11, 10),
                Tile {
                    walkable: false,
                    opaque: false,
                    floor_type: String::from("rock"),
                },
            )
            .unwrap();
        world
            .set_tile(
                Position::new(0, 0),
                Tile {
                    walkable: false,
                    opaque: false,
                    floor_type: String::from("rock"),
                },
            )
            .unwrap();

        let obs = observe(&world, "me", &TickResult::empty(0));
        assert_eq!(obs.visible_objects.len(), 1);
        assert_eq!(obs.visible_tiles.len(), 1);
        assert_eq!(
            obs.visible_tiles.first().map(|t| t.position),
            Some(Position::new(11, 10))
        );
    }

    #[test]
    fn move_with_visible_endpoint_is_witnessed() {
        let mut world = World::new(20, 20);
        spawn(&mut world, "me", 10, 10);
        spawn(&mut world, "walker", 15, 10);

        // walker stepped in from outside the radius: entered + moved.
        let prev = TickResult {
            tick_id: 1,
            moves: vec![MoveRecord {
                entity_id: EntityId::new("walker"),
                from: Position::new(16, 10),
                to: Position::new(15, 10),
                success: true,
                reason: None,
            }],
            actions: Vec::new(),
            object_changes: Vec::new(),
            spawns: Vec::new(),
            despawns: Vec::new(),
        };
        let obs = observe(&world, "me", &prev);
        assert!(obs.events.iter().any(|e| matches!(
            e,
            ObservedEvent::EntityMoved { entity_id, .. } if *entity_id == EntityId::new("walker")
        )));
        assert!(obs.events.iter().any(|e| matches!(
            e,
            ObservedEvent::EntityEntered { entity_id, .. } if *entity_id == EntityId::new("walker")
        )));
    }

    #[test]
    fn move_fully_outside_the_radius_is_not_witnessed() {
        let mut world = World::new(40, 40);
        spawn(&mut world, "me", 10, 10);
        spawn(&mut world, "walker", 30, 30);

        let prev = TickResult {
            tick_id: 1,
            moves: vec![MoveRecord {
                entity_id: EntityId::new("walker"),
                from: Position::new(31, 30),
                to: Position::new(30, 30),
                success: true,
                reason: None,
            }],
            actions: Vec::new(),
            object_changes: Vec::new(),
            spawns: Vec::new(),
            despawns: Vec::new(),
        };
        let obs = observe(&world, "me", &prev);
        assert!(obs.events.is_empty());
    }

    #[test]
    fn failed_moves_produce_no_events() {
        let mut world = World::new(20, 20);
        spawn(&mut world, "me", 10, 10);
        spawn(&mut world, "walker", 11, 10);

        let prev = TickResult {
            tick_id: 1,
            moves: vec![MoveRecord {
                entity_id: EntityId::new("walker"),
                from: Position::new(11, 10),
                to: Position::new(12, 10),
                success: false,
                reason: Some(glade_types::MoveFailure::Blocked),
            }],
            actions: Vec::new(),
            object_changes: Vec::new(),
            spawns: Vec::new(),
            despawns: Vec::new(),
        };
        let obs = observe(&world, "me", &prev);
        assert!(obs.events.is_empty());
    }

    #[test]
    fn object_change_is_witnessed_when_object_visible() {
        let mut world = World::new(20, 20);
        spawn(&mut world, "me", 10, 10);
        let mut state = std::collections::BTreeMap::new();
        state.insert(String::from("berry_count"), String::from("2"));
        world
            .add_object(WorldObject {
                object_id: ObjectId::new("bush1"),
                position: Position::new(12, 10),
                object_type: String::from("berry_bush"),
                state,
                walkable: true,
                opaque: false,
            })
            .unwrap();

        let prev = TickResult {
            tick_id: 1,
            moves: Vec::new(),
            actions: Vec::new(),
            object_changes: vec![glade_types::ObjectChange {
                object_id: ObjectId::new("bush1"),
                field: String::from("berry_count"),
                old_value: String::from("3"),
                new_value: String::from("2"),
            }],
            spawns: Vec::new(),
            despawns: Vec::new(),
        };
        let obs = observe(&world, "me", &prev);
        assert!(obs.events.iter().any(|e| matches!(
            e,
            ObservedEvent::ObjectChanged { new_value, .. } if new_value == "2"
        )));
    }

    #[test]
    fn utterance_is_heard_within_hearing_radius_only() {
        let mut world = World::new(40, 40);
        spawn(&mut world, "me", 10, 10);
        spawn(&mut world, "far", 30, 30);

        let observer = world.get_entity(&EntityId::new("me")).unwrap();
        let utterances = vec![
            Utterance {
                entity_id: EntityId::new("near-voice"),
                position: Position::new(12, 12),
                text: String::from("here"),
                channel: String::from("local"),
            },
            Utterance {
                entity_id: EntityId::new("far-voice"),
                position: Position::new(30, 30),
                text: String::from("away"),
                channel: String::from("local"),
            },
        ];
        let obs = build_observation(
            &world,
            observer,
            SETTINGS,
            &TickResult::empty(0),
            &utterances,
            0,
        );
        let heard: Vec<&str> = obs
            .events
            .iter()
            .filter_map(|e| match e {
                ObservedEvent::Utterance { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(heard, vec!["here"]);
    }

    #[test]
    fn observation_carries_tick_and_deadline() {
        let mut world = World::new(10, 10);
        spawn(&mut world, "me", 5, 5);
        let _ = world.advance_tick();
        let observer = world.get_entity(&EntityId::new("me")).unwrap();
        let obs = build_observation(
            &world,
            observer,
            SETTINGS,
            &TickResult::empty(0),
            &[],
            42_000,
        );
        assert_eq!(obs.tick_id, 1);
        assert_eq!(obs.deadline_ms, 42_000);
    }
}
