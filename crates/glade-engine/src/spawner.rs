//! World spawner: build the initial world from configuration.
//!
//! Tiles are applied first, then objects, then entities, so walkability
//! overrides are already in place when entity spawn positions are
//! validated. Construction is all-or-nothing: any invalid initial record
//! fails startup with the offending detail rather than silently dropping
//! it.

use glade_core::config::GladeConfig;
use glade_types::{Entity, EntityId, Inventory, ObjectId, Tile, WorldObject};
use glade_world::World;
use tracing::info;

use crate::error::EngineError;

/// Build the starting world from the `initial` configuration section.
///
/// # Errors
///
/// Returns [`EngineError::World`] for out-of-bounds positions, duplicate
/// ids, occupied or non-walkable spawn tiles.
pub fn build_world(config: &GladeConfig) -> Result<World, EngineError> {
    let mut world = World::new(config.grid.width, config.grid.height);

    for tile in &config.initial.tiles {
        world.set_tile(
            tile.position,
            Tile {
                walkable: tile.walkable,
                opaque: tile.opaque,
                floor_type: tile.floor_type.clone(),
            },
        )?;
    }

    for object in &config.initial.objects {
        world.add_object(WorldObject {
            object_id: ObjectId::new(object.object_id.clone()),
            position: object.position,
            object_type: object.object_type.clone(),
            state: object.state.clone(),
            walkable: object.walkable,
            opaque: object.opaque,
        })?;
    }

    for entity in &config.initial.entities {
        world.spawn_entity(Entity {
            entity_id: EntityId::new(entity.entity_id.clone()),
            position: entity.position,
            entity_type: entity.entity_type.clone(),
            tags: entity.tags.iter().cloned().collect(),
            status_bits: 0,
            inventory: Inventory::new(),
            spawn_tick: 0,
        })?;
    }

    world.check_invariants()?;
    info!(
        width = config.grid.width,
        height = config.grid.height,
        tiles = config.initial.tiles.len(),
        objects = config.initial.objects.len(),
        entities = config.initial.entities.len(),
        "Initial world built"
    );
    Ok(world)
}
