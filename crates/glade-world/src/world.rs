//! The world aggregate: grid, entity registry, and object registry.
//!
//! [`World`] owns the sparse tile map, both entity indexes (by id and by
//! position), both object indexes (by id and by position), and the tick
//! counter. Mutators are only invoked from the single-threaded resolution
//! path; every successful mutation maintains the structural invariants:
//!
//! 1. The id-indexed and position-indexed entity maps agree, with at most
//!    one entity per position.
//! 2. The object position index agrees with the object records.
//! 3. Every entity position is in bounds.
//! 4. Inventory counts are non-negative (guaranteed by the type).
//!
//! A failed mutator returns a typed error and leaves the world untouched.

use std::collections::{BTreeMap, BTreeSet};

use glade_types::{Entity, EntityId, ObjectChange, ObjectId, Position, Tile, WorldObject};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::WorldError;
use crate::tiles::TileMap;

/// The authoritative world state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    /// The sparse tile map and grid bounds.
    tiles: TileMap,
    /// Entities indexed by id.
    entities: BTreeMap<EntityId, Entity>,
    /// Position-to-entity index (at most one entity per position).
    entity_positions: BTreeMap<Position, EntityId>,
    /// Objects indexed by id.
    objects: BTreeMap<ObjectId, WorldObject>,
    /// Position-to-objects index (multiple objects may share a tile).
    object_positions: BTreeMap<Position, BTreeSet<ObjectId>>,
    /// The current tick counter; monotonically non-decreasing.
    tick: u64,
}

impl World {
    /// Create an empty world with a `width x height` grid at tick 0.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            tiles: TileMap::new(width, height),
            entities: BTreeMap::new(),
            entity_positions: BTreeMap::new(),
            objects: BTreeMap::new(),
            object_positions: BTreeMap::new(),
            tick: 0,
        }
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    /// Grid dimensions as `(width, height)`.
    pub const fn dims(&self) -> (u32, u32) {
        self.tiles.dims()
    }

    /// The current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Whether `position` lies inside the grid.
    pub fn in_bounds(&self, position: Position) -> bool {
        self.tiles.in_bounds(position)
    }

    /// The tile at `position` (default for unset in-bounds positions,
    /// non-walkable sentinel outside the grid).
    pub fn tile_at(&self, position: Position) -> &Tile {
        self.tiles.tile_at(position)
    }

    /// Whether an entity may stand at `position`: the tile must be
    /// walkable and no object there may be marked non-walkable.
    pub fn is_walkable(&self, position: Position) -> bool {
        if !self.tiles.is_walkable(position) {
            return false;
        }
        self.objects_at(position).iter().all(|obj| obj.walkable)
    }

    /// The entity standing at `position`, if any.
    pub fn entity_at(&self, position: Position) -> Option<&Entity> {
        let id = self.entity_positions.get(&position)?;
        self.entities.get(id)
    }

    /// Look up an entity by id.
    pub fn get_entity(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// All objects sitting at `position`, in id order.
    pub fn objects_at(&self, position: Position) -> Vec<&WorldObject> {
        self.object_positions
            .get(&position)
            .map(|ids| ids.iter().filter_map(|id| self.objects.get(id)).collect())
            .unwrap_or_default()
    }

    /// Look up an object by id.
    pub fn get_object(&self, id: &ObjectId) -> Option<&WorldObject> {
        self.objects.get(id)
    }

    /// Iterate over all entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Iterate over all objects in id order.
    pub fn objects(&self) -> impl Iterator<Item = &WorldObject> {
        self.objects.values()
    }

    /// Number of entities in the registry.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Iterate over the explicitly stored (non-default) tiles.
    pub fn explicit_tiles(&self) -> impl Iterator<Item = (&Position, &Tile)> {
        self.tiles.explicit_tiles()
    }

    // -------------------------------------------------------------------
    // Mutators (single-threaded resolution path only)
    // -------------------------------------------------------------------

    /// Advance the tick counter by one. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::TickOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance_tick(&mut self) -> Result<u64, WorldError> {
        self.tick = self.tick.checked_add(1).ok_or(WorldError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Spawn an entity at its recorded position.
    ///
    /// The entity's `spawn_tick` is overwritten with the current tick.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateEntity`] for a reused id,
    /// [`WorldError::OutOfBounds`] / [`WorldError::NotWalkable`] for a bad
    /// position, or [`WorldError::PositionOccupied`] if another entity
    /// stands there.
    pub fn spawn_entity(&mut self, mut entity: Entity) -> Result<(), WorldError> {
        if self.entities.contains_key(&entity.entity_id) {
            return Err(WorldError::DuplicateEntity(entity.entity_id));
        }
        if !self.in_bounds(entity.position) {
            return Err(WorldError::OutOfBounds(entity.position));
        }
        if !self.is_walkable(entity.position) {
            return Err(WorldError::NotWalkable(entity.position));
        }
        if let Some(occupant) = self.entity_positions.get(&entity.position) {
            return Err(WorldError::PositionOccupied {
                position: entity.position,
                occupant: occupant.clone(),
            });
        }

        entity.spawn_tick = self.tick;
        debug!(
            entity_id = %entity.entity_id,
            position = %entity.position,
            spawn_tick = entity.spawn_tick,
            "Entity spawned"
        );
        self.entity_positions
            .insert(entity.position, entity.entity_id.clone());
        self.entities.insert(entity.entity_id.clone(), entity);
        Ok(())
    }

    /// Remove an entity, returning its final record.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownEntity`] if no such entity exists.
    pub fn despawn_entity(&mut self, id: &EntityId) -> Result<Entity, WorldError> {
        let entity = self
            .entities
            .remove(id)
            .ok_or_else(|| WorldError::UnknownEntity(id.clone()))?;
        self.entity_positions.remove(&entity.position);
        debug!(entity_id = %id, position = %entity.position, "Entity despawned");
        Ok(entity)
    }

    /// Move a single entity to `to`.
    ///
    /// This is the one-at-a-time mutator; the scheduler enacts resolver
    /// winners through [`World::apply_moves`] instead so chains commit
    /// atomically.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownEntity`], [`WorldError::OutOfBounds`],
    /// [`WorldError::NotWalkable`], or [`WorldError::PositionOccupied`].
    pub fn move_entity(&mut self, id: &EntityId, to: Position) -> Result<(), WorldError> {
        if !self.entities.contains_key(id) {
            return Err(WorldError::UnknownEntity(id.clone()));
        }
        if !self.in_bounds(to) {
            return Err(WorldError::OutOfBounds(to));
        }
        if !self.is_walkable(to) {
            return Err(WorldError::NotWalkable(to));
        }
        if let Some(occupant) = self.entity_positions.get(&to)
            && occupant != id
        {
            return Err(WorldError::PositionOccupied {
                position: to,
                occupant: occupant.clone(),
            });
        }

        if let Some(entity) = self.entities.get_mut(id) {
            self.entity_positions.remove(&entity.position);
            entity.position = to;
            self.entity_positions.insert(to, id.clone());
        }
        Ok(())
    }

    /// Enact a batch of resolved moves atomically.
    ///
    /// All movers' old positions are cleared before any new position is
    /// written, so chain moves (A to B's tile while B moves on) commit
    /// without transient index conflicts. The resolver guarantees targets
    /// are distinct and vacated; a conflicting batch is a defect and
    /// reported as an invariant violation.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownEntity`] if a mover is missing, or
    /// [`WorldError::InvariantViolation`] if two moves target one tile or
    /// a target is still occupied by a non-mover.
    pub fn apply_moves(&mut self, moves: &[(EntityId, Position)]) -> Result<(), WorldError> {
        for (id, _) in moves {
            if !self.entities.contains_key(id) {
                return Err(WorldError::UnknownEntity(id.clone()));
            }
        }

        // Clear every mover's old slot first.
        for (id, _) in moves {
            if let Some(entity) = self.entities.get(id) {
                self.entity_positions.remove(&entity.position);
            }
        }

        // Write the new slots, refusing any collision.
        for (id, to) in moves {
            if let Some(previous) = self.entity_positions.insert(*to, id.clone()) {
                return Err(WorldError::InvariantViolation {
                    detail: format!("move batch targets {to} twice ({previous} and {id})"),
                });
            }
            if let Some(entity) = self.entities.get_mut(id) {
                entity.position = *to;
            }
        }
        Ok(())
    }

    /// Replace the tile at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] for positions outside the grid.
    pub fn set_tile(&mut self, position: Position, tile: Tile) -> Result<(), WorldError> {
        if !self.tiles.set_tile(position, tile) {
            return Err(WorldError::OutOfBounds(position));
        }
        Ok(())
    }

    /// Add a world object.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateObject`] for a reused id or
    /// [`WorldError::OutOfBounds`] for a bad position.
    pub fn add_object(&mut self, object: WorldObject) -> Result<(), WorldError> {
        if self.objects.contains_key(&object.object_id) {
            return Err(WorldError::DuplicateObject(object.object_id));
        }
        if !self.in_bounds(object.position) {
            return Err(WorldError::OutOfBounds(object.position));
        }
        self.object_positions
            .entry(object.position)
            .or_default()
            .insert(object.object_id.clone());
        self.objects.insert(object.object_id.clone(), object);
        Ok(())
    }

    /// Remove a world object, returning its final record.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownObject`] if no such object exists.
    pub fn remove_object(&mut self, id: &ObjectId) -> Result<WorldObject, WorldError> {
        let object = self
            .objects
            .remove(id)
            .ok_or_else(|| WorldError::UnknownObject(id.clone()))?;
        if let Some(ids) = self.object_positions.get_mut(&object.position) {
            ids.remove(id);
            if ids.is_empty() {
                self.object_positions.remove(&object.position);
            }
        }
        Ok(object)
    }

    /// Set a string-encoded state field on an object, returning the
    /// recorded change (old value is empty for a previously unset field).
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownObject`] if no such object exists.
    pub fn update_object_field(
        &mut self,
        id: &ObjectId,
        field: &str,
        value: impl Into<String>,
    ) -> Result<ObjectChange, WorldError> {
        let object = self
            .objects
            .get_mut(id)
            .ok_or_else(|| WorldError::UnknownObject(id.clone()))?;
        let new_value = value.into();
        let old_value = object
            .state
            .insert(field.to_owned(), new_value.clone())
            .unwrap_or_default();
        Ok(ObjectChange {
            object_id: id.clone(),
            field: field.to_owned(),
            old_value,
            new_value,
        })
    }

    /// Add items to an entity's inventory. Returns the new count.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownEntity`] or [`WorldError::Inventory`].
    pub fn inventory_add(
        &mut self,
        id: &EntityId,
        kind: &str,
        quantity: u32,
    ) -> Result<u32, WorldError> {
        let entity = self
            .entities
            .get_mut(id)
            .ok_or_else(|| WorldError::UnknownEntity(id.clone()))?;
        entity
            .inventory
            .add(kind, quantity)
            .map_err(|source| WorldError::Inventory {
                entity_id: id.clone(),
                source,
            })
    }

    /// Remove items from an entity's inventory. Returns the new count.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownEntity`] or [`WorldError::Inventory`]
    /// (undersupplied removals leave the inventory untouched).
    pub fn inventory_remove(
        &mut self,
        id: &EntityId,
        kind: &str,
        quantity: u32,
    ) -> Result<u32, WorldError> {
        let entity = self
            .entities
            .get_mut(id)
            .ok_or_else(|| WorldError::UnknownEntity(id.clone()))?;
        entity
            .inventory
            .remove(kind, quantity)
            .map_err(|source| WorldError::Inventory {
                entity_id: id.clone(),
                source,
            })
    }

    // -------------------------------------------------------------------
    // Invariant checking
    // -------------------------------------------------------------------

    /// Verify the structural invariants.
    ///
    /// The scheduler runs this at the end of every tick; a violation means
    /// the resolution path is defective, the tick must be rolled back, and
    /// the process must exit.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvariantViolation`] describing the first
    /// inconsistency found.
    pub fn check_invariants(&self) -> Result<(), WorldError> {
        for (id, entity) in &self.entities {
            if *id != entity.entity_id {
                return Err(WorldError::InvariantViolation {
                    detail: format!("registry key {id} holds record for {}", entity.entity_id),
                });
            }
            if !self.in_bounds(entity.position) {
                return Err(WorldError::InvariantViolation {
                    detail: format!("entity {id} is out of bounds at {}", entity.position),
                });
            }
            match self.entity_positions.get(&entity.position) {
                Some(indexed) if indexed == id => {}
                Some(indexed) => {
                    return Err(WorldError::InvariantViolation {
                        detail: format!(
                            "position {} holds {indexed} but entity {id} records it",
                            entity.position
                        ),
                    });
                }
                None => {
                    return Err(WorldError::InvariantViolation {
                        detail: format!("entity {id} at {} missing from index", entity.position),
                    });
                }
            }
        }
        for (position, id) in &self.entity_positions {
            match self.entities.get(id) {
                Some(entity) if entity.position == *position => {}
                _ => {
                    return Err(WorldError::InvariantViolation {
                        detail: format!("stale position index entry {position} -> {id}"),
                    });
                }
            }
        }

        for (id, object) in &self.objects {
            let indexed = self
                .object_positions
                .get(&object.position)
                .is_some_and(|ids| ids.contains(id));
            if !indexed {
                return Err(WorldError::InvariantViolation {
                    detail: format!("object {id} at {} missing from index", object.position),
                });
            }
        }
        for (position, ids) in &self.object_positions {
            for id in ids {
                match self.objects.get(id) {
                    Some(object) if object.position == *position => {}
                    _ => {
                        return Err(WorldError::InvariantViolation {
                            detail: format!("stale object index entry {position} -> {id}"),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}
