//! Core entity structs: inventories, entities, world objects, and leases.
//!
//! All of these are plain value types. State changes never mutate shared
//! records in place; a mutator produces the new value and the registry entry
//! is replaced atomically by the single-threaded core.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::ids::{ControllerId, EntityId, LeaseId, ObjectId};
use crate::grid::Position;

/// Errors that can occur during inventory operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    /// A removal asked for more items than the inventory holds.
    #[error("undersupplied: {requested} x {kind} requested, {available} held")]
    Undersupplied {
        /// The item kind.
        kind: String,
        /// How many items the caller asked to remove.
        requested: u32,
        /// How many items are actually held.
        available: u32,
    },

    /// An addition would overflow the per-kind counter.
    #[error("inventory counter overflow for {kind}")]
    Overflow {
        /// The item kind whose counter would overflow.
        kind: String,
    },
}

/// A multiset of items keyed by item kind.
///
/// Counts are always non-negative; a kind whose count reaches zero is
/// removed from the map entirely, so iteration never yields empty slots.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Inventory(BTreeMap<String, u32>);

impl Inventory {
    /// Create an empty inventory.
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Add `quantity` items of `kind`. Returns the new count.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Overflow`] if the per-kind counter would
    /// exceed `u32::MAX`.
    pub fn add(&mut self, kind: &str, quantity: u32) -> Result<u32, InventoryError> {
        let current = self.count(kind);
        let updated = current
            .checked_add(quantity)
            .ok_or_else(|| InventoryError::Overflow {
                kind: kind.to_owned(),
            })?;
        if updated > 0 {
            self.0.insert(kind.to_owned(), updated);
        }
        Ok(updated)
    }

    /// Remove `quantity` items of `kind`. Returns the new count.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::Undersupplied`] if fewer than `quantity`
    /// items are held; the inventory is untouched in that case.
    pub fn remove(&mut self, kind: &str, quantity: u32) -> Result<u32, InventoryError> {
        let current = self.count(kind);
        let remaining = current
            .checked_sub(quantity)
            .ok_or_else(|| InventoryError::Undersupplied {
                kind: kind.to_owned(),
                requested: quantity,
                available: current,
            })?;
        if remaining == 0 {
            self.0.remove(kind);
        } else {
            self.0.insert(kind.to_owned(), remaining);
        }
        Ok(remaining)
    }

    /// The number of items of `kind` held (zero for unknown kinds).
    pub fn count(&self, kind: &str) -> u32 {
        self.0.get(kind).copied().unwrap_or(0)
    }

    /// Whether at least `quantity` items of `kind` are held.
    pub fn has(&self, kind: &str, quantity: u32) -> bool {
        self.count(kind) >= quantity
    }

    /// Whether the inventory holds nothing at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(kind, count)` pairs in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &u32)> {
        self.0.iter()
    }
}

impl FromIterator<(String, u32)> for Inventory {
    fn from_iter<T: IntoIterator<Item = (String, u32)>>(iter: T) -> Self {
        Self(iter.into_iter().filter(|(_, n)| *n > 0).collect())
    }
}

/// A controllable entity on the grid.
///
/// Entities occupy exactly one tile each; at most one entity stands on any
/// tile at a time. The registry replaces the whole record on every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Globally unique identifier.
    pub entity_id: EntityId,
    /// Current tile position (tile center).
    pub position: Position,
    /// Free-form entity type tag (`"walker"`, `"forager"`, ...).
    pub entity_type: String,
    /// Arbitrary string tags attached at spawn time.
    pub tags: BTreeSet<String>,
    /// Packed status flags, reserved for subsystem use.
    pub status_bits: u32,
    /// Items the entity carries.
    pub inventory: Inventory,
    /// Tick at which the entity was spawned.
    pub spawn_tick: u64,
}

/// A non-entity object placed on the grid (bush, chest, marker, ...).
///
/// The `state` map holds string-encoded scalar fields (for example
/// `"berry_count" -> "3"`) so subsystems can extend object schemas without
/// touching the core. Consumers parse on access and serialize on change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldObject {
    /// Globally unique identifier.
    pub object_id: ObjectId,
    /// Tile the object sits on. Multiple objects may share a tile.
    pub position: Position,
    /// Free-form object type tag (`"berry_bush"`, ...).
    pub object_type: String,
    /// String-encoded scalar state fields.
    pub state: BTreeMap<String, String>,
    /// Whether entities may stand on the object's tile.
    pub walkable: bool,
    /// Whether the object blocks line of sight (future visibility hook).
    pub opaque: bool,
}

/// A time-bounded exclusive right to control one entity.
///
/// A lease is *active* at time `t` iff `t < expires_at_ms` and no later
/// lease has been issued for the same entity. The lease manager enforces
/// the second clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    /// Server-issued lease identifier.
    pub lease_id: LeaseId,
    /// The entity this lease controls.
    pub entity_id: EntityId,
    /// The controller the lease was granted to.
    pub controller_id: ControllerId,
    /// Wall-clock grant time, milliseconds since the Unix epoch.
    pub issued_at_ms: i64,
    /// Wall-clock expiry time, milliseconds since the Unix epoch.
    pub expires_at_ms: i64,
}

impl Lease {
    /// Whether this lease has passed its expiry at wall-clock time `now_ms`.
    pub const fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn inventory_add_and_count() {
        let mut inv = Inventory::new();
        assert_eq!(inv.add("berry", 3).unwrap(), 3);
        assert_eq!(inv.add("berry", 2).unwrap(), 5);
        assert_eq!(inv.count("berry"), 5);
        assert_eq!(inv.count("wood"), 0);
    }

    #[test]
    fn inventory_remove_undersupplied_is_untouched() {
        let mut inv = Inventory::new();
        let _ = inv.add("berry", 2);
        let err = inv.remove("berry", 3).unwrap_err();
        assert_eq!(
            err,
            InventoryError::Undersupplied {
                kind: String::from("berry"),
                requested: 3,
                available: 2,
            }
        );
        assert_eq!(inv.count("berry"), 2);
    }

    #[test]
    fn inventory_remove_to_zero_drops_key() {
        let mut inv = Inventory::new();
        let _ = inv.add("berry", 2);
        assert_eq!(inv.remove("berry", 2).unwrap(), 0);
        assert!(inv.is_empty());
    }

    #[test]
    fn inventory_has() {
        let mut inv = Inventory::new();
        let _ = inv.add("wood", 4);
        assert!(inv.has("wood", 4));
        assert!(!inv.has("wood", 5));
        assert!(inv.has("stone", 0));
    }

    #[test]
    fn inventory_add_overflow_is_rejected() {
        let mut inv = Inventory::new();
        let _ = inv.add("berry", u32::MAX);
        let err = inv.add("berry", 1).unwrap_err();
        assert!(matches!(err, InventoryError::Overflow { .. }));
        assert_eq!(inv.count("berry"), u32::MAX);
    }

    #[test]
    fn lease_expiry_is_half_open() {
        let lease = Lease {
            lease_id: LeaseId::new(),
            entity_id: EntityId::new("a"),
            controller_id: ControllerId::new("ctl"),
            issued_at_ms: 1_000,
            expires_at_ms: 31_000,
        };
        assert!(!lease.is_expired(30_999));
        assert!(lease.is_expired(31_000));
    }
}
