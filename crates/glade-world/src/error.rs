//! Error types for the `glade-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias. A failed mutator leaves the world
//! untouched.

use glade_types::{EntityId, InventoryError, ObjectId, Position};

/// Errors that can occur during world-state operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A position lies outside the grid bounds.
    #[error("position {0} is out of bounds")]
    OutOfBounds(Position),

    /// A position's tile (or an object on it) is not walkable.
    #[error("position {0} is not walkable")]
    NotWalkable(Position),

    /// A position is already held by another entity.
    #[error("position {position} is occupied by {occupant}")]
    PositionOccupied {
        /// The contested position.
        position: Position,
        /// The entity currently standing there.
        occupant: EntityId,
    },

    /// An entity with this id already exists.
    #[error("duplicate entity id: {0}")]
    DuplicateEntity(EntityId),

    /// No entity with this id exists.
    #[error("unknown entity: {0}")]
    UnknownEntity(EntityId),

    /// An object with this id already exists.
    #[error("duplicate object id: {0}")]
    DuplicateObject(ObjectId),

    /// No object with this id exists.
    #[error("unknown object: {0}")]
    UnknownObject(ObjectId),

    /// An inventory operation on an entity failed.
    #[error("inventory error for {entity_id}: {source}")]
    Inventory {
        /// The entity whose inventory was touched.
        entity_id: EntityId,
        /// The underlying inventory error.
        source: InventoryError,
    },

    /// The tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// A structural invariant no longer holds. This signals a defect in
    /// the resolution path, never a caller mistake.
    #[error("world invariant violated: {detail}")]
    InvariantViolation {
        /// What exactly is inconsistent.
        detail: String,
    },
}
