//! Observation payloads: the per-entity, per-tick view of the world.
//!
//! An observation is self-contained — it carries everything inside the
//! observer's visibility radius plus the events it could have witnessed
//! last tick, so an observer that missed frames can resynchronize without
//! history.

use serde::{Deserialize, Serialize};

use crate::grid::Position;
use crate::ids::{EntityId, LeaseId, ObjectId};
use crate::structs::Inventory;

/// The observer's own state as included in its observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfView {
    /// The observing entity.
    pub entity_id: EntityId,
    /// Current position.
    pub position: Position,
    /// Carried items.
    pub inventory: Inventory,
    /// Packed status flags.
    pub status_bits: u32,
}

/// A non-default tile inside the visibility radius.
///
/// Tiles absent from `visible_tiles` are the default walkable ground;
/// positions outside the grid are never listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileView {
    /// The tile's position.
    pub position: Position,
    /// Whether entities may occupy the tile.
    pub walkable: bool,
    /// Whether the tile blocks sight (future visibility extension).
    pub opaque: bool,
    /// The tile's floor tag.
    pub floor_type: String,
}

/// Another entity inside the visibility radius.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityView {
    /// The visible entity.
    pub entity_id: EntityId,
    /// Its entity type tag.
    pub entity_type: String,
    /// Its position.
    pub position: Position,
    /// Its spawn-time tags.
    pub tags: Vec<String>,
}

/// A world object inside the visibility radius.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectView {
    /// The visible object.
    pub object_id: ObjectId,
    /// Its object type tag.
    pub object_type: String,
    /// Its position.
    pub position: Position,
    /// Its string-encoded state fields.
    pub state: std::collections::BTreeMap<String, String>,
}

/// An event the observer could have witnessed during the previous tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObservedEvent {
    /// An entity moved and at least one endpoint was visible.
    EntityMoved {
        /// The entity that moved.
        entity_id: EntityId,
        /// Where it moved from.
        from: Position,
        /// Where it moved to.
        to: Position,
    },

    /// A visible object's state field changed.
    ObjectChanged {
        /// The changed object.
        object_id: ObjectId,
        /// The state-map field that changed.
        field: String,
        /// The previous string-encoded value.
        old_value: String,
        /// The new string-encoded value.
        new_value: String,
    },

    /// An entity became visible to the observer.
    EntityEntered {
        /// The entity that entered view.
        entity_id: EntityId,
        /// Where it is now.
        position: Position,
    },

    /// An entity stopped being visible to the observer.
    EntityLeft {
        /// The entity that left view.
        entity_id: EntityId,
        /// Where it was last seen.
        position: Position,
    },

    /// A speaker within hearing radius said something.
    Utterance {
        /// The speaking entity.
        entity_id: EntityId,
        /// The spoken text.
        text: String,
        /// The channel tag.
        channel: String,
    },
}

/// One entity's view of the world at the start of a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// The tick this observation opens.
    pub tick_id: u64,
    /// Advisory wall-clock deadline (ms since epoch) for submitting an
    /// intent for this tick.
    pub deadline_ms: i64,
    /// The observer's own state.
    #[serde(rename = "self")]
    pub self_view: SelfView,
    /// Non-default tiles within the visibility radius.
    pub visible_tiles: Vec<TileView>,
    /// Other entities within the visibility radius.
    pub visible_entities: Vec<EntityView>,
    /// Objects within the visibility radius.
    pub visible_objects: Vec<ObjectView>,
    /// Events witnessed during the previous tick.
    pub events: Vec<ObservedEvent>,
}

/// A spoken utterance captured during action application.
///
/// Held by the scheduler until the next tick's observations are built,
/// where it surfaces as [`ObservedEvent::Utterance`] for entities within
/// the hearing radius of `position`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    /// The speaking entity.
    pub entity_id: EntityId,
    /// Where the speaker stood when speaking (post-move position).
    pub position: Position,
    /// The spoken text.
    pub text: String,
    /// The channel tag.
    pub channel: String,
}

/// An observation paired with delivery metadata, as published on the
/// observation broadcast channel.
///
/// The gateway forwards a frame to an observer stream only when the
/// frame's `lease_id` matches the lease the stream was opened with; a
/// mismatch terminates the stream with a `lease_expired` status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationFrame {
    /// The observed entity.
    pub entity_id: EntityId,
    /// The lease currently active for the entity, if any.
    pub lease_id: Option<LeaseId>,
    /// The observation payload.
    pub observation: Observation,
}
