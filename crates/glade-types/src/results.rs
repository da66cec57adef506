//! Per-tick outcome records: moves, actions, and object changes.
//!
//! The scheduler assembles one [`TickResult`] per tick after resolution and
//! enactment. It is consumed twice: by the next tick's observation
//! generation (event derivation) and by the viewer broadcast (projected to
//! the wire shapes in [`crate::wire`]).

use serde::{Deserialize, Serialize};

use crate::grid::Position;
use crate::ids::{EntityId, ObjectId};
use crate::intents::IntentKind;
use crate::structs::Entity;

/// Why a move claim failed.
///
/// The first three variants come out of conflict detection; the rest are
/// validation rejections that never entered resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveFailure {
    /// Two claims attempted to exchange positions.
    Swap,
    /// The claim participated in a rotation cycle of length three or more.
    Cycle,
    /// Another claim won the destination on the lexicographic tie-break.
    Contested,
    /// The destination is held by an entity that is not vacating it.
    Blocked,
    /// The destination lies outside the grid.
    OutOfBounds,
    /// The destination tile is not walkable.
    NotWalkable,
    /// A diagonal step with a non-walkable intervening cardinal neighbor.
    CornerCut,
}

impl core::fmt::Display for MoveFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let tag = match self {
            Self::Swap => "swap",
            Self::Cycle => "cycle",
            Self::Contested => "contested",
            Self::Blocked => "blocked",
            Self::OutOfBounds => "out_of_bounds",
            Self::NotWalkable => "not_walkable",
            Self::CornerCut => "corner_cut",
        };
        write!(f, "{tag}")
    }
}

/// The outcome of one entity's move attempt this tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// The moving entity.
    pub entity_id: EntityId,
    /// Position at tick start.
    pub from: Position,
    /// Claimed destination.
    pub to: Position,
    /// Whether the move was enacted.
    pub success: bool,
    /// Failure reason when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<MoveFailure>,
}

/// The outcome of one entity's non-movement action this tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// The acting entity.
    pub entity_id: EntityId,
    /// Which action was attempted.
    pub action_type: IntentKind,
    /// Whether the action succeeded.
    pub success: bool,
    /// Free-form detail, for example a failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// A single string-encoded field change on a world object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectChange {
    /// The changed object.
    pub object_id: ObjectId,
    /// The state-map field that changed.
    pub field: String,
    /// The previous string-encoded value.
    pub old_value: String,
    /// The new string-encoded value.
    pub new_value: String,
}

/// Everything that happened during one tick.
///
/// Finalized exactly once per tick; once emitted, the `tick_id` is never
/// reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickResult {
    /// The tick this result describes.
    pub tick_id: u64,
    /// Move outcomes, in `entity_id` order.
    pub moves: Vec<MoveRecord>,
    /// Non-movement action outcomes, in `entity_id` order.
    pub actions: Vec<ActionRecord>,
    /// Object state-field changes, in application order.
    pub object_changes: Vec<ObjectChange>,
    /// Entities spawned during this tick.
    pub spawns: Vec<Entity>,
    /// Entities despawned during this tick (their final records, so
    /// consumers still know where they stood).
    pub despawns: Vec<Entity>,
}

impl TickResult {
    /// An empty result for the given tick.
    pub const fn empty(tick_id: u64) -> Self {
        Self {
            tick_id,
            moves: Vec::new(),
            actions: Vec::new(),
            object_changes: Vec::new(),
            spawns: Vec::new(),
            despawns: Vec::new(),
        }
    }
}
