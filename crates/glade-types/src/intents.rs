//! Intent types: what an agent asks its entity to attempt during one tick.
//!
//! An intent is a tagged variant; exactly one may be queued per entity per
//! tick, and resubmission replaces the previous slot. Entities with no
//! queued intent at the deadline implicitly [`Intent::Wait`].

use serde::{Deserialize, Serialize};

use crate::grid::Direction;
use crate::ids::ObjectId;

/// A single-tick request from a controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    /// Step one tile in the given direction. A `none` direction waits.
    Move {
        /// The compass heading to step toward.
        direction: Direction,
    },

    /// Transfer items from a co-located object into the actor's inventory.
    Collect {
        /// The object to collect from.
        object_id: ObjectId,
        /// The item kind to collect (the object must expose
        /// `"{item_type}_count"` in its state map).
        item_type: String,
        /// How many items to transfer.
        quantity: u32,
    },

    /// Consume items from the actor's own inventory.
    Eat {
        /// The item kind to consume.
        item_type: String,
        /// How many items to consume.
        quantity: u32,
    },

    /// Pick up loose items from the actor's tile. Schema-reserved; fails
    /// with `not_implemented` in v1.
    Pickup {
        /// The item kind to pick up.
        kind: String,
        /// How many items to pick up.
        quantity: u32,
    },

    /// Use a carried item. Schema-reserved; fails with `not_implemented`
    /// in v1.
    Use {
        /// The item kind to use.
        kind: String,
        /// How many items to use.
        quantity: u32,
    },

    /// Speak; heard by entities within the hearing radius next tick.
    Say {
        /// The spoken text.
        text: String,
        /// Free-form channel tag (`"local"`, ...).
        channel: String,
    },

    /// Do nothing this tick. Also the implicit default.
    Wait,
}

impl Intent {
    /// The stable snake_case tag for this intent, as used on the wire and
    /// in action records.
    pub const fn kind(&self) -> IntentKind {
        match self {
            Self::Move { .. } => IntentKind::Move,
            Self::Collect { .. } => IntentKind::Collect,
            Self::Eat { .. } => IntentKind::Eat,
            Self::Pickup { .. } => IntentKind::Pickup,
            Self::Use { .. } => IntentKind::Use,
            Self::Say { .. } => IntentKind::Say,
            Self::Wait => IntentKind::Wait,
        }
    }
}

/// The discriminant of an [`Intent`], used in action records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// A movement intent.
    Move,
    /// A collect intent.
    Collect,
    /// An eat intent.
    Eat,
    /// A pickup intent.
    Pickup,
    /// A use intent.
    Use,
    /// A say intent.
    Say,
    /// A wait intent.
    Wait,
}

impl core::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let tag = match self {
            Self::Move => "move",
            Self::Collect => "collect",
            Self::Eat => "eat",
            Self::Pickup => "pickup",
            Self::Use => "use",
            Self::Say => "say",
            Self::Wait => "wait",
        };
        write!(f, "{tag}")
    }
}

/// Why an intent submission was rejected at the boundary.
///
/// Every rejection carries exactly one machine-readable reason; nothing is
/// swallowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The submission named a tick other than the one currently open.
    WrongTick,
    /// The submission named the current tick but arrived after its deadline.
    LateTick,
    /// The lease is unknown, expired, or does not match the entity.
    InvalidLease,
    /// The intent is structurally invalid (for example a zero quantity).
    IllegalAction,
    /// The named entity does not exist.
    UnknownEntity,
}

impl core::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let tag = match self {
            Self::WrongTick => "wrong_tick",
            Self::LateTick => "late_tick",
            Self::InvalidLease => "invalid_lease",
            Self::IllegalAction => "illegal_action",
            Self::UnknownEntity => "unknown_entity",
        };
        write!(f, "{tag}")
    }
}
