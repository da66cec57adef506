//! Shared type definitions for the Glade world runtime.
//!
//! This crate is the single source of truth for all types used across the
//! Glade workspace: grid primitives, entity and object records, intents,
//! per-tick results, observation payloads, and the gateway wire shapes.
//!
//! # Modules
//!
//! - [`ids`] — Type-safe identifier wrappers (string ids and lease UUIDs)
//! - [`grid`] — Positions, compass directions, and tiles
//! - [`structs`] — Inventories, entities, world objects, and leases
//! - [`intents`] — Intent variants and boundary rejection reasons
//! - [`results`] — Per-tick move/action/object-change records
//! - [`perception`] — Observation payloads delivered to controllers
//! - [`wire`] — JSON shapes for the gateway REST and `WebSocket` surface

pub mod grid;
pub mod ids;
pub mod intents;
pub mod perception;
pub mod results;
pub mod structs;
pub mod wire;

// Re-export all public types at crate root for convenience.
pub use grid::{Direction, Position, Tile};
pub use ids::{ControllerId, EntityId, LeaseId, ObjectId};
pub use intents::{Intent, IntentKind, RejectReason};
pub use perception::{
    EntityView, Observation, ObservationFrame, ObservedEvent, ObjectView, SelfView, TileView,
    Utterance,
};
pub use results::{ActionRecord, MoveFailure, MoveRecord, ObjectChange, TickResult};
pub use structs::{Entity, Inventory, InventoryError, Lease, WorldObject};
pub use wire::{
    AcquireLeaseRequest, DiscoveryEntry, LeaseGrantResponse, ReleaseLeaseRequest,
    ReleaseLeaseResponse, RenewLeaseRequest, SubmitIntentRequest, SubmitIntentResponse,
    TickAnnounce, ViewerMessage, ViewerMove, WorldSize, WorldSnapshot,
};
