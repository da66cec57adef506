//! Wire shapes for the gateway surface.
//!
//! These are the JSON payloads exchanged with external processes: the
//! agent-facing tick feed, lease and intent request/response bodies, the
//! discovery listing, and the read-only viewer push channel. Boundary
//! adapters translate between these shapes and the core's typed values;
//! nothing here is consulted by the resolution path itself.

use serde::{Deserialize, Serialize};

use crate::grid::Position;
use crate::ids::{ControllerId, EntityId, LeaseId};
use crate::intents::{Intent, RejectReason};
use crate::results::{MoveRecord, ObjectChange, TickResult};
use crate::structs::{Entity, WorldObject};

/// One message on the agent-facing tick feed, announcing a new tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickAnnounce {
    /// The tick that just opened.
    pub tick_id: u64,
    /// Wall-clock tick start, milliseconds since the Unix epoch.
    pub tick_start_ms: i64,
    /// Wall-clock intent deadline for this tick.
    pub intent_deadline_ms: i64,
    /// Configured tick period in milliseconds.
    pub tick_duration_ms: u64,
    /// Monotonic world version (the tick counter in v1).
    pub world_version: u64,
}

/// Request body for `POST /api/lease/acquire`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquireLeaseRequest {
    /// The entity to control.
    pub entity_id: EntityId,
    /// The requesting controller.
    pub controller_id: ControllerId,
}

/// Request body for `POST /api/lease/renew`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewLeaseRequest {
    /// The lease to renew.
    pub lease_id: LeaseId,
}

/// Request body for `POST /api/lease/release`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseLeaseRequest {
    /// The lease to release.
    pub lease_id: LeaseId,
}

/// Response body for lease acquire and renew.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseGrantResponse {
    /// Whether the grant succeeded.
    pub success: bool,
    /// The granted lease id (callers must use this value; a re-acquire by
    /// the holding controller supersedes the previous id).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lease_id: Option<LeaseId>,
    /// The new expiry, milliseconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at_ms: Option<i64>,
    /// Denial reason when `success` is false (`already_leased`, `expired`,
    /// `unknown_lease`, `unknown_entity`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl LeaseGrantResponse {
    /// A denial response with the given reason.
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            lease_id: None,
            expires_at_ms: None,
            reason: Some(reason.into()),
        }
    }
}

/// Response body for lease release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseLeaseResponse {
    /// Whether a lease was actually released.
    pub success: bool,
}

/// Request body for `POST /api/intent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitIntentRequest {
    /// The lease authorizing the submission.
    pub lease_id: LeaseId,
    /// The entity the intent is for.
    pub entity_id: EntityId,
    /// The tick the intent targets.
    pub tick_id: u64,
    /// The intent itself.
    pub intent: Intent,
}

/// Response body for `POST /api/intent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitIntentResponse {
    /// Whether the intent was queued.
    pub accepted: bool,
    /// Rejection reason when `accepted` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
}

impl SubmitIntentResponse {
    /// An acceptance response.
    pub const fn accepted() -> Self {
        Self {
            accepted: true,
            reason: None,
        }
    }

    /// A rejection response with the given reason.
    pub const fn rejected(reason: RejectReason) -> Self {
        Self {
            accepted: false,
            reason: Some(reason),
        }
    }
}

/// One row of the discovery listing (`GET /api/entities`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryEntry {
    /// The controllable entity.
    pub entity_id: EntityId,
    /// Its entity type tag.
    pub entity_type: String,
    /// Its spawn-time tags.
    pub tags: Vec<String>,
    /// The tick it was spawned on.
    pub spawn_tick: u64,
    /// Whether a controller currently holds an active lease on it.
    pub has_active_lease: bool,
}

/// Grid dimensions as carried in the viewer snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSize {
    /// Grid width in tiles.
    pub width: u32,
    /// Grid height in tiles.
    pub height: u32,
}

/// The full-state snapshot a viewer receives on connect.
///
/// Intentionally extensible: a future terrain-streaming subsystem may add
/// an optional `chunk_size` and per-chunk messages without breaking v1
/// consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// The current tick.
    pub tick_id: u64,
    /// All entities in the world.
    pub entities: Vec<Entity>,
    /// All objects in the world.
    pub objects: Vec<WorldObject>,
    /// Grid dimensions.
    pub world_size: WorldSize,
    /// Configured tick period in milliseconds.
    pub tick_duration_ms: u64,
}

/// A move outcome as projected onto the viewer channel.
///
/// Viewers only need the endpoints and the verdict; failure reasons stay
/// in the tick result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerMove {
    /// The moving entity.
    pub entity_id: EntityId,
    /// Position at tick start.
    pub from: Position,
    /// Claimed destination.
    pub to: Position,
    /// Whether the move was enacted.
    pub success: bool,
}

impl From<&MoveRecord> for ViewerMove {
    fn from(record: &MoveRecord) -> Self {
        Self {
            entity_id: record.entity_id.clone(),
            from: record.from,
            to: record.to,
            success: record.success,
        }
    }
}

/// A message on the read-only viewer push channel, keyed by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewerMessage {
    /// Full state, sent once on connect.
    Snapshot(WorldSnapshot),

    /// A tick has opened.
    TickStarted {
        /// The tick that opened.
        tick_id: u64,
        /// Wall-clock tick start, ms since epoch.
        tick_start_ms: i64,
        /// Wall-clock intent deadline for the tick.
        deadline_ms: i64,
        /// Configured tick period in milliseconds.
        tick_duration_ms: u64,
    },

    /// A tick has been resolved and enacted.
    TickCompleted {
        /// The completed tick.
        tick_id: u64,
        /// Move outcomes.
        moves: Vec<ViewerMove>,
        /// Object state changes.
        object_changes: Vec<ObjectChange>,
        /// How many non-movement actions were applied.
        actions_processed: u32,
    },

    /// An entity was spawned.
    EntitySpawned {
        /// The tick the spawn happened on.
        tick_id: u64,
        /// The spawned entity.
        entity: Entity,
    },

    /// An entity was despawned.
    EntityDespawned {
        /// The tick the despawn happened on.
        tick_id: u64,
        /// The despawned entity.
        entity_id: EntityId,
    },

    /// The server is shutting down; no further ticks will be emitted.
    Shutdown {
        /// The last completed tick.
        tick_id: u64,
    },
}

impl ViewerMessage {
    /// Project a [`TickResult`] into the `tick_completed` message.
    pub fn tick_completed(result: &TickResult) -> Self {
        let actions_processed = u32::try_from(result.actions.len()).unwrap_or(u32::MAX);
        Self::TickCompleted {
            tick_id: result.tick_id,
            moves: result.moves.iter().map(ViewerMove::from).collect(),
            object_changes: result.object_changes.clone(),
            actions_processed,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::results::MoveFailure;

    #[test]
    fn viewer_message_tags() {
        let msg = ViewerMessage::TickStarted {
            tick_id: 1,
            tick_start_ms: 1_000,
            deadline_ms: 1_500,
            tick_duration_ms: 1_000,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"tick_started""#));
    }

    #[test]
    fn snapshot_flattens_into_tagged_message() {
        let msg = ViewerMessage::Snapshot(WorldSnapshot {
            tick_id: 0,
            entities: Vec::new(),
            objects: Vec::new(),
            world_size: WorldSize {
                width: 10,
                height: 10,
            },
            tick_duration_ms: 1_000,
        });
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"snapshot""#));
        assert!(json.contains(r#""world_size":{"width":10,"height":10}"#));
    }

    #[test]
    fn tick_completed_projects_moves_without_reasons() {
        let result = TickResult {
            tick_id: 2,
            moves: vec![MoveRecord {
                entity_id: EntityId::new("a"),
                from: Position::new(0, 0),
                to: Position::new(1, 0),
                success: false,
                reason: Some(MoveFailure::Swap),
            }],
            actions: Vec::new(),
            object_changes: Vec::new(),
            spawns: Vec::new(),
            despawns: Vec::new(),
        };
        let msg = ViewerMessage::tick_completed(&result);
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""success":false"#));
        assert!(!json.contains("swap"));
    }

    #[test]
    fn submit_intent_response_shapes() {
        let ok = SubmitIntentResponse::accepted();
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"accepted":true}"#);

        let no = SubmitIntentResponse::rejected(RejectReason::LateTick);
        assert_eq!(
            serde_json::to_string(&no).unwrap(),
            r#"{"accepted":false,"reason":"late_tick"}"#
        );
    }
}
