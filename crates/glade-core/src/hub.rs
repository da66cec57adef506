//! The broadcast hub: tick-aligned fan-out to observers and viewers.
//!
//! The hub owns three broadcast channels — the agent-facing tick feed,
//! the per-entity observation stream, and the viewer channel — plus the
//! latest world snapshot served to fresh viewer connections and the
//! runtime counters.
//!
//! Push is best-effort with backpressure: each channel is a ring of
//! `queue_depth` messages, so a subscriber that falls behind loses its
//! oldest pending messages (the adapter records the loss in the `dropped`
//! counter) and resumes from newer ones. Slow consumers can never stall
//! the tick loop. Per subscriber, delivery order always matches publish
//! order.

use std::sync::atomic::{AtomicU64, Ordering};

use glade_types::{ObservationFrame, TickAnnounce, ViewerMessage, WorldSnapshot, WorldSize};
use tokio::sync::{RwLock, broadcast};

/// A point-in-time copy of the hub's runtime counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct HubCounters {
    /// Messages lost to lagging subscribers.
    pub dropped: u64,
    /// Ticks whose resolution ran past the tick period.
    pub overruns: u64,
    /// Intent submissions accepted into the queue.
    pub intents_accepted: u64,
    /// Intent submissions rejected at the boundary.
    pub intents_rejected: u64,
}

/// Fan-out state shared between the core task and the gateway.
#[derive(Debug)]
pub struct BroadcastHub {
    /// Agent-facing tick feed.
    ticks_tx: broadcast::Sender<TickAnnounce>,
    /// Per-entity observation frames (adapters filter by entity).
    observations_tx: broadcast::Sender<ObservationFrame>,
    /// Read-only viewer channel.
    viewer_tx: broadcast::Sender<ViewerMessage>,
    /// The latest snapshot, replaced by the core after every tick.
    snapshot: RwLock<WorldSnapshot>,
    /// Messages lost to lagging subscribers.
    dropped: AtomicU64,
    /// Ticks that overran their period.
    overruns: AtomicU64,
    /// Intent submissions accepted.
    intents_accepted: AtomicU64,
    /// Intent submissions rejected.
    intents_rejected: AtomicU64,
}

impl BroadcastHub {
    /// Create a hub whose channels buffer `queue_depth` messages per
    /// subscriber.
    pub fn new(queue_depth: usize) -> Self {
        let depth = queue_depth.max(1);
        let (ticks_tx, _) = broadcast::channel(depth);
        let (observations_tx, _) = broadcast::channel(depth);
        let (viewer_tx, _) = broadcast::channel(depth);
        Self {
            ticks_tx,
            observations_tx,
            viewer_tx,
            snapshot: RwLock::new(WorldSnapshot {
                tick_id: 0,
                entities: Vec::new(),
                objects: Vec::new(),
                world_size: WorldSize {
                    width: 0,
                    height: 0,
                },
                tick_duration_ms: 0,
            }),
            dropped: AtomicU64::new(0),
            overruns: AtomicU64::new(0),
            intents_accepted: AtomicU64::new(0),
            intents_rejected: AtomicU64::new(0),
        }
    }

    /// Subscribe to the agent-facing tick feed.
    pub fn subscribe_ticks(&self) -> broadcast::Receiver<TickAnnounce> {
        self.ticks_tx.subscribe()
    }

    /// Subscribe to the observation stream.
    pub fn subscribe_observations(&self) -> broadcast::Receiver<ObservationFrame> {
        self.observations_tx.subscribe()
    }

    /// Subscribe to the viewer channel.
    pub fn subscribe_viewer(&self) -> broadcast::Receiver<ViewerMessage> {
        self.viewer_tx.subscribe()
    }

    /// Publish a tick announcement. Returns the number of receivers.
    ///
    /// Zero receivers is normal (no agents connected) and not an error.
    pub fn publish_tick(&self, announce: TickAnnounce) -> usize {
        self.ticks_tx.send(announce).unwrap_or(0)
    }

    /// Publish an observation frame. Returns the number of receivers.
    pub fn publish_observation(&self, frame: ObservationFrame) -> usize {
        self.observations_tx.send(frame).unwrap_or(0)
    }

    /// Publish a viewer message. Returns the number of receivers.
    pub fn publish_viewer(&self, message: ViewerMessage) -> usize {
        self.viewer_tx.send(message).unwrap_or(0)
    }

    /// Replace the snapshot served to fresh viewer connections.
    pub async fn update_snapshot(&self, snapshot: WorldSnapshot) {
        *self.snapshot.write().await = snapshot;
    }

    /// The latest snapshot.
    pub async fn snapshot(&self) -> WorldSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Record `count` messages lost by a lagging subscriber.
    pub fn record_dropped(&self, count: u64) {
        self.dropped.fetch_add(count, Ordering::Relaxed);
    }

    /// Record a tick that overran its period.
    pub fn record_overrun(&self) {
        self.overruns.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an accepted intent submission.
    pub fn record_intent_accepted(&self) {
        self.intents_accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected intent submission.
    pub fn record_intent_rejected(&self) {
        self.intents_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// A point-in-time copy of the runtime counters.
    pub fn counters(&self) -> HubCounters {
        HubCounters {
            dropped: self.dropped.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
            intents_accepted: self.intents_accepted.load(Ordering::Relaxed),
            intents_rejected: self.intents_rejected.load(Ordering::Relaxed),
        }
    }
}
