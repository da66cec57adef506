//! The per-tick intent inbox.
//!
//! One slot exists per `(tick, entity)`. While a tick is open, a valid
//! submission fills (or replaces) the entity's slot; the last valid intent
//! wins. At the deadline the queue closes and is drained for resolution;
//! entities without a slot implicitly wait.
//!
//! The queue only enforces tick targeting and the deadline. Lease and
//! entity validation happen in the core before submission reaches it.

use std::collections::BTreeMap;

use glade_types::{EntityId, Intent, RejectReason};
use tracing::trace;

/// The intent inbox for the tick currently being served.
#[derive(Debug, Default)]
pub struct IntentQueue {
    /// The tick submissions must target.
    tick_id: u64,
    /// Whether the tick is still accepting intents.
    open: bool,
    /// One slot per entity; replacement is idempotent last-write-wins.
    slots: BTreeMap<EntityId, Intent>,
}

impl IntentQueue {
    /// Create a queue with no open tick. All submissions are rejected
    /// until [`IntentQueue::open_for`] is called.
    pub const fn new() -> Self {
        Self {
            tick_id: 0,
            open: false,
            slots: BTreeMap::new(),
        }
    }

    /// Open the queue for a new tick, discarding any stale slots.
    pub fn open_for(&mut self, tick_id: u64) {
        self.tick_id = tick_id;
        self.open = true;
        self.slots.clear();
    }

    /// Close the queue at the deadline. Later submissions for this tick
    /// are rejected as late.
    pub const fn close(&mut self) {
        self.open = false;
    }

    /// The tick submissions must currently target.
    pub const fn tick_id(&self) -> u64 {
        self.tick_id
    }

    /// Whether the queue is accepting submissions.
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Number of filled slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slots are filled.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Queue an intent for `entity_id` targeting `tick_id`.
    ///
    /// Resubmission for the same tick replaces the previous slot.
    ///
    /// # Errors
    ///
    /// Returns [`RejectReason::WrongTick`] when `tick_id` is not the tick
    /// being served, or [`RejectReason::LateTick`] when it is but the
    /// deadline has passed.
    pub fn submit(
        &mut self,
        entity_id: EntityId,
        tick_id: u64,
        intent: Intent,
    ) -> Result<(), RejectReason> {
        if tick_id != self.tick_id {
            return Err(RejectReason::WrongTick);
        }
        if !self.open {
            return Err(RejectReason::LateTick);
        }
        let replaced = self.slots.insert(entity_id.clone(), intent).is_some();
        trace!(tick_id, entity_id = %entity_id, replaced, "Intent queued");
        Ok(())
    }

    /// Take all queued intents, leaving the queue empty.
    pub fn drain(&mut self) -> BTreeMap<EntityId, Intent> {
        core::mem::take(&mut self.slots)
    }
}
