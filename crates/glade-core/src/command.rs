//! The core command inbox.
//!
//! Boundary adapters never touch world state, the intent queue, or the
//! lease manager directly. They send a [`CoreCommand`] through a bounded
//! mpsc inbox and await the reply on a oneshot channel; the scheduler
//! drains the inbox at its suspension points and applies each command on
//! the single resolution thread.

use glade_types::{
    AcquireLeaseRequest, DiscoveryEntry, LeaseGrantResponse, LeaseId, ReleaseLeaseResponse,
    SubmitIntentRequest, SubmitIntentResponse,
};
use tokio::sync::oneshot;

/// A request from a boundary adapter to the resolution core.
#[derive(Debug)]
pub enum CoreCommand {
    /// Queue an intent for the currently open tick.
    SubmitIntent {
        /// The submission payload.
        request: SubmitIntentRequest,
        /// Reply channel.
        reply: oneshot::Sender<SubmitIntentResponse>,
    },

    /// Acquire (or renew-by-acquire) a lease.
    AcquireLease {
        /// The acquisition payload.
        request: AcquireLeaseRequest,
        /// Reply channel.
        reply: oneshot::Sender<LeaseGrantResponse>,
    },

    /// Renew an existing lease.
    RenewLease {
        /// The lease to renew.
        lease_id: LeaseId,
        /// Reply channel.
        reply: oneshot::Sender<LeaseGrantResponse>,
    },

    /// Release a lease explicitly.
    ReleaseLease {
        /// The lease to release.
        lease_id: LeaseId,
        /// Reply channel.
        reply: oneshot::Sender<ReleaseLeaseResponse>,
    },

    /// List the controllable entities.
    ListEntities {
        /// Reply channel.
        reply: oneshot::Sender<Vec<DiscoveryEntry>>,
    },
}
