//! Shared application state for the gateway server.
//!
//! [`GatewayState`] bundles the two ways an adapter may talk to the core:
//! the bounded command inbox (for unary operations — leases, intents,
//! discovery) and the [`BroadcastHub`] (for streams and the snapshot).
//! Handlers never hold world state of their own.

use std::sync::Arc;

use glade_core::command::CoreCommand;
use glade_core::hub::BroadcastHub;
use tokio::sync::mpsc;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct GatewayState {
    /// Command inbox into the resolution core.
    pub commands: mpsc::Sender<CoreCommand>,
    /// Fan-out channels, snapshot, and counters.
    pub hub: Arc<BroadcastHub>,
}

impl GatewayState {
    /// Bundle a command sender and a hub into gateway state.
    pub const fn new(commands: mpsc::Sender<CoreCommand>, hub: Arc<BroadcastHub>) -> Self {
        Self { commands, hub }
    }
}
