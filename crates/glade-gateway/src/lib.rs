//! Gateway API server (Axum HTTP + `WebSocket`) for the Glade world
//! runtime.
//!
//! The gateway is a boundary adapter: it translates wire JSON to the
//! typed values of the core and back, and never mutates world state
//! directly. Unary operations flow through the core's command inbox;
//! streams ride the broadcast hub.
//!
//! # Modules
//!
//! - [`state`] — Shared [`GatewayState`] (command sender + hub)
//! - [`handlers`] — REST endpoints (leases, intents, discovery, snapshot)
//! - [`ws`] — `WebSocket` streams (tick feed, viewer channel, observations)
//! - [`router`] — Route table and middleware assembly
//! - [`server`] — Listener binding and serve loop
//!
//! [`GatewayState`]: state::GatewayState

pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use server::{GatewayError, ServerConfig, spawn_server, start_server};
pub use state::GatewayState;
