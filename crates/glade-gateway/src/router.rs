//! Axum router construction for the gateway API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin viewer access.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::GatewayState;
use crate::ws;

/// Build the complete Axum router for the gateway server.
///
/// The router includes:
/// - `GET /` — minimal HTML status page
/// - `GET /ws/ticks` — tick feed stream
/// - `GET /ws/viewer` — viewer push channel
/// - `GET /ws/observe/{entity_id}` — per-entity observation stream
/// - `POST /api/lease/acquire|renew|release` — lease operations
/// - `POST /api/intent` — intent submission
/// - `GET /api/entities` — discovery listing
/// - `GET /api/world` — current world snapshot
///
/// CORS is configured to allow any origin for development. In
/// production this should be restricted.
pub fn build_router(state: Arc<GatewayState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket streams
        .route("/ws/ticks", get(ws::ws_ticks))
        .route("/ws/viewer", get(ws::ws_viewer))
        .route("/ws/observe/{entity_id}", get(ws::ws_observe))
        // REST API
        .route("/api/lease/acquire", post(handlers::acquire_lease))
        .route("/api/lease/renew", post(handlers::renew_lease))
        .route("/api/lease/release", post(handlers::release_lease))
        .route("/api/intent", post(handlers::submit_intent))
        .route("/api/entities", get(handlers::list_entities))
        .route("/api/world", get(handlers::get_world))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
