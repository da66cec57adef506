//! REST endpoint handlers for the gateway server.
//!
//! Unary operations (lease acquire/renew/release, intent submission,
//! discovery) are translated into [`CoreCommand`] messages and awaited on
//! a oneshot reply; handlers never touch core state directly. Read
//! endpoints serve the hub's snapshot so they can never block the tick
//! loop.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `POST` | `/api/lease/acquire` | Acquire (or renew-by-acquire) a lease |
//! | `POST` | `/api/lease/renew` | Renew a lease |
//! | `POST` | `/api/lease/release` | Release a lease |
//! | `POST` | `/api/intent` | Submit an intent for the open tick |
//! | `GET` | `/api/entities` | Discovery listing |
//! | `GET` | `/api/world` | Current world snapshot |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use glade_core::command::CoreCommand;
use glade_types::{
    AcquireLeaseRequest, DiscoveryEntry, LeaseGrantResponse, ReleaseLeaseRequest,
    ReleaseLeaseResponse, RenewLeaseRequest, SubmitIntentRequest, SubmitIntentResponse,
    WorldSnapshot,
};
use tokio::sync::oneshot;

use crate::state::GatewayState;

/// Send a command to the core and await its reply.
///
/// Returns `503 Service Unavailable` when the core has shut down (its
/// inbox or the reply channel is gone).
async fn ask<T>(
    state: &GatewayState,
    make: impl FnOnce(oneshot::Sender<T>) -> CoreCommand,
) -> Result<T, StatusCode> {
    let (reply, rx) = oneshot::channel();
    state
        .commands
        .send(make(reply))
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;
    rx.await.map_err(|_| StatusCode::SERVICE_UNAVAILABLE)
}

/// Serve a minimal HTML page showing runtime status and API links.
pub async fn index(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    let snapshot = state.hub.snapshot().await;
    let counters = state.hub.counters();
    let tick = snapshot.tick_id;
    let entity_count = snapshot.entities.len();
    let object_count = snapshot.objects.len();
    let width = snapshot.world_size.width;
    let height = snapshot.world_size.height;
    let overruns = counters.overruns;
    let dropped = counters.dropped;
    let accepted = counters.intents_accepted;
    let rejected = counters.intents_rejected;

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Glade Gateway</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        .status {{ color: #3fb950; font-weight: bold; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Glade Gateway</h1>
    <p class="subtitle">Authoritative world runtime -- grid {width}x{height}</p>

    <p>Status: <span class="status">RUNNING</span></p>

    <div>
        <div class="metric">
            <div class="label">Tick</div>
            <div class="value">{tick}</div>
        </div>
        <div class="metric">
            <div class="label">Entities</div>
            <div class="value">{entity_count}</div>
        </div>
        <div class="metric">
            <div class="label">Objects</div>
            <div class="value">{object_count}</div>
        </div>
        <div class="metric">
            <div class="label">Overruns</div>
            <div class="value">{overruns}</div>
        </div>
        <div class="metric">
            <div class="label">Dropped</div>
            <div class="value">{dropped}</div>
        </div>
        <div class="metric">
            <div class="label">Intents ok / rejected</div>
            <div class="value">{accepted} / {rejected}</div>
        </div>
    </div>

    <hr>

    <h2>API</h2>
    <ul>
        <li>GET /api/world</li>
        <li>GET /api/entities</li>
        <li>POST /api/lease/acquire</li>
        <li>POST /api/lease/renew</li>
        <li>POST /api/lease/release</li>
        <li>POST /api/intent</li>
        <li>WS /ws/ticks</li>
        <li>WS /ws/viewer</li>
        <li>WS /ws/observe/&#123;entity_id&#125;?lease_id=...</li>
    </ul>
</body>
</html>"#
    ))
}

/// `POST /api/lease/acquire`
pub async fn acquire_lease(
    State(state): State<Arc<GatewayState>>,
    Json(request): Json<AcquireLeaseRequest>,
) -> Result<Json<LeaseGrantResponse>, StatusCode> {
    let response = ask(&state, |reply| CoreCommand::AcquireLease { request, reply }).await?;
    Ok(Json(response))
}

/// `POST /api/lease/renew`
pub async fn renew_lease(
    State(state): State<Arc<GatewayState>>,
    Json(request): Json<RenewLeaseRequest>,
) -> Result<Json<LeaseGrantResponse>, StatusCode> {
    let response = ask(&state, |reply| CoreCommand::RenewLease {
        lease_id: request.lease_id,
        reply,
    })
    .await?;
    Ok(Json(response))
}

/// `POST /api/lease/release`
pub async fn release_lease(
    State(state): State<Arc<GatewayState>>,
    Json(request): Json<ReleaseLeaseRequest>,
) -> Result<Json<ReleaseLeaseResponse>, StatusCode> {
    let response = ask(&state, |reply| CoreCommand::ReleaseLease {
        lease_id: request.lease_id,
        reply,
    })
    .await?;
    Ok(Json(response))
}

/// `POST /api/intent`
pub async fn submit_intent(
    State(state): State<Arc<GatewayState>>,
    Json(request): Json<SubmitIntentRequest>,
) -> Result<Json<SubmitIntentResponse>, StatusCode> {
    let response = ask(&state, |reply| CoreCommand::SubmitIntent { request, reply }).await?;
    Ok(Json(response))
}

/// `GET /api/entities`
pub async fn list_entities(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<Vec<DiscoveryEntry>>, StatusCode> {
    let entries = ask(&state, |reply| CoreCommand::ListEntities { reply }).await?;
    Ok(Json(entries))
}

/// `GET /api/world`
pub async fn get_world(State(state): State<Arc<GatewayState>>) -> Json<WorldSnapshot> {
    Json(state.hub.snapshot().await)
}
