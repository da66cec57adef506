//! `WebSocket` handlers: the tick feed, the viewer channel, and the
//! per-entity observation stream.
//!
//! Every stream rides a broadcast receiver from the hub. If a client
//! falls behind its bounded queue, the oldest pending messages are
//! dropped (recorded in the hub's `dropped` counter) and the client
//! resumes from newer ones — slow consumers never stall the tick loop.
//! Clients are expected to tolerate gaps and resynchronize from the next
//! self-contained message.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use glade_types::{EntityId, LeaseId, ViewerMessage};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::state::GatewayState;

/// Close code sent when an observation stream's lease ends.
const CLOSE_LEASE_EXPIRED: u16 = 4000;

/// Query parameters for the observation stream.
#[derive(Debug, Deserialize)]
pub struct ObserveQuery {
    /// The lease the stream is bound to.
    pub lease_id: LeaseId,
}

/// Upgrade `GET /ws/ticks` and stream one announcement per tick.
pub async fn ws_ticks(
    ws: WebSocketUpgrade,
    State(state): State<Arc<GatewayState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ticks(socket, state))
}

/// Upgrade `GET /ws/viewer`: a snapshot on connect, then tick-aligned
/// world events.
pub async fn ws_viewer(
    ws: WebSocketUpgrade,
    State(state): State<Arc<GatewayState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_viewer(socket, state))
}

/// Upgrade `GET /ws/observe/{entity_id}?lease_id=...`: one observation
/// per tick until the lease ends or the client disconnects.
pub async fn ws_observe(
    ws: WebSocketUpgrade,
    Path(entity_id): Path<String>,
    Query(query): Query<ObserveQuery>,
    State(state): State<Arc<GatewayState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        handle_observe(socket, state, EntityId::new(entity_id), query.lease_id)
    })
}

/// Forward tick announcements until the client goes away.
async fn handle_ticks(mut socket: WebSocket, state: Arc<GatewayState>) {
    debug!("Tick feed client connected");
    let mut rx = state.hub.subscribe_ticks();

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(announce) => {
                        if !send_json(&mut socket, &announce).await {
                            return;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        state.hub.record_dropped(n);
                        debug!(skipped = n, "Tick feed client lagged, skipping ahead");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Tick channel closed, shutting down feed");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                if client_went_away(&mut socket, msg).await {
                    debug!("Tick feed client disconnected");
                    return;
                }
            }
        }
    }
}

/// Send the snapshot, then forward viewer messages.
///
/// The subscription is taken *before* the snapshot is read, so the first
/// `tick_started` a client sees can never belong to a tick newer than its
/// snapshot.
async fn handle_viewer(mut socket: WebSocket, state: Arc<GatewayState>) {
    debug!("Viewer client connected");
    let mut rx = state.hub.subscribe_viewer();

    let snapshot = state.hub.snapshot().await;
    if !send_json(&mut socket, &ViewerMessage::Snapshot(snapshot)).await {
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(message) => {
                        if !send_json(&mut socket, &message).await {
                            return;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        state.hub.record_dropped(n);
                        debug!(skipped = n, "Viewer client lagged, skipping ahead");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Viewer channel closed, shutting down");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                if client_went_away(&mut socket, msg).await {
                    debug!("Viewer client disconnected");
                    return;
                }
            }
        }
    }
}

/// Forward observations for one entity while the bound lease stays
/// active; terminate with a `lease_expired` close otherwise.
async fn handle_observe(
    mut socket: WebSocket,
    state: Arc<GatewayState>,
    entity_id: EntityId,
    lease_id: LeaseId,
) {
    debug!(entity_id = %entity_id, lease_id = %lease_id, "Observer stream connected");
    let mut rx = state.hub.subscribe_observations();

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(frame) => {
                        if frame.entity_id != entity_id {
                            continue;
                        }
                        if frame.lease_id != Some(lease_id) {
                            debug!(entity_id = %entity_id, "Lease no longer active, closing stream");
                            let close = Message::Close(Some(CloseFrame {
                                code: CLOSE_LEASE_EXPIRED,
                                reason: "lease_expired".into(),
                            }));
                            let _ = socket.send(close).await;
                            return;
                        }
                        if !send_json(&mut socket, &frame.observation).await {
                            return;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        state.hub.record_dropped(n);
                        debug!(skipped = n, "Observer stream lagged, skipping ahead");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Observation channel closed, shutting down stream");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                if client_went_away(&mut socket, msg).await {
                    debug!(entity_id = %entity_id, "Observer stream disconnected");
                    return;
                }
            }
        }
    }
}

/// Serialize and send one frame. Returns `false` when the client is gone.
async fn send_json<T: serde::Serialize>(socket: &mut WebSocket, payload: &T) -> bool {
    let json = match serde_json::to_string(payload) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize outbound frame: {e}");
            return true;
        }
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}

/// Handle one inbound frame. Returns `true` when the connection is over.
async fn client_went_away(
    socket: &mut WebSocket,
    msg: Option<Result<Message, axum::Error>>,
) -> bool {
    match msg {
        Some(Ok(Message::Close(_))) | None => true,
        Some(Ok(Message::Ping(data))) => socket.send(Message::Pong(data)).await.is_err(),
        Some(Err(e)) => {
            debug!("WebSocket error: {e}");
            true
        }
        _ => {
            // Ignore text/binary frames from clients; all three streams
            // are server-push only.
            false
        }
    }
}
