//! Integration tests for the gateway REST endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. The resolution core is replaced by a stub task
//! that answers commands with canned responses, which validates handler
//! logic, routing, and the wire shapes without running a tick loop.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use glade_core::command::CoreCommand;
use glade_core::hub::BroadcastHub;
use glade_gateway::router::build_router;
use glade_gateway::state::GatewayState;
use glade_types::{
    DiscoveryEntry, EntityId, LeaseGrantResponse, LeaseId, RejectReason, ReleaseLeaseResponse,
    SubmitIntentResponse, WorldSize, WorldSnapshot,
};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tower::ServiceExt;

/// A canned lease id so tests can assert on the exact wire value.
fn stub_lease_id() -> LeaseId {
    LeaseId::new()
}

/// Spawn a stub core that answers every command with fixed data.
fn stub_core(lease_id: LeaseId) -> mpsc::Sender<CoreCommand> {
    let (tx, mut rx) = mpsc::channel::<CoreCommand>(16);
    tokio::spawn(async move {
        while let Some(command) = rx.recv().await {
            match command {
                CoreCommand::AcquireLease { request, reply } => {
                    let response = if request.entity_id == EntityId::new("ghost") {
                        LeaseGrantResponse::denied("unknown_entity")
                    } else {
                        LeaseGrantResponse {
                            success: true,
                            lease_id: Some(lease_id),
                            expires_at_ms: Some(31_000),
                            reason: None,
                        }
                    };
                    let _ = reply.send(response);
                }
                CoreCommand::RenewLease { lease_id: id, reply } => {
                    let response = if id == lease_id {
                        LeaseGrantResponse {
                            success: true,
                            lease_id: Some(id),
                            expires_at_ms: Some(62_000),
                            reason: None,
                        }
                    } else {
                        LeaseGrantResponse::denied("unknown_lease")
                    };
                    let _ = reply.send(response);
                }
                CoreCommand::ReleaseLease { lease_id: id, reply } => {
                    let _ = reply.send(ReleaseLeaseResponse {
                        success: id == lease_id,
                    });
                }
                CoreCommand::SubmitIntent { request, reply } => {
                    let response = if request.tick_id == 7 {
                        SubmitIntentResponse::accepted()
                    } else {
                        SubmitIntentResponse::rejected(RejectReason::WrongTick)
                    };
                    let _ = reply.send(response);
                }
                CoreCommand::ListEntities { reply } => {
                    let _ = reply.send(vec![DiscoveryEntry {
                        entity_id: EntityId::new("walker-1"),
                        entity_type: String::from("walker"),
                        tags: vec![String::from("seed")],
                        spawn_tick: 0,
                        has_active_lease: true,
                    }]);
                }
            }
        }
    });
    tx
}

async fn make_state(lease_id: LeaseId) -> Arc<GatewayState> {
    let hub = Arc::new(BroadcastHub::new(16));
    hub.update_snapshot(WorldSnapshot {
        tick_id: 3,
        entities: Vec::new(),
        objects: Vec::new(),
        world_size: WorldSize {
            width: 10,
            height: 10,
        },
        tick_duration_ms: 1_000,
    })
    .await;
    Arc::new(GatewayState::new(stub_core(lease_id), hub))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(path: &str, payload: &Value) -> Request<Body> {
    Request::post(path)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

#[tokio::test]
async fn index_returns_html() {
    let state = make_state(stub_lease_id()).await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));
}

#[tokio::test]
async fn get_world_serves_the_snapshot() {
    let state = make_state(stub_lease_id()).await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/api/world").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["tick_id"], 3);
    assert_eq!(json["world_size"]["width"], 10);
}

#[tokio::test]
async fn acquire_lease_roundtrip() {
    let lease_id = stub_lease_id();
    let state = make_state(lease_id).await;
    let router = build_router(state);

    let response = router
        .oneshot(post_json(
            "/api/lease/acquire",
            &json!({"entity_id": "walker-1", "controller_id": "ctl-a"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["lease_id"], lease_id.to_string());
    assert_eq!(json["expires_at_ms"], 31_000);
}

#[tokio::test]
async fn acquire_lease_denial_carries_reason() {
    let state = make_state(stub_lease_id()).await;
    let router = build_router(state);

    let response = router
        .oneshot(post_json(
            "/api/lease/acquire",
            &json!({"entity_id": "ghost", "controller_id": "ctl-a"}),
        ))
        .await
        .unwrap();

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["reason"], "unknown_entity");
    assert!(json.get("lease_id").is_none());
}

#[tokio::test]
async fn renew_and_release_roundtrip() {
    let lease_id = stub_lease_id();
    let state = make_state(lease_id).await;
    let router = build_router(state);

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/lease/renew",
            &json!({"lease_id": lease_id.to_string()}),
        ))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["expires_at_ms"], 62_000);

    let response = router
        .oneshot(post_json(
            "/api/lease/release",
            &json!({"lease_id": lease_id.to_string()}),
        ))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["success"], true);
}

#[tokio::test]
async fn submit_intent_accepted_and_rejected() {
    let lease_id = stub_lease_id();
    let state = make_state(lease_id).await;
    let router = build_router(state);

    let accepted = router
        .clone()
        .oneshot(post_json(
            "/api/intent",
            &json!({
                "lease_id": lease_id.to_string(),
                "entity_id": "walker-1",
                "tick_id": 7,
                "intent": {"type": "move", "direction": "e"},
            }),
        ))
        .await
        .unwrap();
    let json = body_to_json(accepted.into_body()).await;
    assert_eq!(json["accepted"], true);
    assert!(json.get("reason").is_none());

    let rejected = router
        .oneshot(post_json(
            "/api/intent",
            &json!({
                "lease_id": lease_id.to_string(),
                "entity_id": "walker-1",
                "tick_id": 8,
                "intent": {"type": "wait"},
            }),
        ))
        .await
        .unwrap();
    let json = body_to_json(rejected.into_body()).await;
    assert_eq!(json["accepted"], false);
    assert_eq!(json["reason"], "wrong_tick");
}

#[tokio::test]
async fn list_entities_discovery_shape() {
    let state = make_state(stub_lease_id()).await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/api/entities").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json[0]["entity_id"], "walker-1");
    assert_eq!(json[0]["entity_type"], "walker");
    assert_eq!(json[0]["has_active_lease"], true);
    assert_eq!(json[0]["tags"][0], "seed");
}

#[tokio::test]
async fn core_gone_yields_service_unavailable() {
    let hub = Arc::new(BroadcastHub::new(16));
    let (tx, rx) = mpsc::channel::<CoreCommand>(1);
    drop(rx);
    let state = Arc::new(GatewayState::new(tx, hub));
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/api/entities").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn malformed_intent_body_is_a_client_error() {
    let state = make_state(stub_lease_id()).await;
    let router = build_router(state);

    let response = router
        .oneshot(post_json(
            "/api/intent",
            &json!({"entity_id": "walker-1", "tick_id": 7}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
