//! In-process API tests over the full router, backed by the in-memory
//! ledger and the scripted replication command port.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use bloomnet_core::{ApiContext, build_router};
use bloomnet_fleet::{FleetLayout, FleetManager, FleetManagerOptions};
use bloomnet_health::HealthProber;
use bloomnet_ledger_memory::MemoryLedger;
use bloomnet_replication_mock::MockReplicationAdmin;
use bloomnet_targets::TargetFeed;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

fn test_router(replication: MockReplicationAdmin) -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();

    let fleet = FleetManager::new(FleetManagerOptions {
        health: HealthProber::new(Duration::from_millis(250)),
        ledger: MemoryLedger::new(),
        targets: TargetFeed::new(dir.path()),
        replication,
        // Ports nothing listens on, so probes fail fast in tests.
        layout: FleetLayout {
            instance_a_port: 1,
            instance_b_port: 2,
            ..FleetLayout::default()
        },
    });

    let router = build_router(ApiContext {
        fleet: Arc::new(fleet),
    });

    (router, dir)
}

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn liveness_reports_online() {
    let (router, _dir) = test_router(MockReplicationAdmin::new());

    let response = router.oneshot(get_request("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "BloomNet Kernel Online");
}

#[tokio::test]
async fn register_then_list_nodes() {
    let (router, _dir) = test_router(MockReplicationAdmin::new());

    let response = router
        .clone()
        .oneshot(form_request("/register-node", "name=alpha&ip=127.0.0.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "registered");
    assert_eq!(body["health"]["status"], "degraded");

    let response = router.oneshot(get_request("/nodes")).await.unwrap();
    let body = body_json(response).await;

    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "alpha");
    assert_eq!(body[0]["instances"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn deleting_unknown_node_is_404() {
    let (router, _dir) = test_router(MockReplicationAdmin::new());

    let response = router.oneshot(delete_request("/nodes/ghost")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The detail field is what operator tooling surfaces.
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("ghost"));
}

#[tokio::test]
async fn forming_cluster_with_one_alias_is_rejected() {
    let replication = MockReplicationAdmin::new();
    let (router, _dir) = test_router(replication.clone());

    let response = router
        .oneshot(form_request("/clusters", "name=prod&aliases=solo,"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(replication.commands().is_empty());
}

#[tokio::test]
async fn cluster_lifecycle_over_the_api() {
    let replication = MockReplicationAdmin::new()
        .with_alias("a", "http://10.0.0.1:9000")
        .with_alias("b", "http://10.0.0.2:9000");
    let (router, _dir) = test_router(replication);

    // Register the two member nodes first so formation can link them.
    for (name, ip) in [("alpha", "10.0.0.1"), ("beta", "10.0.0.2")] {
        let response = router
            .clone()
            .oneshot(form_request(
                "/register-node",
                &format!("name={name}&ip={ip}"),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = router
        .clone()
        .oneshot(form_request("/clusters", "name=prod&aliases=a, b"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["resolved"]["a"], "10.0.0.1");
    assert_eq!(body["unresolved"].as_array().unwrap().len(), 0);

    let response = router.clone().oneshot(get_request("/clusters")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body[0]["name"], "prod");
    assert_eq!(body[0]["node_count"], 2);

    let response = router
        .clone()
        .oneshot(delete_request("/clusters/prod"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(delete_request("/clusters/prod"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn alias_lifecycle_over_the_api() {
    let (router, _dir) = test_router(MockReplicationAdmin::new());

    let response = router
        .clone()
        .oneshot(form_request("/aliases", "alias=alpha&ip=10.0.0.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["target"], "http://10.0.0.1:9000");

    let response = router.clone().oneshot(get_request("/aliases")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["aliases"][0]["alias"], "alpha");

    let response = router
        .clone()
        .oneshot(delete_request("/aliases/alpha"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Removing it again fails inside the command port.
    let response = router
        .oneshot(delete_request("/aliases/alpha"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn wipe_alias_reports_logs() {
    let (router, _dir) = test_router(MockReplicationAdmin::new());

    let response = router
        .oneshot(form_request("/wipe-alias", "alias=alpha"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "wiped");
    assert_eq!(body["logs"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_routes_fall_back_to_404() {
    let (router, _dir) = test_router(MockReplicationAdmin::new());

    let response = router.oneshot(get_request("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
