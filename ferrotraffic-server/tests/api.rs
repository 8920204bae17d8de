use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use ferrotraffic_core::prelude::*;
use ferrotraffic_server::{AppState, NetworkSize, ServerConfig, Updater, router};
use serde_json::Value;
use tower::ServiceExt;

const SQUARE: &str = include_str!("fixtures/cologne_square.geojson");

const SLOW_SOUTH_STREET: &str = r#"[
    {"id": "manual", "points": [[6.955, 50.9401]], "value": 5, "value_type": "speed", "mode": "replace"}
]"#;

fn app() -> Router {
    app_with_updater().0
}

fn app_with_updater() -> (Router, Arc<Updater>) {
    let graph = street_graph_from_geojson(SQUARE, &NetworkConfig::default()).unwrap();
    let size = NetworkSize::of(&graph);
    // Never polled, reports are pushed
    let source = HttpFeedSource::new(
        "http://127.0.0.1:9/traffic.php",
        Duration::from_secs(1),
        UsageSpeeds::default(),
    )
    .unwrap();
    let updater = TrafficUpdater::from_config(
        source,
        StateGate::new(graph),
        &TrafficConfig::default(),
    );

    let updater = Arc::new(updater);

    (
        router(AppState::new(Arc::clone(&updater), size), &ServerConfig::default()),
        updater,
    )
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn push(body: &str) -> Request<Body> {
    Request::post("/datafeed")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

const SOUTH_ROUTE: &str = "/route?from_lat=50.940&from_lon=6.950&to_lat=50.940&to_lon=6.960";

#[tokio::test]
async fn pushed_reports_are_applied_and_listed() {
    let app = app();

    let (status, roads) = send(&app, get("/roads")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(roads, serde_json::json!([]));

    let (status, stats) = send(&app, push(SLOW_SOUTH_STREET)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["updated"], 1);
    assert_eq!(stats["errors"], 0);

    let (_, roads) = send(&app, get("/roads")).await;
    assert_eq!(
        roads,
        serde_json::json!([{
            "id": "manual",
            "points": [[6.955, 50.9401]],
            "value": 5.0,
            "value_type": "speed",
            "mode": "replace"
        }])
    );
}

#[tokio::test]
async fn repeated_push_changes_nothing() {
    let app = app();
    send(&app, push(SLOW_SOUTH_STREET)).await;

    let (status, stats) = send(&app, push(SLOW_SOUTH_STREET)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["updated"], 0);
    assert_eq!(stats["unchanged"], 1);
}

#[tokio::test]
async fn unmatched_points_are_reported() {
    let app = app();

    let (status, stats) = send(
        &app,
        push(r#"[{"id": "paris", "points": [[2.35, 48.85]], "value": 20, "value_type": "speed", "mode": "replace"}]"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["errors"], 1);
    assert_eq!(stats["rejected"][0]["id"], "paris");
    assert_eq!(stats["rejected"][0]["reason"], "not_found");
}

#[tokio::test]
async fn malformed_push_is_a_bad_request() {
    let app = app();

    let (status, body) = send(
        &app,
        push(r#"[{"id": "x", "points": [], "value": 1, "value_type": "speed", "mode": "replace"}]"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, push("not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unsupported_policy_is_unprocessable() {
    let app = app();

    let (status, _) = send(
        &app,
        push(r#"[{"id": "x", "points": [[6.955, 50.9401]], "value": 1, "value_type": "travel_time", "mode": "replace"}]"#),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, roads) = send(&app, get("/roads")).await;
    assert_eq!(roads, serde_json::json!([]));
}

#[tokio::test]
async fn routes_follow_pushed_speeds() {
    let app = app();

    let (status, route) = send(&app, get(SOUTH_ROUTE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(route["travel_time"], 51);

    send(&app, push(SLOW_SOUTH_STREET)).await;

    let (_, route) = send(&app, get(SOUTH_ROUTE)).await;
    assert!(route["travel_time"].as_u64().unwrap() > 51);
    assert!(route["distance"].as_f64().unwrap() > 2000.0);
}

#[tokio::test]
async fn route_outside_network_is_not_found() {
    let app = app();

    let (status, _) = send(
        &app,
        get("/route?from_lat=48.85&from_lon=2.35&to_lat=50.940&to_lon=6.960"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_network_and_last_update() {
    let app = app();

    let (status, health) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
    assert_eq!(health["nodes"], 4);
    assert_eq!(health["edges"], 4);
    assert!(health["last_update"].is_null());

    send(&app, push(SLOW_SOUTH_STREET)).await;

    let (_, health) = send(&app, get("/health")).await;
    assert_eq!(health["snapshot_entries"], 1);
    assert_eq!(health["last_stats"]["updated"], 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn snapshot_and_health_do_not_wait_for_writer() {
    let (app, updater) = app_with_updater();
    let writer = updater.gate().write().unwrap();

    let requests = tokio::spawn(async move {
        let roads = send(&app, get("/roads")).await;
        let health = send(&app, get("/health")).await;
        (roads, health)
    });
    let ((roads_status, roads), (health_status, health)) =
        tokio::time::timeout(Duration::from_secs(2), requests)
            .await
            .expect("requests waited for the write lock")
            .unwrap();
    drop(writer);

    assert_eq!(roads_status, StatusCode::OK);
    assert_eq!(roads, serde_json::json!([]));
    assert_eq!(health_status, StatusCode::OK);
    assert_eq!(health["edges"], 4);
}
