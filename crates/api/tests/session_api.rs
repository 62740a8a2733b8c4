//! Integration tests for the session and order HTTP surface.
//!
//! Runs the full router over a `MemoryStore` and in-process fake upstream
//! services. Subscribers are attached straight to the hub to observe
//! broadcasts.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, create_body, post_raw, TestApp, FOREIGN_LOCATION, OWN_LOCATION};
use serde_json::json;
use tabsync_events::{BroadcastHub, SnapshotReceiver};

fn drain(rx: &mut SnapshotReceiver) -> Vec<String> {
    let mut states = Vec::new();
    while let Ok(snapshot) = rx.try_recv() {
        states.push(format!("{}:{}", snapshot.state(), snapshot.orders.len()));
    }
    states
}

// ---------------------------------------------------------------------------
// Test: creating a session returns the OPEN snapshot
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_session_returns_open_snapshot() {
    let app = TestApp::new();
    app.codes.queue("AB12");

    let response = app
        .post("/api/v1/sessions", create_body("Table 4", OWN_LOCATION))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["code"], "AB12");
    assert_eq!(data["name"], "Table 4");
    assert_eq!(data["location_id"], OWN_LOCATION);
    assert_eq!(data["state"], "OPEN");
    assert!(data["timestamp"].is_string());
    assert_eq!(data["orders"], json!([]));
    assert_eq!(app.store.session_count().await, 1);
}

// ---------------------------------------------------------------------------
// Test: adding an order updates the snapshot and pushes to subscribers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_order_pushes_snapshot_to_subscriber() {
    let app = TestApp::new();
    app.create_session("AB12", "Table 4").await;
    let mut kitchen = app.hub.subscribe("AB12", "kitchen").await;

    let response = app
        .post("/api/v1/orders", json!({"session_code": "AB12", "product_id": 7}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let orders = json["data"]["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["product_id"], 7);
    assert!(orders[0]["id"].is_i64());

    let pushed = kitchen.try_recv().unwrap();
    assert_eq!(pushed.code(), "AB12");
    assert_eq!(pushed.orders.len(), 1);
    assert_eq!(pushed.orders[0].product_id, 7);
}

// ---------------------------------------------------------------------------
// Test: a closed session refuses orders without broadcasting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn closed_session_refuses_orders() {
    let app = TestApp::new();
    app.create_session("AB12", "Table 4").await;
    let mut viewer = app.hub.subscribe("AB12", "viewer").await;

    let response = app.post("/api/v1/sessions/AB12/close", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["state"], "CLOSED");

    let response = app
        .post("/api/v1/orders", json!({"session_code": "AB12", "product_id": 7}))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["reason"], "session_closed");

    assert_eq!(app.store.order_count().await, 0);
    assert_eq!(drain(&mut viewer), vec!["CLOSED:0"]);
}

// ---------------------------------------------------------------------------
// Test: closing twice is a no-op the second time
// ---------------------------------------------------------------------------

#[tokio::test]
async fn closing_closed_session_does_not_broadcast() {
    let app = TestApp::new();
    app.create_session("AB12", "Table 4").await;
    let mut viewer = app.hub.subscribe("AB12", "viewer").await;

    for _ in 0..2 {
        let response = app.post("/api/v1/sessions/AB12/close", json!({})).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["state"], "CLOSED");
    }

    assert_eq!(drain(&mut viewer), vec!["CLOSED:0"]);
}

// ---------------------------------------------------------------------------
// Test: code service outage leaves nothing persisted
// ---------------------------------------------------------------------------

#[tokio::test]
async fn code_service_down_creates_nothing() {
    let app = TestApp::new();
    app.codes.set_down(true);

    let response = app
        .post("/api/v1/sessions", create_body("Table 4", OWN_LOCATION))
        .await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["reason"], "code_service_unavailable");
    assert_eq!(app.store.session_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: (name, location_id) is unique
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_name_at_location_is_conflict() {
    let app = TestApp::new();
    app.create_session("AB12", "Table 4").await;

    app.codes.queue("CD34");
    let response = app
        .post("/api/v1/sessions", create_body("Table 4", OWN_LOCATION))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["reason"], "duplicate_session");
    assert_eq!(app.store.session_count().await, 1);

    let response = app.get("/api/v1/sessions/CD34").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: credential failures are 403 invalid_credentials
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_credentials_are_rejected() {
    let app = TestApp::new();

    let mut bad_key = create_body("Table 4", OWN_LOCATION);
    bad_key["session_key"] = json!("stolen");

    let mut missing = create_body("Table 4", OWN_LOCATION);
    missing.as_object_mut().unwrap().remove("session_key");

    let foreign = create_body("Table 4", FOREIGN_LOCATION);

    for body in [bad_key, missing, foreign] {
        let response = app.post("/api/v1/sessions", body).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(response).await["reason"], "invalid_credentials");
    }
    assert_eq!(app.store.session_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: malformed create bodies never reach the upstream services
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_create_body_makes_no_upstream_call() {
    let app = TestApp::new();

    let mut no_name = create_body("Table 4", OWN_LOCATION);
    no_name.as_object_mut().unwrap().remove("name");

    let zero_location = create_body("Table 4", 0);

    for body in [no_name, zero_location, json!({"name": 5})] {
        let response = app.post("/api/v1/sessions", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["reason"], "malformed_input");
    }

    let response = post_raw(app.router.clone(), "/api/v1/sessions", "{not json").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["reason"], "malformed_input");

    assert_eq!(
        app.verifier.calls.load(std::sync::atomic::Ordering::SeqCst),
        0
    );
}

// ---------------------------------------------------------------------------
// Test: malformed and unknown order targets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn order_input_is_checked() {
    let app = TestApp::new();
    app.create_session("AB12", "Table 4").await;

    let response = app
        .post("/api/v1/orders", json!({"session_code": "AB12", "product_id": 0}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["reason"], "malformed_input");

    let response = app.post("/api/v1/orders", json!({"product_id": 7})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post("/api/v1/orders", json!({"session_code": "ZZ99", "product_id": 7}))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["reason"], "session_not_found");

    assert_eq!(app.store.order_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: reads are idempotent
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_session_is_idempotent() {
    let app = TestApp::new();
    app.create_session("AB12", "Table 4").await;
    app.post("/api/v1/orders", json!({"session_code": "AB12", "product_id": 7}))
        .await;

    let first = body_json(app.get("/api/v1/sessions/AB12").await).await;
    let second = body_json(app.get("/api/v1/sessions/AB12").await).await;
    assert_eq!(first, second);
    assert_eq!(first["data"]["orders"].as_array().unwrap().len(), 1);

    let response = app.get("/api/v1/sessions/ZZ99").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["reason"], "session_not_found");
}

// ---------------------------------------------------------------------------
// Test: listing filters by location and state
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_sessions_filters() {
    let app = TestApp::new();
    app.create_session("A1", "One").await;
    app.create_session("A2", "Two").await;
    app.create_session("A3", "Three").await;
    app.post("/api/v1/sessions/A2/close", json!({})).await;

    let codes = |json: serde_json::Value| -> Vec<String> {
        json["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["code"].as_str().unwrap().to_string())
            .collect()
    };

    let all = body_json(app.get("/api/v1/sessions").await).await;
    assert_eq!(codes(all), vec!["A1", "A2", "A3"]);

    let open = body_json(app.get("/api/v1/sessions?state=open").await).await;
    assert_eq!(codes(open), vec!["A1", "A3"]);

    let closed = body_json(
        app.get(&format!("/api/v1/sessions?location_id={OWN_LOCATION}&state=CLOSED"))
            .await,
    )
    .await;
    assert_eq!(codes(closed), vec!["A2"]);

    let elsewhere = body_json(app.get("/api/v1/sessions?location_id=99").await).await;
    assert!(codes(elsewhere).is_empty());

    let unknown = app.get("/api/v1/sessions?state=pending").await;
    assert_eq!(unknown.status(), StatusCode::OK);
    assert!(codes(body_json(unknown).await).is_empty());

    let limited = body_json(app.get("/api/v1/sessions?limit=2").await).await;
    assert_eq!(codes(limited), vec!["A1", "A2"]);

    let response = app.get("/api/v1/sessions?location_id=abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["reason"], "malformed_input");
}

#[tokio::test]
async fn list_limit_is_clamped_to_configured_maximum() {
    let mut config = common::test_config();
    config.session_list_limit = 2;
    let app = TestApp::with_config(config);
    for (code, name) in [("A1", "One"), ("A2", "Two"), ("A3", "Three")] {
        app.create_session(code, name).await;
    }

    for uri in ["/api/v1/sessions", "/api/v1/sessions?limit=50"] {
        let json = body_json(app.get(uri).await).await;
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
    }
}

// ---------------------------------------------------------------------------
// Test: wrong method on a known path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn wrong_method_is_incorrect_access_method() {
    let app = TestApp::new();

    for (method, uri) in [
        (Method::DELETE, "/api/v1/sessions/AB12"),
        (Method::GET, "/api/v1/orders"),
        (Method::GET, "/api/v1/sessions/AB12/close"),
        (Method::POST, "/health"),
    ] {
        let response = app.request(method, uri).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_json(response).await["reason"], "incorrect_access_method");
    }
}

// ---------------------------------------------------------------------------
// Test: unknown paths carry a reason
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_path_is_route_not_found() {
    let app = TestApp::new();

    for uri in ["/api/v1/nope", "/nope", "/api/v1/sessions/AB12/reopen"] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        let json = body_json(response).await;
        assert_eq!(json["reason"], "route_not_found");
        assert!(json["error"].as_str().unwrap().contains(uri));
    }
}

// ---------------------------------------------------------------------------
// Test: plain HTTP requests to the real-time endpoint
// ---------------------------------------------------------------------------

#[tokio::test]
async fn plain_get_on_realtime_endpoint_is_malformed_input() {
    let app = TestApp::new();
    app.create_session("AB12", "Table 4").await;

    let response = app.get("/api/v1/ws/sessions/AB12").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["reason"], "malformed_input");
    assert_eq!(app.hub.session_count(), 0);
}

#[tokio::test]
async fn plain_get_on_realtime_endpoint_for_unknown_code_is_not_found() {
    let app = TestApp::new();

    let response = app.get("/api/v1/ws/sessions/ZZ99").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["reason"], "session_not_found");
}

// ---------------------------------------------------------------------------
// Test: health endpoint
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_store_and_live_sessions() {
    let app = TestApp::new();
    app.create_session("AB12", "Table 4").await;
    let _rx = app.hub.subscribe("AB12", "viewer").await;

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["db_healthy"], true);
    assert_eq!(json["live_sessions"], 1);
}

// ---------------------------------------------------------------------------
// Test: concurrent orders are published in commit order
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_orders_publish_in_commit_order() {
    let app = TestApp::new();
    app.create_session("AB12", "Table 4").await;
    let mut viewer = app.hub.subscribe("AB12", "viewer").await;

    let mut tasks = Vec::new();
    for product_id in 1..=20 {
        let sessions = app.state.sessions.clone();
        tasks.push(tokio::spawn(async move {
            sessions
                .add_order(tabsync_db::models::order::CreateOrderRequest {
                    session_code: Some("AB12".into()),
                    product_id: Some(product_id),
                })
                .await
                .map(|snapshot| snapshot.orders.len())
        }));
    }
    for task in tasks {
        assert!(task.await.unwrap().is_ok());
    }

    let mut seen = Vec::new();
    while let Ok(snapshot) = viewer.try_recv() {
        seen.push(snapshot.orders.len());
    }
    assert_eq!(seen, (1..=20).collect::<Vec<_>>());
}
