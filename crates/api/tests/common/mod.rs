#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tabsync_core::types::DbId;
use tabsync_db::MemoryStore;
use tabsync_events::SessionHub;
use tabsync_pipeline::{
    CodeIssuer, IdentityVerifier, LocationDirectory, UpstreamConfig, UpstreamError,
    VerificationPipeline,
};
use tower::ServiceExt;

use tabsync_api::config::ServerConfig;
use tabsync_api::engine::SessionService;
use tabsync_api::router::build_app_router;
use tabsync_api::state::AppState;

/// Session key accepted by the fake verification service.
pub const GOOD_KEY: &str = "good-key";
/// User the fake verification service accepts with [`GOOD_KEY`].
pub const OPERATOR: DbId = 42;
/// Location owned by [`OPERATOR`].
pub const OWN_LOCATION: DbId = 3;
/// Location owned by someone else.
pub const FOREIGN_LOCATION: DbId = 4;

// ---------------------------------------------------------------------------
// Fake upstream services
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeVerifier {
    pub calls: AtomicUsize,
}

#[async_trait]
impl IdentityVerifier for FakeVerifier {
    async fn verify(&self, session_key: &str, user_id: DbId) -> Result<bool, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(session_key == GOOD_KEY && user_id == OPERATOR)
    }
}

pub struct FakeLocations;

#[async_trait]
impl LocationDirectory for FakeLocations {
    async fn owner_of(&self, location_id: DbId) -> Result<Option<DbId>, UpstreamError> {
        Ok(match location_id {
            OWN_LOCATION => Some(OPERATOR),
            FOREIGN_LOCATION => Some(7),
            _ => None,
        })
    }
}

/// Hands out queued codes first, then `C1`, `C2`, ...
#[derive(Default)]
pub struct FakeCodes {
    queued: Mutex<VecDeque<String>>,
    issued: AtomicUsize,
    down: AtomicBool,
}

impl FakeCodes {
    pub fn queue(&self, code: &str) {
        self.queued.lock().unwrap().push_back(code.to_string());
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

#[async_trait]
impl CodeIssuer for FakeCodes {
    async fn issue_code(&self) -> Result<Option<String>, UpstreamError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(UpstreamError::Unreachable("connection refused".into()));
        }
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let queued = self.queued.lock().unwrap().pop_front();
        Ok(Some(queued.unwrap_or_else(|| format!("C{n}"))))
    }
}

// ---------------------------------------------------------------------------
// Test application
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        session_list_limit: 100,
        upstream: UpstreamConfig {
            verification_url: "http://127.0.0.1:1".to_string(),
            locations_url: "http://127.0.0.1:1".to_string(),
            codes_url: "http://127.0.0.1:1".to_string(),
            timeout: std::time::Duration::from_secs(5),
        },
    }
}

/// The full router over a `MemoryStore` and fake upstreams, with handles to
/// the pieces tests inspect.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub hub: Arc<SessionHub>,
    pub verifier: Arc<FakeVerifier>,
    pub codes: Arc<FakeCodes>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: ServerConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let hub = Arc::new(SessionHub::new());
        let verifier = Arc::new(FakeVerifier::default());
        let codes = Arc::new(FakeCodes::default());

        let pipeline =
            VerificationPipeline::new(verifier.clone(), Arc::new(FakeLocations), codes.clone());
        let sessions = Arc::new(SessionService::new(
            store.clone(),
            hub.clone(),
            pipeline,
            config.session_list_limit,
        ));

        let state = AppState {
            store: store.clone(),
            hub: hub.clone(),
            sessions,
            config: Arc::new(config.clone()),
        };
        let router = build_app_router(state.clone(), &config);

        Self {
            router,
            state,
            store,
            hub,
            verifier,
            codes,
        }
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        send(self.router.clone(), Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> Response<Body> {
        send(self.router.clone(), Method::POST, uri, Some(body)).await
    }

    pub async fn request(&self, method: Method, uri: &str) -> Response<Body> {
        send(self.router.clone(), method, uri, None).await
    }

    /// Create a session for the operator at their own location with `code`.
    pub async fn create_session(&self, code: &str, name: &str) -> Value {
        self.codes.queue(code);
        let response = self.post("/api/v1/sessions", create_body(name, OWN_LOCATION)).await;
        assert_eq!(response.status(), 200, "session creation failed");
        body_json(response).await["data"].clone()
    }
}

/// A valid create-session body.
pub fn create_body(name: &str, location_id: DbId) -> Value {
    json!({
        "session_key": GOOD_KEY,
        "user_id": OPERATOR,
        "location_id": location_id,
        "name": name,
    })
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

/// Send a raw (possibly invalid) JSON body.
pub async fn post_raw(app: Router, uri: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
