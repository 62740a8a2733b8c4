pub mod health;
pub mod orders;
pub mod sessions;

use axum::extract::OriginalUri;
use axum::http::Method;
use axum::routing::get;
use axum::Router;
use tabsync_core::error::CoreError;

use crate::error::AppError;
use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /sessions                        list (GET), create (POST)
/// /sessions/{code}                 get
/// /sessions/{code}/close           close (POST)
///
/// /orders                          add order (POST)
///
/// /ws/sessions/{code}              WebSocket, live snapshots of one session
/// ```
///
/// A known path with an unsupported method answers 405
/// `incorrect_access_method`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/sessions", sessions::router())
        .nest("/orders", orders::router())
        .route("/ws/sessions/{code}", get(ws::session_ws_handler))
        .method_not_allowed_fallback(method_not_allowed)
}

pub async fn method_not_allowed(method: Method) -> AppError {
    AppError::Core(CoreError::IncorrectAccessMethod {
        method: method.to_string(),
    })
}

pub async fn route_not_found(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::Core(CoreError::RouteNotFound {
        path: uri.path().to_string(),
    })
}
