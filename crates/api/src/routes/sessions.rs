use axum::routing::{get, post};
use axum::Router;

use crate::handlers::sessions;
use crate::state::AppState;

/// Session routes mounted at `/sessions`.
///
/// ```text
/// GET    /                  -> list_sessions
/// POST   /                  -> create_session
/// GET    /{code}            -> get_session
/// POST   /{code}/close      -> close_session
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(sessions::list_sessions).post(sessions::create_session),
        )
        .route("/{code}", get(sessions::get_session))
        .route("/{code}/close", post(sessions::close_session))
}
