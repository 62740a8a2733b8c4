use axum::routing::post;
use axum::Router;

use crate::handlers::orders;
use crate::state::AppState;

/// Order routes mounted at `/orders`.
///
/// ```text
/// POST   /                  -> create_order
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(orders::create_order))
}
