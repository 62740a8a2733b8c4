use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use tabsync_db::models::order::CreateOrderRequest;

use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/orders
///
/// Attaches an order to an open session and returns the updated snapshot.
pub async fn create_order(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateOrderRequest>,
) -> AppResult<impl IntoResponse> {
    let snapshot = state.sessions.add_order(input).await?;

    Ok(Json(DataResponse { data: snapshot }))
}
