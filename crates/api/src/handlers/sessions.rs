//! Handlers for session creation, lookup, closing and listing.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use tabsync_db::models::session::{CreateSessionRequest, SessionListParams};

use crate::error::AppResult;
use crate::extract::{JsonBody, PathParams, QueryParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/sessions
///
/// Runs the verification pipeline, then creates an `OPEN` session under the
/// issued code.
pub async fn create_session(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateSessionRequest>,
) -> AppResult<impl IntoResponse> {
    let snapshot = state.sessions.create_session(input).await?;

    Ok(Json(DataResponse { data: snapshot }))
}

/// GET /api/v1/sessions/{code}
pub async fn get_session(
    State(state): State<AppState>,
    PathParams(code): PathParams<String>,
) -> AppResult<impl IntoResponse> {
    let snapshot = state.sessions.get_session(&code).await?;

    Ok(Json(DataResponse { data: snapshot }))
}

/// POST /api/v1/sessions/{code}/close
pub async fn close_session(
    State(state): State<AppState>,
    PathParams(code): PathParams<String>,
) -> AppResult<impl IntoResponse> {
    let snapshot = state.sessions.close_session(&code).await?;

    Ok(Json(DataResponse { data: snapshot }))
}

/// GET /api/v1/sessions?location_id=&state=&limit=
pub async fn list_sessions(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<SessionListParams>,
) -> AppResult<impl IntoResponse> {
    let snapshots = state.sessions.list_sessions(params).await?;

    Ok(Json(DataResponse { data: snapshots }))
}
