//! Shared response envelope for API handlers.
//!
//! Every successful response uses a `{ "data": ... }` envelope; failures use
//! `{ "reason", "error" }` (see [`AppError`](crate::error::AppError)).

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: snapshot }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
