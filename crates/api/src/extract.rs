//! Request extractors whose rejections are reported as `malformed_input`.
//!
//! axum's stock `Json`, `Query`, `Path` and `WebSocketUpgrade` reject with
//! plain-text bodies. These wrappers run the same extraction but reject with
//! [`AppError`], so every failure response carries the `{"reason", "error"}`
//! shape.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::request::Parts;

use crate::error::AppError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Query string.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);

/// Path parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct PathParams<T>(pub T);

/// WebSocket handshake; a plain HTTP request is `malformed_input`.
pub struct WsUpgrade(pub WebSocketUpgrade);

impl<S> FromRequestParts<S> for WsUpgrade
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(WebSocketUpgrade::from_request_parts(parts, state).await?))
    }
}
