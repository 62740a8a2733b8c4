use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tabsync_core::error::CoreError;
use tabsync_db::StoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain failures and [`StoreError`] for storage
/// failures that have no domain meaning. Implements [`IntoResponse`] to
/// produce `{"reason", "error"}` JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level failure from `tabsync_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A storage failure not mapped to a domain failure by the caller.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// The domain failure this error is reported as.
    ///
    /// Storage failures surface as [`CoreError::Internal`].
    pub fn into_core(self) -> CoreError {
        match self {
            AppError::Core(core) => core,
            AppError::Store(err) => CoreError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let core = self.into_core();

        let status = match &core {
            CoreError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            CoreError::InvalidCredentials(_) => StatusCode::FORBIDDEN,
            CoreError::VerificationUnavailable(_)
            | CoreError::LocationServiceUnavailable(_)
            | CoreError::CodeServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CoreError::SessionNotFound { .. } => StatusCode::NOT_FOUND,
            CoreError::DuplicateSession { .. } | CoreError::SessionClosed { .. } => {
                StatusCode::CONFLICT
            }
            CoreError::IncorrectAccessMethod { .. } => StatusCode::METHOD_NOT_ALLOWED,
            CoreError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            CoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &core {
            CoreError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "reason": core.reason(),
            "error": message,
        });

        (status, axum::Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Extractor rejections
// ---------------------------------------------------------------------------

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Core(CoreError::MalformedInput(rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Core(CoreError::MalformedInput(rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Core(CoreError::MalformedInput(rejection.body_text()))
    }
}

impl From<WebSocketUpgradeRejection> for AppError {
    fn from(rejection: WebSocketUpgradeRejection) -> Self {
        AppError::Core(CoreError::MalformedInput(rejection.body_text()))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Core(CoreError::MalformedInput(errors.to_string()))
    }
}
