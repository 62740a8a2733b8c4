use crate::types::DbId;

/// Domain failure taxonomy shared by the pipeline, the lifecycle service and
/// the HTTP/WebSocket boundary.
///
/// Each variant maps to one stable, machine-readable reason code (see
/// [`CoreError::reason`]); the boundary layer picks the status code.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Verification service unavailable: {0}")]
    VerificationUnavailable(String),

    #[error("Locations service unavailable: {0}")]
    LocationServiceUnavailable(String),

    #[error("Code service unavailable: {0}")]
    CodeServiceUnavailable(String),

    #[error("Session not found: {code}")]
    SessionNotFound { code: String },

    #[error("Session {name:?} already exists for location {location_id}")]
    DuplicateSession { name: String, location_id: DbId },

    #[error("Session {code} is closed")]
    SessionClosed { code: String },

    #[error("Incorrect access method: {method}")]
    IncorrectAccessMethod { method: String },

    #[error("No route for {path}")]
    RouteNotFound { path: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Stable reason code carried in every failure response: the variant
    /// name in snake_case.
    pub fn reason(&self) -> &'static str {
        match self {
            CoreError::MalformedInput(_) => "malformed_input",
            CoreError::InvalidCredentials(_) => "invalid_credentials",
            CoreError::VerificationUnavailable(_) => "verification_unavailable",
            CoreError::LocationServiceUnavailable(_) => "location_service_unavailable",
            CoreError::CodeServiceUnavailable(_) => "code_service_unavailable",
            CoreError::SessionNotFound { .. } => "session_not_found",
            CoreError::DuplicateSession { .. } => "duplicate_session",
            CoreError::SessionClosed { .. } => "session_closed",
            CoreError::IncorrectAccessMethod { .. } => "incorrect_access_method",
            CoreError::RouteNotFound { .. } => "route_not_found",
            CoreError::Internal(_) => "internal_error",
        }
    }

    pub fn session_not_found(code: impl Into<String>) -> Self {
        CoreError::SessionNotFound { code: code.into() }
    }
}
