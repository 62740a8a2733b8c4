//! Seams to the three upstream services.
//!
//! Each trait reports a *logical* outcome in its `Ok` value (rejected
//! credentials, unknown owner, no code) and reserves `Err` for the service
//! not being usable at all. The pipeline maps the two differently.

use async_trait::async_trait;
use tabsync_core::types::DbId;

/// Transport-level failure talking to an upstream service.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The HTTP request itself failed (connect, DNS, TLS, client timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The call did not complete within the pipeline's per-step budget.
    #[error("Upstream call timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// The service answered, but not with a decodable JSON document.
    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    /// Failure raised by a non-HTTP implementation.
    #[error("Upstream unreachable: {0}")]
    Unreachable(String),
}

/// Verifies that a `session_key` belongs to `user_id`.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// `Ok(true)` only when the service positively confirms the pair.
    async fn verify(&self, session_key: &str, user_id: DbId) -> Result<bool, UpstreamError>;
}

/// Resolves the owning user of a location.
#[async_trait]
pub trait LocationDirectory: Send + Sync {
    /// `Ok(None)` when the service does not report an owner (unknown
    /// location, negative answer, missing field).
    async fn owner_of(&self, location_id: DbId) -> Result<Option<DbId>, UpstreamError>;
}

/// Issues fresh, globally unique session codes.
#[async_trait]
pub trait CodeIssuer: Send + Sync {
    /// `Ok(None)` when the service answered without a usable code.
    async fn issue_code(&self) -> Result<Option<String>, UpstreamError>;
}
