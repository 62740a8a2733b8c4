//! The sequential verification chain run before a session is created.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tabsync_core::error::CoreError;
use tabsync_core::types::DbId;

use crate::upstream::{CodeIssuer, IdentityVerifier, LocationDirectory, UpstreamError};

/// Default budget for a single upstream call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Operator credentials supplied with a session-creation request.
///
/// Both fields are optional at the wire level; a missing or empty value is
/// rejected as invalid credentials without any network call.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub session_key: Option<String>,
    pub user_id: Option<DbId>,
}

impl Credentials {
    /// The `(session_key, user_id)` pair if both are present and non-empty.
    fn present(&self) -> Option<(&str, DbId)> {
        let session_key = self.session_key.as_deref().filter(|k| !k.is_empty())?;
        let user_id = self.user_id.filter(|id| *id != 0)?;
        Some((session_key, user_id))
    }
}

/// Identity check → ownership check → code issuance.
///
/// Each step is bounded by `call_timeout` and short-circuits the chain on
/// failure; later steps are never attempted. No step is retried.
pub struct VerificationPipeline {
    verifier: Arc<dyn IdentityVerifier>,
    locations: Arc<dyn LocationDirectory>,
    codes: Arc<dyn CodeIssuer>,
    call_timeout: Duration,
}

impl VerificationPipeline {
    pub fn new(
        verifier: Arc<dyn IdentityVerifier>,
        locations: Arc<dyn LocationDirectory>,
        codes: Arc<dyn CodeIssuer>,
    ) -> Self {
        Self {
            verifier,
            locations,
            codes,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Override the per-call timeout.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Authorize a session creation for `location_id` and obtain its code.
    pub async fn authorize_and_code(
        &self,
        credentials: &Credentials,
        location_id: DbId,
    ) -> Result<String, CoreError> {
        let user_id = self.verify_identity(credentials).await?;
        self.verify_ownership(user_id, location_id).await?;
        self.issue_code().await
    }

    /// Step 1: returns the verified user id.
    async fn verify_identity(&self, credentials: &Credentials) -> Result<DbId, CoreError> {
        let Some((session_key, user_id)) = credentials.present() else {
            tracing::debug!("Rejected session creation with missing credentials");
            return Err(CoreError::InvalidCredentials(
                "session_key and user_id are required".into(),
            ));
        };

        match self.bounded(self.verifier.verify(session_key, user_id)).await {
            Ok(true) => {
                tracing::debug!(user_id, "Identity verified");
                Ok(user_id)
            }
            Ok(false) => {
                tracing::debug!(user_id, "Identity rejected by verification service");
                Err(CoreError::InvalidCredentials(
                    "Verification service rejected the credentials".into(),
                ))
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Verification service unavailable");
                Err(CoreError::VerificationUnavailable(e.to_string()))
            }
        }
    }

    /// Step 2: the location must be owned by the verified user.
    async fn verify_ownership(&self, user_id: DbId, location_id: DbId) -> Result<(), CoreError> {
        match self.bounded(self.locations.owner_of(location_id)).await {
            Ok(Some(owner)) if owner == user_id => {
                tracing::debug!(user_id, location_id, "Location ownership confirmed");
                Ok(())
            }
            Ok(owner) => {
                tracing::debug!(
                    user_id,
                    location_id,
                    owner = ?owner,
                    "Location not owned by user",
                );
                Err(CoreError::InvalidCredentials(format!(
                    "User {user_id} does not own location {location_id}"
                )))
            }
            Err(e) => {
                tracing::warn!(location_id, error = %e, "Locations service unavailable");
                Err(CoreError::LocationServiceUnavailable(e.to_string()))
            }
        }
    }

    /// Step 3: a fresh, non-empty code.
    async fn issue_code(&self) -> Result<String, CoreError> {
        match self.bounded(self.codes.issue_code()).await {
            Ok(Some(code)) if !code.is_empty() => {
                tracing::debug!(code = %code, "Session code issued");
                Ok(code)
            }
            Ok(_) => {
                tracing::warn!("Code service returned no usable code");
                Err(CoreError::CodeServiceUnavailable(
                    "Code service returned no usable code".into(),
                ))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Code service unavailable");
                Err(CoreError::CodeServiceUnavailable(e.to_string()))
            }
        }
    }

    /// Run one upstream call under the per-call timeout.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, UpstreamError>>,
    ) -> Result<T, UpstreamError> {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::Timeout {
                elapsed_ms: self.call_timeout.as_millis() as u64,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
