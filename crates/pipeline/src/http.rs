//! reqwest clients for the verification, locations and codes services.
//!
//! All three services answer with the same envelope:
//!
//! ```text
//! { "success": true, "response": { ... } }
//! ```
//!
//! Any answer other than `"success": true` is a logical rejection. A body
//! that is not JSON at all is reported as [`UpstreamError::MalformedResponse`].

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tabsync_core::types::DbId;

use crate::pipeline::VerificationPipeline;
use crate::upstream::{CodeIssuer, IdentityVerifier, LocationDirectory, UpstreamError};

/// Base URLs and timeout for the upstream services.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub verification_url: String,
    pub locations_url: String,
    pub codes_url: String,
    /// Budget for a single upstream call.
    pub timeout: Duration,
}

impl UpstreamConfig {
    /// Load upstream configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                 |
    /// |----------------------------|-------------------------|
    /// | `VERIFICATION_SERVICE_URL` | `http://localhost:8001` |
    /// | `LOCATIONS_SERVICE_URL`    | `http://localhost:8002` |
    /// | `CODES_SERVICE_URL`        | `http://localhost:8003` |
    /// | `UPSTREAM_TIMEOUT_SECS`    | `5`                     |
    pub fn from_env() -> Self {
        let url = |var: &str, default: &str| {
            std::env::var(var)
                .unwrap_or_else(|_| default.into())
                .trim_end_matches('/')
                .to_string()
        };

        let timeout_secs: u64 = std::env::var("UPSTREAM_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("UPSTREAM_TIMEOUT_SECS must be a valid u64");

        Self {
            verification_url: url("VERIFICATION_SERVICE_URL", "http://localhost:8001"),
            locations_url: url("LOCATIONS_SERVICE_URL", "http://localhost:8002"),
            codes_url: url("CODES_SERVICE_URL", "http://localhost:8003"),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Build a shared HTTP client carrying the configured timeout.
    pub fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder().timeout(self.timeout).build()
    }

    /// Assemble a [`VerificationPipeline`] over the HTTP clients.
    pub fn build_pipeline(&self) -> Result<VerificationPipeline, reqwest::Error> {
        let client = self.build_client()?;
        Ok(VerificationPipeline::new(
            Arc::new(HttpIdentityVerifier::new(
                client.clone(),
                self.verification_url.clone(),
            )),
            Arc::new(HttpLocationDirectory::new(
                client.clone(),
                self.locations_url.clone(),
            )),
            Arc::new(HttpCodeIssuer::new(client, self.codes_url.clone())),
        )
        .with_call_timeout(self.timeout))
    }
}

// ---------------------------------------------------------------------------
// Envelope helpers
// ---------------------------------------------------------------------------

/// Read the body as JSON regardless of status code; the envelope carries the
/// outcome.
async fn read_envelope(response: reqwest::Response) -> Result<Value, UpstreamError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| {
        UpstreamError::MalformedResponse(format!("HTTP {status}: {e}"))
    })
}

fn succeeded(envelope: &Value) -> bool {
    envelope.get("success") == Some(&Value::Bool(true))
}

/// The `response.<field>` value of a successful envelope.
fn response_field<'a>(envelope: &'a Value, field: &str) -> Option<&'a Value> {
    if !succeeded(envelope) {
        return None;
    }
    envelope.get("response")?.get(field)
}

// ---------------------------------------------------------------------------
// Verification service
// ---------------------------------------------------------------------------

/// `POST {base}/verification/verify/` with `{session_key, user_id}`.
pub struct HttpIdentityVerifier {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityVerifier {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait::async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    async fn verify(&self, session_key: &str, user_id: DbId) -> Result<bool, UpstreamError> {
        let response = self
            .client
            .post(format!("{}/verification/verify/", self.base_url))
            .json(&json!({ "session_key": session_key, "user_id": user_id }))
            .send()
            .await?;

        Ok(succeeded(&read_envelope(response).await?))
    }
}

// ---------------------------------------------------------------------------
// Locations service
// ---------------------------------------------------------------------------

/// `GET {base}/locations/get/{location_id}/`, owner in `response.user_id`.
pub struct HttpLocationDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLocationDirectory {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait::async_trait]
impl LocationDirectory for HttpLocationDirectory {
    async fn owner_of(&self, location_id: DbId) -> Result<Option<DbId>, UpstreamError> {
        let response = self
            .client
            .get(format!("{}/locations/get/{}/", self.base_url, location_id))
            .send()
            .await?;

        let envelope = read_envelope(response).await?;
        Ok(response_field(&envelope, "user_id").and_then(Value::as_i64))
    }
}

// ---------------------------------------------------------------------------
// Codes service
// ---------------------------------------------------------------------------

/// `GET {base}/codes/new/`, code in `response.value`.
pub struct HttpCodeIssuer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCodeIssuer {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait::async_trait]
impl CodeIssuer for HttpCodeIssuer {
    async fn issue_code(&self) -> Result<Option<String>, UpstreamError> {
        let response = self
            .client
            .get(format!("{}/codes/new/", self.base_url))
            .send()
            .await?;

        let envelope = read_envelope(response).await?;
        Ok(response_field(&envelope, "value")
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
