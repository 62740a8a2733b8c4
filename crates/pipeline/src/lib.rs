//! Session-creation verification pipeline.
//!
//! Authorizing a new session takes three dependent upstream calls:
//!
//! 1. identity verification of `(session_key, user_id)`;
//! 2. location ownership lookup for the requested `location_id`;
//! 3. issuance of a fresh unique session code.
//!
//! [`VerificationPipeline`] runs them strictly in sequence and stops at the
//! first failure. The upstream services are reached through the traits in
//! [`upstream`]; [`http`] provides the reqwest implementations.

pub mod http;
pub mod pipeline;
pub mod upstream;

pub use http::{HttpCodeIssuer, HttpIdentityVerifier, HttpLocationDirectory, UpstreamConfig};
pub use pipeline::{Credentials, VerificationPipeline};
pub use upstream::{CodeIssuer, IdentityVerifier, LocationDirectory, UpstreamError};
