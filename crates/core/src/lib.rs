//! Shared domain vocabulary for the tabsync workspace.
//!
//! Every other crate depends on this one for the primitive type aliases,
//! the session state enum and the [`error::CoreError`] failure taxonomy.

pub mod error;
pub mod session;
pub mod types;
