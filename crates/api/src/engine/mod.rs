//! Session lifecycle engine.
//!
//! [`SessionService`] owns every session and order mutation: it commits
//! through the store and then publishes a fresh snapshot to the hub. Work on
//! one session code is serialized by [`KeyedLocks`].

pub mod keyed_lock;
pub mod session_service;

pub use keyed_lock::{KeyedGuard, KeyedLocks};
pub use session_service::SessionService;
