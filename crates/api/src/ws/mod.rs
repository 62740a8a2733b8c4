//! WebSocket gateway streaming live session snapshots.
//!
//! Provides the HTTP upgrade handler for `/ws/sessions/{code}` and the
//! per-connection heartbeat.

mod handler;
mod heartbeat;

pub use handler::session_ws_handler;
pub use heartbeat::HEARTBEAT_INTERVAL;
