//! Real-time fan-out of session snapshots.
//!
//! - [`BroadcastHub`]: the injectable publish/subscribe seam, keyed by
//!   session code.
//! - [`SessionHub`]: in-process implementation with one subscriber set per
//!   session code, sharded so that different codes never share a guard.

pub mod hub;

pub use hub::{
    subscription_channel, BroadcastHub, ConnectionId, SessionHub, SnapshotReceiver,
    SnapshotSender,
};
