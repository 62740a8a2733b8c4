//! Session-keyed broadcast hub.
//!
//! Each session code owns an independent subscriber set. A set is created on
//! the first [`join`](BroadcastHub::join) and discarded when the last member
//! leaves, so the map never holds empty sets.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tabsync_db::models::session::SessionSnapshot;
use tokio::sync::mpsc;

/// Identifies one real-time connection (a UUID string in the gateway).
pub type ConnectionId = String;

/// Sender half of a connection's delivery queue.
pub type SnapshotSender = mpsc::UnboundedSender<Arc<SessionSnapshot>>;

/// Receiver half of a connection's delivery queue.
pub type SnapshotReceiver = mpsc::UnboundedReceiver<Arc<SessionSnapshot>>;

/// Create a fresh per-connection delivery queue.
///
/// The queue is unbounded so a publish never waits on a slow socket.
pub fn subscription_channel() -> (SnapshotSender, SnapshotReceiver) {
    mpsc::unbounded_channel()
}

/// Publish/subscribe seam between the lifecycle service and the gateway.
#[async_trait]
pub trait BroadcastHub: Send + Sync {
    /// Add `conn_id` to the subscriber set of `session_code`.
    ///
    /// Joining again with the same connection id replaces its sender.
    async fn join(&self, session_code: &str, conn_id: &str, sender: SnapshotSender);

    /// Remove `conn_id` from the subscriber set of `session_code`.
    async fn leave(&self, session_code: &str, conn_id: &str);

    /// Deliver `snapshot` to every current member of `session_code`.
    ///
    /// Returns the number of connections the snapshot was queued for. A
    /// member whose queue is closed is skipped and pruned; it never fails the
    /// publish.
    async fn publish(&self, session_code: &str, snapshot: Arc<SessionSnapshot>) -> usize;

    /// Join with a freshly created queue and return its receiver.
    async fn subscribe(&self, session_code: &str, conn_id: &str) -> SnapshotReceiver {
        let (tx, rx) = subscription_channel();
        self.join(session_code, conn_id, tx).await;
        rx
    }
}

/// In-process [`BroadcastHub`].
///
/// Subscriber sets live in a sharded [`DashMap`]; join, leave and publish on
/// one code all take that code's entry guard, which linearizes them, while
/// codes on other shards proceed in parallel.
#[derive(Default)]
pub struct SessionHub {
    rooms: DashMap<String, HashMap<ConnectionId, SnapshotSender>>,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of connections currently subscribed to `session_code`.
    pub fn subscriber_count(&self, session_code: &str) -> usize {
        self.rooms
            .get(session_code)
            .map(|room| room.len())
            .unwrap_or(0)
    }

    /// Number of session codes with at least one subscriber.
    pub fn session_count(&self) -> usize {
        self.rooms.len()
    }

    /// Drop every subscriber set.
    ///
    /// Dropping the senders closes each connection's queue, which makes the
    /// gateway send a Close frame and end the connection. Used during
    /// graceful shutdown.
    pub fn close_all(&self) {
        let count: usize = self.rooms.iter().map(|room| room.len()).sum();
        self.rooms.clear();
        tracing::info!(count, "Closed all session subscriptions");
    }
}

#[async_trait]
impl BroadcastHub for SessionHub {
    async fn join(&self, session_code: &str, conn_id: &str, sender: SnapshotSender) {
        let mut room = self.rooms.entry(session_code.to_string()).or_default();
        room.insert(conn_id.to_string(), sender);
        tracing::debug!(
            code = %session_code,
            conn_id = %conn_id,
            subscribers = room.len(),
            "Subscriber joined",
        );
    }

    async fn leave(&self, session_code: &str, conn_id: &str) {
        let discarded = self.rooms.remove_if_mut(session_code, |_, room| {
            room.remove(conn_id);
            room.is_empty()
        });
        tracing::debug!(
            code = %session_code,
            conn_id = %conn_id,
            discarded = discarded.is_some(),
            "Subscriber left",
        );
    }

    async fn publish(&self, session_code: &str, snapshot: Arc<SessionSnapshot>) -> usize {
        let (delivered, emptied) = {
            let Some(mut room) = self.rooms.get_mut(session_code) else {
                tracing::trace!(code = %session_code, "Publish with no subscribers");
                return 0;
            };

            let mut delivered = 0;
            room.retain(|conn_id, sender| match sender.send(Arc::clone(&snapshot)) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => {
                    tracing::debug!(
                        code = %session_code,
                        conn_id = %conn_id,
                        "Pruned subscriber with closed queue",
                    );
                    false
                }
            });
            (delivered, room.is_empty())
        };

        if emptied {
            self.rooms.remove_if(session_code, |_, room| room.is_empty());
        }

        tracing::debug!(code = %session_code, delivered, "Snapshot published");
        delivered
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
