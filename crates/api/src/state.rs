use std::sync::Arc;

use tabsync_db::SessionStore;
use tabsync_events::SessionHub;

use crate::config::ServerConfig;
use crate::engine::SessionService;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Session and order storage (Postgres or in-process).
    pub store: Arc<dyn SessionStore>,
    /// Subscriber sets per session code.
    pub hub: Arc<SessionHub>,
    /// Lifecycle service; all mutations go through it.
    pub sessions: Arc<SessionService>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
