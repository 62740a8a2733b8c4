//! The session state machine.
//!
//! Sessions start `OPEN` and move once to `CLOSED`; orders attach only while
//! `OPEN`. Every committed change is followed by a publish of the snapshot
//! read right after the commit, under the session's lock, so subscribers of
//! one code see publishes in commit order.

use std::sync::Arc;

use tabsync_core::error::CoreError;
use tabsync_core::session::SessionState;
use tabsync_db::models::order::CreateOrderRequest;
use tabsync_db::models::session::{
    CreateSession, CreateSessionRequest, SessionFilter, SessionListParams, SessionSnapshot,
};
use tabsync_db::{OrderAttach, SessionStore, StoreError, NAME_LOCATION_CONSTRAINT};
use tabsync_events::{BroadcastHub, SnapshotReceiver};
use tabsync_pipeline::{Credentials, VerificationPipeline};
use validator::Validate;

use crate::engine::keyed_lock::KeyedLocks;
use crate::error::AppResult;

pub struct SessionService {
    store: Arc<dyn SessionStore>,
    hub: Arc<dyn BroadcastHub>,
    pipeline: VerificationPipeline,
    locks: KeyedLocks,
    list_limit: i64,
}

impl SessionService {
    pub fn new(
        store: Arc<dyn SessionStore>,
        hub: Arc<dyn BroadcastHub>,
        pipeline: VerificationPipeline,
        list_limit: i64,
    ) -> Self {
        Self {
            store,
            hub,
            pipeline,
            locks: KeyedLocks::new(),
            list_limit,
        }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Verify the operator, obtain a code and create an `OPEN` session.
    ///
    /// The body is validated before any upstream call is made.
    pub async fn create_session(&self, input: CreateSessionRequest) -> AppResult<SessionSnapshot> {
        input.validate()?;
        let (Some(name), Some(location_id)) = (input.name, input.location_id) else {
            return Err(CoreError::MalformedInput("name and location_id are required".into()).into());
        };

        let credentials = Credentials {
            session_key: input.session_key,
            user_id: input.user_id,
        };
        let code = self
            .pipeline
            .authorize_and_code(&credentials, location_id)
            .await?;

        let _guard = self.locks.lock(&code).await;

        let created = self
            .store
            .create(&CreateSession {
                name: name.clone(),
                code: code.clone(),
                location_id,
            })
            .await;

        match created {
            Ok(_) => {}
            Err(StoreError::UniqueViolation { constraint })
                if constraint == NAME_LOCATION_CONSTRAINT =>
            {
                tracing::info!(name = %name, location_id, "Duplicate session rejected");
                return Err(CoreError::DuplicateSession { name, location_id }.into());
            }
            Err(e) => return Err(e.into()),
        }

        let snapshot = self.publish_fresh(&code).await?;
        tracing::info!(code = %code, location_id, "Session created");
        Ok(snapshot)
    }

    /// Move a session to `CLOSED`.
    ///
    /// Closing an already closed session returns its snapshot without a
    /// write or a publish.
    pub async fn close_session(&self, code: &str) -> AppResult<SessionSnapshot> {
        let _guard = self.locks.lock(code).await;

        let session = self
            .store
            .get(code)
            .await?
            .ok_or_else(|| CoreError::session_not_found(code))?;

        if session.state == SessionState::Closed {
            tracing::debug!(code = %code, "Session already closed");
            return self.read_snapshot(code).await;
        }

        self.store
            .set_state(code, SessionState::Closed)
            .await?
            .ok_or_else(|| CoreError::session_not_found(code))?;

        let snapshot = self.publish_fresh(code).await?;
        tracing::info!(code = %code, "Session closed");
        Ok(snapshot)
    }

    /// Attach an order to an `OPEN` session.
    pub async fn add_order(&self, input: CreateOrderRequest) -> AppResult<SessionSnapshot> {
        input.validate()?;
        let (Some(code), Some(product_id)) = (input.session_code, input.product_id) else {
            return Err(
                CoreError::MalformedInput("session_code and product_id are required".into()).into(),
            );
        };

        let _guard = self.locks.lock(&code).await;

        match self.store.create_order(&code, product_id).await? {
            OrderAttach::Created(order) => {
                let snapshot = self.publish_fresh(&code).await?;
                tracing::info!(code = %code, order_id = order.id, product_id, "Order added");
                Ok(snapshot)
            }
            OrderAttach::SessionClosed => {
                tracing::info!(code = %code, product_id, "Order rejected, session closed");
                Err(CoreError::SessionClosed { code }.into())
            }
            OrderAttach::SessionNotFound => Err(CoreError::session_not_found(code).into()),
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn get_session(&self, code: &str) -> AppResult<SessionSnapshot> {
        self.read_snapshot(code).await
    }

    /// Whether a session with this code exists.
    pub async fn exists(&self, code: &str) -> AppResult<bool> {
        Ok(self.store.get(code).await?.is_some())
    }

    /// Sessions matching the optional location and state filters, each with
    /// its orders, in storage order.
    ///
    /// An unrecognised state matches nothing; the limit is clamped to the
    /// configured maximum.
    pub async fn list_sessions(&self, params: SessionListParams) -> AppResult<Vec<SessionSnapshot>> {
        let state = match params.state.as_deref() {
            None => None,
            Some(raw) => match raw.parse::<SessionState>() {
                Ok(state) => Some(state),
                Err(_) => {
                    tracing::debug!(state = %raw, "Unknown state filter matches nothing");
                    return Ok(Vec::new());
                }
            },
        };

        let filter = SessionFilter {
            location_id: params.location_id,
            state,
        };
        let limit = params
            .limit
            .unwrap_or(self.list_limit)
            .clamp(0, self.list_limit);

        let sessions = self.store.list(&filter, limit).await?;
        let mut snapshots = Vec::with_capacity(sessions.len());
        for session in sessions {
            let orders = self.store.orders_for(&session.code).await?;
            snapshots.push(SessionSnapshot { session, orders });
        }
        Ok(snapshots)
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// Join `conn_id` to the session's subscriber set and return the current
    /// snapshot together with the delivery queue.
    ///
    /// Runs under the session lock, so the snapshot is exactly the state
    /// preceding the first queued publish.
    pub async fn subscribe(
        &self,
        code: &str,
        conn_id: &str,
    ) -> AppResult<(SessionSnapshot, SnapshotReceiver)> {
        let _guard = self.locks.lock(code).await;
        let snapshot = self.read_snapshot(code).await?;
        let rx = self.hub.subscribe(code, conn_id).await;
        Ok((snapshot, rx))
    }

    pub async fn unsubscribe(&self, code: &str, conn_id: &str) {
        self.hub.leave(code, conn_id).await;
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn read_snapshot(&self, code: &str) -> AppResult<SessionSnapshot> {
        self.store
            .snapshot(code)
            .await?
            .ok_or_else(|| CoreError::session_not_found(code).into())
    }

    /// Read the post-commit snapshot and fan it out. Caller holds the lock.
    async fn publish_fresh(&self, code: &str) -> AppResult<SessionSnapshot> {
        let snapshot = self.read_snapshot(code).await?;
        let delivered = self.hub.publish(code, Arc::new(snapshot.clone())).await;
        tracing::debug!(code = %code, delivered, "Session snapshot broadcast");
        Ok(snapshot)
    }
}
