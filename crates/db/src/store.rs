//! The storage seam used by the lifecycle service and the gateway.

use async_trait::async_trait;
use tabsync_core::session::SessionState;
use tabsync_core::types::DbId;

use crate::models::order::Order;
use crate::models::session::{CreateSession, Session, SessionFilter, SessionSnapshot};

/// Unique constraint guarding `(name, location_id)` on `sessions`.
pub const NAME_LOCATION_CONSTRAINT: &str = "uq_sessions_name_location";

/// Errors surfaced by a [`SessionStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An insert violated a unique constraint (`(name, location_id)` or the
    /// session code primary key).
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// Any other database failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Classify a sqlx error, pulling PostgreSQL unique violations (SQLSTATE
    /// `23505`) out into [`StoreError::UniqueViolation`].
    pub fn classify(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                tracing::debug!(constraint = %constraint, "Unique constraint violated");
                return StoreError::UniqueViolation { constraint };
            }
        }
        StoreError::Database(err)
    }
}

/// Outcome of an order insert, decided atomically with the OPEN check.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderAttach {
    Created(Order),
    SessionClosed,
    SessionNotFound,
}

/// Durable keyed storage for sessions and their orders.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch a session by its code.
    async fn get(&self, code: &str) -> Result<Option<Session>, StoreError>;

    /// Insert a session in the `OPEN` state.
    ///
    /// Uniqueness of `(name, location_id)` and of the code is enforced by the
    /// insert itself and reported as [`StoreError::UniqueViolation`].
    async fn create(&self, input: &CreateSession) -> Result<Session, StoreError>;

    /// Set the state of a session, returning the updated row, or `None` if no
    /// session has this code.
    async fn set_state(
        &self,
        code: &str,
        state: SessionState,
    ) -> Result<Option<Session>, StoreError>;

    /// Attach an order, re-checking that the session is `OPEN` within the same
    /// atomic step as the insert.
    async fn create_order(
        &self,
        session_code: &str,
        product_id: DbId,
    ) -> Result<OrderAttach, StoreError>;

    /// All orders of a session in insertion order.
    async fn orders_for(&self, session_code: &str) -> Result<Vec<Order>, StoreError>;

    /// Sessions matching `filter`, in natural storage order, at most `limit`.
    async fn list(&self, filter: &SessionFilter, limit: i64) -> Result<Vec<Session>, StoreError>;

    /// Delete a session and, by cascade, its orders. Returns `true` if a row
    /// was removed.
    async fn delete(&self, code: &str) -> Result<bool, StoreError>;

    /// Confirm the backing storage is reachable.
    async fn health_check(&self) -> Result<(), StoreError>;

    /// Read a fresh snapshot (session + orders).
    async fn snapshot(&self, code: &str) -> Result<Option<SessionSnapshot>, StoreError> {
        let Some(session) = self.get(code).await? else {
            return Ok(None);
        };
        let orders = self.orders_for(code).await?;
        Ok(Some(SessionSnapshot { session, orders }))
    }
}
