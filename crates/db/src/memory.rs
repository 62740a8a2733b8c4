//! In-process [`SessionStore`] used by tests and by local runs without a
//! database.
//!
//! Mirrors the PostgreSQL adapter's semantics: the same unique constraints,
//! insertion-ordered listing, cascade delete and an order insert that is
//! atomic with the OPEN check.

use async_trait::async_trait;
use tabsync_core::session::SessionState;
use tabsync_core::types::DbId;
use tokio::sync::RwLock;

use crate::models::order::Order;
use crate::models::session::{CreateSession, Session, SessionFilter};
use crate::store::{OrderAttach, SessionStore, StoreError, NAME_LOCATION_CONSTRAINT};

const PK_CODE: &str = "sessions_pkey";

#[derive(Default)]
struct Tables {
    /// Insertion order doubles as natural storage order.
    sessions: Vec<Session>,
    orders: Vec<Order>,
    next_order_id: DbId,
}

/// Store kept entirely in memory behind a single `RwLock`.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub async fn session_count(&self) -> usize {
        self.tables.read().await.sessions.len()
    }

    /// Number of stored orders across all sessions.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, code: &str) -> Result<Option<Session>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.sessions.iter().find(|s| s.code == code).cloned())
    }

    async fn create(&self, input: &CreateSession) -> Result<Session, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.sessions.iter().any(|s| s.code == input.code) {
            return Err(StoreError::UniqueViolation {
                constraint: PK_CODE.to_string(),
            });
        }
        if tables
            .sessions
            .iter()
            .any(|s| s.name == input.name && s.location_id == input.location_id)
        {
            return Err(StoreError::UniqueViolation {
                constraint: NAME_LOCATION_CONSTRAINT.to_string(),
            });
        }

        let session = Session {
            code: input.code.clone(),
            name: input.name.clone(),
            location_id: input.location_id,
            state: SessionState::Open,
            timestamp: chrono::Utc::now(),
        };
        tables.sessions.push(session.clone());
        Ok(session)
    }

    async fn set_state(
        &self,
        code: &str,
        state: SessionState,
    ) -> Result<Option<Session>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .sessions
            .iter_mut()
            .find(|s| s.code == code)
            .map(|session| {
                session.state = state;
                session.clone()
            }))
    }

    async fn create_order(
        &self,
        session_code: &str,
        product_id: DbId,
    ) -> Result<OrderAttach, StoreError> {
        let mut tables = self.tables.write().await;

        let Some(session) = tables.sessions.iter().find(|s| s.code == session_code) else {
            return Ok(OrderAttach::SessionNotFound);
        };
        if !session.state.accepts_orders() {
            return Ok(OrderAttach::SessionClosed);
        }

        tables.next_order_id += 1;
        let order = Order {
            id: tables.next_order_id,
            session_code: session_code.to_string(),
            product_id,
            timestamp: chrono::Utc::now(),
        };
        tables.orders.push(order.clone());
        Ok(OrderAttach::Created(order))
    }

    async fn orders_for(&self, session_code: &str) -> Result<Vec<Order>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .iter()
            .filter(|o| o.session_code == session_code)
            .cloned()
            .collect())
    }

    async fn list(&self, filter: &SessionFilter, limit: i64) -> Result<Vec<Session>, StoreError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        let tables = self.tables.read().await;
        Ok(tables
            .sessions
            .iter()
            .filter(|s| filter.matches(s))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn delete(&self, code: &str) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|s| s.code != code);
        let removed = tables.sessions.len() != before;
        if removed {
            tables.orders.retain(|o| o.session_code != code);
        }
        Ok(removed)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
