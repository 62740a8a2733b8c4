//! PostgreSQL-backed [`SessionStore`].

use async_trait::async_trait;
use tabsync_core::session::SessionState;
use tabsync_core::types::DbId;

use crate::models::order::Order;
use crate::models::session::{CreateSession, Session, SessionFilter};
use crate::repositories::{OrderRepo, SessionRepo};
use crate::store::{OrderAttach, SessionStore, StoreError};
use crate::DbPool;

/// [`SessionStore`] over a sqlx connection pool, delegating to the
/// repositories.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: DbPool,
}

impl PgSessionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn get(&self, code: &str) -> Result<Option<Session>, StoreError> {
        Ok(SessionRepo::find_by_code(&self.pool, code).await?)
    }

    async fn create(&self, input: &CreateSession) -> Result<Session, StoreError> {
        SessionRepo::create(&self.pool, input)
            .await
            .map_err(StoreError::classify)
    }

    async fn set_state(
        &self,
        code: &str,
        state: SessionState,
    ) -> Result<Option<Session>, StoreError> {
        Ok(SessionRepo::set_state(&self.pool, code, state).await?)
    }

    async fn create_order(
        &self,
        session_code: &str,
        product_id: DbId,
    ) -> Result<OrderAttach, StoreError> {
        Ok(OrderRepo::create_if_open(&self.pool, session_code, product_id).await?)
    }

    async fn orders_for(&self, session_code: &str) -> Result<Vec<Order>, StoreError> {
        Ok(OrderRepo::list_by_session(&self.pool, session_code).await?)
    }

    async fn list(&self, filter: &SessionFilter, limit: i64) -> Result<Vec<Session>, StoreError> {
        Ok(SessionRepo::list(&self.pool, filter, limit).await?)
    }

    async fn delete(&self, code: &str) -> Result<bool, StoreError> {
        Ok(SessionRepo::delete(&self.pool, code).await?)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(crate::health_check(&self.pool).await?)
    }
}
