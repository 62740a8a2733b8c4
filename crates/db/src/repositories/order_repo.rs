//! Repository for the `orders` table.

use sqlx::PgPool;
use tabsync_core::session::SessionState;
use tabsync_core::types::DbId;

use crate::models::order::Order;
use crate::store::OrderAttach;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, session_code, product_id, created_at";

/// Provides insert and listing operations for orders.
pub struct OrderRepo;

impl OrderRepo {
    /// Insert an order if, and only if, its session is currently `OPEN`.
    ///
    /// The session row is locked with `SELECT ... FOR UPDATE` so a concurrent
    /// close either commits before the check (and the insert is refused) or
    /// waits until the order is committed.
    pub async fn create_if_open(
        pool: &PgPool,
        session_code: &str,
        product_id: DbId,
    ) -> Result<OrderAttach, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let state: Option<String> =
            sqlx::query_scalar("SELECT state FROM sessions WHERE code = $1 FOR UPDATE")
                .bind(session_code)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(state) = state else {
            return Ok(OrderAttach::SessionNotFound);
        };
        let state: SessionState = state
            .parse()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        if !state.accepts_orders() {
            return Ok(OrderAttach::SessionClosed);
        }

        let query = format!(
            "INSERT INTO orders (session_code, product_id)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&query)
            .bind(session_code)
            .bind(product_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(OrderAttach::Created(order))
    }

    /// List all orders of a session in insertion order.
    pub async fn list_by_session(
        pool: &PgPool,
        session_code: &str,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE session_code = $1 ORDER BY id");
        sqlx::query_as::<_, Order>(&query)
            .bind(session_code)
            .fetch_all(pool)
            .await
    }
}
