//! Repository for the `sessions` table.

use sqlx::PgPool;
use tabsync_core::session::SessionState;

use crate::models::session::{CreateSession, Session, SessionFilter};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "code, name, location_id, state, created_at";

/// Provides CRUD operations for sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session, returning the created row.
    ///
    /// The state column takes its `'OPEN'` default.
    pub async fn create(pool: &PgPool, input: &CreateSession) -> Result<Session, sqlx::Error> {
        let query = format!(
            "INSERT INTO sessions (code, name, location_id)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(&input.code)
            .bind(&input.name)
            .bind(input.location_id)
            .fetch_one(pool)
            .await
    }

    /// Find a session by its code.
    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Session>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sessions WHERE code = $1");
        sqlx::query_as::<_, Session>(&query)
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    /// Update the state of a session. Returns `None` if the code is unknown.
    pub async fn set_state(
        pool: &PgPool,
        code: &str,
        state: SessionState,
    ) -> Result<Option<Session>, sqlx::Error> {
        let query = format!(
            "UPDATE sessions SET state = $2 WHERE code = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(code)
            .bind(state.as_str())
            .fetch_optional(pool)
            .await
    }

    /// List sessions matching the optional filters, oldest first.
    pub async fn list(
        pool: &PgPool,
        filter: &SessionFilter,
        limit: i64,
    ) -> Result<Vec<Session>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions
             WHERE ($1::BIGINT IS NULL OR location_id = $1)
               AND ($2::TEXT IS NULL OR state = $2)
             ORDER BY created_at, code
             LIMIT $3"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(filter.location_id)
            .bind(filter.state.map(SessionState::as_str))
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Delete a session; its orders go with it (`ON DELETE CASCADE`).
    /// Returns `true` if the row existed.
    pub async fn delete(pool: &PgPool, code: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE code = $1")
            .bind(code)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
