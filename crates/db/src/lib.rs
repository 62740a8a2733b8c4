//! Session/order storage for tabsync.
//!
//! The rest of the workspace talks to storage only through the
//! [`SessionStore`] trait. Two adapters are provided:
//!
//! - [`PgSessionStore`] backed by PostgreSQL via sqlx (production);
//! - [`MemoryStore`] kept entirely in process (tests, local runs without a
//!   database).

use sqlx::postgres::PgPoolOptions;

pub mod memory;
pub mod models;
pub mod pg;
pub mod repositories;
pub mod store;

pub use memory::MemoryStore;
pub use pg::PgSessionStore;
pub use store::{OrderAttach, SessionStore, StoreError, NAME_LOCATION_CONSTRAINT};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Run a trivial query to confirm the pool can reach the database.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the SQL migrations shipped in `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
