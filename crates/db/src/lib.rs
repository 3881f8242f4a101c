//! Persistence layer: models, repositories and the reminder store.
//!
//! Repositories are zero-sized structs with async functions taking
//! `&PgPool`. The dispatch orchestrator and the client mirror do not call
//! them directly; they go through the [`store::ReminderStore`] trait so
//! that the same logic runs against Postgres or the in-memory store.

pub mod ledger;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod store;

use sqlx::postgres::PgPoolOptions;

pub use ledger::{LedgerOutcome, NotificationLedger};
pub use memory::InMemoryStore;
pub use store::{PgReminderStore, ReminderStore, StoreError, StoreResult};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to verify connectivity.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
