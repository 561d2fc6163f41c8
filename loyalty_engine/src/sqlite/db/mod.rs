//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are simple functions (rather than stateful structs) that accept a `&mut SqliteConnection`
//! argument. Callers can obtain a connection from a pool, or open an atomic transaction and pass `&mut *tx` through
//! to the functions without any other changes.
//!
//! SQLite allows a single writer at a time. Every transaction that changes balances starts with a write statement,
//! so that it takes the write lock before reading anything. Competing writers then wait on the busy timeout instead of
//! working from a stale snapshot.
use std::{str::FromStr, time::Duration};

use log::info;
use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod orders;
pub mod user_accounts;
pub mod withdrawals;

/// The default location of the loyalty database.
pub const SQLITE_DB_URL: &str = "sqlite://data/loyalty_store.db";
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// The embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./src/sqlite/migrations");

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqlxError> {
    MIGRATOR.run(pool).await?;
    info!("🗃️ Database migrations complete");
    Ok(())
}
