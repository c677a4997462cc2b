//! Database connection pool management.
//!
//! This module initializes and configures the SQLite connection pool with:
//! - WAL mode enabled for file-backed stores
//! - Automatic database file creation
//! - A single long-lived connection for in-memory stores, which would
//!   otherwise vanish with the connection that created them

use std::str::FromStr;

use log::{error, info};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error_handling::StoreError;

/// Connections kept by a file-backed pool.
const MAX_CONNECTIONS: u32 = 5;

fn is_in_memory(connection_string: &str) -> bool {
    connection_string.contains(":memory:") || connection_string.contains("mode=memory")
}

/// Initializes and returns a connection pool for a SQLite URL such as
/// `sqlite://school.db` or `sqlite::memory:`.
///
/// Creates the database file if it doesn't exist.
pub async fn init_pool(connection_string: &str) -> Result<SqlitePool, StoreError> {
    let in_memory = is_in_memory(connection_string);

    let mut options = SqliteConnectOptions::from_str(connection_string)
        .map_err(|e| {
            error!("Invalid connection string {connection_string:?}: {e}");
            StoreError::SqlError(e)
        })?
        .create_if_missing(true);
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(MAX_CONNECTIONS)
    };

    let pool = pool_options.connect_with(options).await.map_err(|e| {
        error!("Failed to connect to document store: {e}");
        StoreError::SqlError(e)
    })?;

    info!("Connected to document store at {connection_string}");
    Ok(pool)
}
