//! Database connection management with pragma configuration.
//!
//! This module handles opening the SQLite database, applying required
//! pragmas for performance and concurrency (WAL mode), and running
//! migrations.

use std::path::Path;

use tokio_rusqlite::Connection;

use super::error::StoreError;
use super::migrations;

/// Storage handle shared by the pipeline and tools.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread.
#[derive(Clone, Debug)]
pub struct StoreDb {
    pub(crate) conn: Connection,
}

impl StoreDb {
    /// Open a database at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies performance pragmas,
    /// and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path).await.map_err(|e| StoreError::Database(e.into()))?;
        Self::init(conn).await
    }

    /// Open an in-memory database for testing.
    ///
    /// Creates a temporary in-memory SQLite database with the same
    /// pragma configuration as file-based databases.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| StoreError::Database(e.into()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;
                 PRAGMA temp_store=MEMORY;
                 PRAGMA foreign_keys=ON;",
            )?;
            Ok(())
        })
        .await
        .map_err(StoreError::Database)?;

        migrations::run(&conn).await?;

        Ok(Self { conn })
    }

    /// Whether the backend honors a `SET LOCAL statement_timeout` prefix.
    ///
    /// SQLite does not; callers bound execution with an async timeout
    /// instead of a SQL-level one.
    pub fn supports_statement_timeout(&self) -> bool {
        false
    }

    /// Run a raw SQL batch, e.g. to load relational fixtures or apply DDL
    /// from an operator script.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), StoreError> {
        let sql = sql.to_string();
        self.conn
            .call(move |conn| {
                conn.execute_batch(&sql)?;
                Ok(())
            })
            .await
            .map_err(StoreError::Database)
    }
}
