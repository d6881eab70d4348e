//! Database connection management
//!
//! SQLite connection pooling for the recipe collection.

use std::path::Path;
use std::sync::Arc;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use thiserror::Error;

/// Database error types
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] r2d2::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl Database {
    /// Create a new database connection pool
    pub fn new<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let manager = SqliteConnectionManager::file(path)
            .with_flags(
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_URI,
            )
            .with_init(|conn| {
                // Cascading deletes of additions depend on foreign keys
                conn.execute_batch(
                    "PRAGMA foreign_keys = ON;
                     PRAGMA journal_mode = WAL;
                     PRAGMA synchronous = NORMAL;
                     PRAGMA cache_size = -64000;
                     PRAGMA temp_store = MEMORY;",
                )?;
                Ok(())
            });

        let pool = Pool::builder()
            .max_size(10)
            .build(manager)?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Single-connection in-memory database, used by tests and dry runs
    pub fn in_memory() -> DbResult<Self> {
        let manager = SqliteConnectionManager::memory().with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });

        // Every in-memory connection is its own database, so the pool holds one
        let pool = Pool::builder().max_size(1).build(manager)?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Get a connection from the pool
    pub fn get_conn(&self) -> DbResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Execute a closure with a database connection
    pub fn with_conn<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> DbResult<T>,
    {
        let conn = self.get_conn()?;
        f(&conn)
    }

    /// Execute a closure with a mutable database connection (for transactions)
    pub fn with_conn_mut<F, T>(&self, f: F) -> DbResult<T>
    where
        F: FnOnce(&mut rusqlite::Connection) -> DbResult<T>,
    {
        let mut conn = self.get_conn()?;
        f(&mut conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_enforces_foreign_keys() {
        let db = Database::in_memory().unwrap();
        let enabled: i32 = db
            .with_conn(|conn| Ok(conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_in_memory_shares_one_database() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (7);")?;
            Ok(())
        })
        .unwrap();
        let x: i32 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT x FROM t", [], |row| row.get(0))?))
            .unwrap();
        assert_eq!(x, 7);
    }

    #[test]
    fn test_invalid_data_display() {
        let err = DbError::InvalidData("unit 'pinch'".to_string());
        assert_eq!(err.to_string(), "Invalid stored data: unit 'pinch'");
    }
}
