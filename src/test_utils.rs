//! # Test Utilities Module
//!
//! Testing infrastructure shared by the unit and integration tests:
//! - File-backed SQLite fixtures (each call opens a fresh connection, so
//!   in-memory databases would not survive between calls)
//! - `CountingDriver`, a `SqliteDriver` wrapper that records opens and closes
//! - `FailingCloseDriver`, whose connections fail to close

use crate::config::ConnectionConfig;
use crate::core::{CrudError, Result, Value};
use crate::driver::{Driver, DriverConnection, RowSet, SqliteConnection, SqliteDriver};
use crate::query::Dialect;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Isolated database test fixture backed by a temporary file.
pub struct DatabaseFixture {
    _dir: TempDir,
    pub path: PathBuf,
}

impl DatabaseFixture {
    /// Create an empty database
    pub fn new() -> Result<Self> {
        let dir = TempDir::new()?;
        let path = dir.path().join("fixture.db");
        Connection::open(&path).map_err(|e| CrudError::Driver(e.to_string()))?;
        Ok(DatabaseFixture { _dir: dir, path })
    }

    /// Create fixture with the `users` table used by the scenarios
    pub fn with_users() -> Result<Self> {
        let fixture = Self::new()?;
        fixture.execute_batch(
            "
            CREATE TABLE users (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                active BOOLEAN NOT NULL DEFAULT 1
            );
        ",
        )?;
        Ok(fixture)
    }

    pub fn config(&self) -> ConnectionConfig {
        ConnectionConfig::sqlite(&self.path)
    }

    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = Connection::open(&self.path).map_err(|e| CrudError::Driver(e.to_string()))?;
        conn.execute_batch(sql).map_err(|e| CrudError::Driver(e.to_string()))
    }

    /// Row count read directly, bypassing the accessor.
    pub fn count(&self, table: &str) -> Result<i64> {
        let conn = Connection::open(&self.path).map_err(|e| CrudError::Driver(e.to_string()))?;
        conn.query_row(&format!("SELECT COUNT(*) FROM \"{}\"", table), [], |row| row.get(0))
            .map_err(|e| CrudError::Driver(e.to_string()))
    }
}

/// `SqliteDriver` wrapper counting opened and closed connections.
#[derive(Debug, Clone, Default)]
pub struct CountingDriver {
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl CountingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

pub struct CountingConnection {
    inner: SqliteConnection,
    closes: Arc<AtomicUsize>,
}

impl Driver for CountingDriver {
    type Connection = CountingConnection;

    fn name(&self) -> &'static str {
        "counting-sqlite"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn open(&self, config: &ConnectionConfig) -> Result<CountingConnection> {
        let inner = SqliteDriver.open(config)?;
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(CountingConnection {
            inner,
            closes: Arc::clone(&self.closes),
        })
    }
}

impl DriverConnection for CountingConnection {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        self.inner.execute(sql, params)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<RowSet> {
        self.inner.query(sql, params)
    }

    fn close(self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.inner.close()
    }
}

/// Driver whose connections execute normally but always fail to close.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingCloseDriver;

pub struct FailingCloseConnection {
    inner: SqliteConnection,
}

impl Driver for FailingCloseDriver {
    type Connection = FailingCloseConnection;

    fn name(&self) -> &'static str {
        "failing-close"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn open(&self, config: &ConnectionConfig) -> Result<FailingCloseConnection> {
        Ok(FailingCloseConnection {
            inner: SqliteDriver.open(config)?,
        })
    }
}

impl DriverConnection for FailingCloseConnection {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        self.inner.execute(sql, params)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<RowSet> {
        self.inner.query(sql, params)
    }

    fn close(self) -> Result<()> {
        drop(self.inner);
        Err(CrudError::Driver("simulated close failure".to_string()))
    }
}
