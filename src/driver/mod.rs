/// Driver Module
///
/// The capability interface every backend implements, written once so the
/// CRUD logic in [`TableAccessor`](crate::TableAccessor) never depends on a
/// concrete database library.
///
/// ## Backends
///
/// - **SQLite** (`sqlite.rs`): rusqlite, always available
/// - **ODBC** (`odbc.rs`): Access and SQL Server through odbc-api, behind the `odbc` feature
pub mod sqlite;

#[cfg(feature = "odbc")]
pub mod odbc;

pub use sqlite::{SqliteConnection, SqliteDriver};

#[cfg(feature = "odbc")]
pub use odbc::{OdbcConnection, OdbcDriver};

use crate::config::ConnectionConfig;
use crate::core::{Result, Value};
use crate::query::Dialect;

/// Column names and fully fetched rows of one result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// A database backend able to open connections from a [`ConnectionConfig`].
pub trait Driver {
    type Connection: DriverConnection;

    /// Short backend name used in log fields.
    fn name(&self) -> &'static str;

    /// SQL syntax the accessor must render for this backend.
    fn dialect(&self) -> Dialect;

    /// Opens a new physical connection.
    ///
    /// Failures are reported as `CrudError::ConnectionFailure`.
    fn open(&self, config: &ConnectionConfig) -> Result<Self::Connection>;
}

/// One open physical connection.
pub trait DriverConnection {
    /// Executes a non-query statement and returns the affected row count.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Executes a query and fetches its result set.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<RowSet>;

    /// Closes the connection, reporting any error the backend raises.
    fn close(self) -> Result<()>;
}
