//! Table Accessor Module
//!
//! Parameterized INSERT/SELECT/UPDATE/DELETE against one table per call,
//! written once against the [`Driver`] trait.
//!
//! ## Connection lifecycle
//!
//! Every call follows
//! `Idle → ConnectionOpening → StatementBound → Executing → (Success | Failed) → ConnectionClosed`.
//! The statement is validated and rendered before the connection is opened,
//! so caller errors never reach the driver. Once open, the connection lives
//! in a [`ConnectionGuard`] that closes it on every exit path.

use crate::config::ConnectionConfig;
use crate::core::{CrudError, Result, Value};
use crate::cursor::Cursor;
use crate::driver::{Driver, DriverConnection};
use crate::query::{Filter, RenderedStatement, Scope, Statement};
use tracing::{debug, error, info, warn};

/// Result of a mutating statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// At least one row changed
    Affected(u64),
    /// The statement ran but matched nothing
    ZeroRowsAffected,
}

impl Outcome {
    pub fn from_count(count: u64) -> Self {
        if count == 0 {
            Outcome::ZeroRowsAffected
        } else {
            Outcome::Affected(count)
        }
    }

    pub fn rows_affected(&self) -> u64 {
        match self {
            Outcome::Affected(n) => *n,
            Outcome::ZeroRowsAffected => 0,
        }
    }

    pub fn is_zero_rows(&self) -> bool {
        matches!(self, Outcome::ZeroRowsAffected)
    }
}

/// Owns an open connection and closes it exactly once.
///
/// `close` reports the backend's close error; `Drop` and `release` log it.
pub(crate) struct ConnectionGuard<C: DriverConnection> {
    conn: Option<C>,
    driver: &'static str,
}

impl<C: DriverConnection> ConnectionGuard<C> {
    fn new(conn: C, driver: &'static str) -> Self {
        ConnectionGuard {
            conn: Some(conn),
            driver,
        }
    }

    fn connection(&mut self) -> Result<&mut C> {
        self.conn
            .as_mut()
            .ok_or_else(|| CrudError::ConnectionFailure("connection already closed".to_string()))
    }

    pub(crate) fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    pub(crate) fn close(mut self) -> Result<()> {
        match self.conn.take() {
            Some(conn) => {
                let closed = conn.close();
                debug!(driver = self.driver, ok = closed.is_ok(), "connection closed");
                closed
            }
            None => Ok(()),
        }
    }

    /// Closes now if still open, logging rather than returning a failure.
    pub(crate) fn release(&mut self) {
        if let Some(conn) = self.conn.take() {
            match conn.close() {
                Ok(()) => debug!(driver = self.driver, "connection closed"),
                Err(e) => warn!(driver = self.driver, error = %e, "failed to close connection"),
            }
        }
    }
}

impl<C: DriverConnection> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        self.release();
    }
}

/// CRUD helper bound to one connection configuration.
///
/// Holds no in-flight statement state; each call opens its own connection,
/// so a shared `&TableAccessor` is safe to use from several threads whenever
/// the driver is `Sync`.
#[derive(Debug)]
pub struct TableAccessor<D: Driver> {
    driver: D,
    config: ConnectionConfig,
}

impl<D: Driver> TableAccessor<D> {
    /// Stores the driver and configuration; no connection is opened.
    pub fn new(driver: D, config: ConnectionConfig) -> Self {
        TableAccessor { driver, config }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Inserts one row.
    ///
    /// # Errors
    ///
    /// `ParameterMismatch` when `columns` and `values` differ in length,
    /// `ConnectionFailure` or `Driver` from the backend.
    pub fn insert<S: AsRef<str>>(&self, table: &str, columns: &[S], values: &[Value]) -> Result<Outcome> {
        let statement = Statement::insert(table, columns, values)?;
        self.mutate(&statement)
    }

    /// Runs a SELECT and hands back a cursor that owns the connection.
    ///
    /// An empty `columns` slice selects every column; `None` scans the table.
    pub fn select<S: AsRef<str>>(
        &self,
        table: &str,
        columns: &[S],
        filter: Option<Filter>,
    ) -> Result<Cursor<D::Connection>> {
        let statement = Statement::select(table, columns, filter);
        let rendered = statement.render(self.driver.dialect())?;

        let mut guard = self.open()?;
        debug!(
            driver = self.driver.name(),
            sql = %rendered.sql,
            param_types = ?param_types(&rendered.params),
            "executing query"
        );

        let result = guard.connection()?.query(&rendered.sql, &rendered.params);
        match result {
            Ok(set) => {
                debug!(table, rows = set.rows.len(), "query returned");
                Ok(Cursor::new(guard, set))
            }
            Err(e) => {
                error!(table, error = %e, "select failed");
                if let Err(close_err) = guard.close() {
                    warn!(error = %close_err, "failed to close connection after error");
                }
                Err(e)
            }
        }
    }

    /// Updates the rows matched by `scope`; `Scope::AllRows` updates every row.
    pub fn update<S: AsRef<str>>(
        &self,
        table: &str,
        columns: &[S],
        values: &[Value],
        scope: impl Into<Scope>,
    ) -> Result<Outcome> {
        let statement = Statement::update(table, columns, values, scope.into())?;
        self.mutate(&statement)
    }

    /// Deletes the rows matched by `scope`; `Scope::AllRows` empties the table.
    pub fn delete(&self, table: &str, scope: impl Into<Scope>) -> Result<Outcome> {
        let statement = Statement::delete(table, scope.into());
        self.mutate(&statement)
    }

    fn open(&self) -> Result<ConnectionGuard<D::Connection>> {
        let conn = self.driver.open(&self.config).map_err(|e| {
            error!(driver = self.driver.name(), error = %e, "failed to open connection");
            e
        })?;
        Ok(ConnectionGuard::new(conn, self.driver.name()))
    }

    fn mutate(&self, statement: &Statement) -> Result<Outcome> {
        let kind = statement.kind();
        let table = statement.table();
        let RenderedStatement { sql, params } = statement.render(self.driver.dialect())?;

        let mut guard = self.open()?;
        debug!(
            driver = self.driver.name(),
            sql = %sql,
            param_types = ?param_types(&params),
            "executing statement"
        );

        let executed = guard.connection()?.execute(&sql, &params);
        let closed = guard.close();

        let count = match (executed, closed) {
            (Ok(count), Ok(())) => count,
            (Ok(_), Err(close_err)) => {
                error!(table, error = %close_err, "statement ran but closing the connection failed");
                return Err(close_err);
            }
            (Err(e), closed) => {
                error!(table, statement = %kind, error = %e, "statement failed");
                if let Err(close_err) = closed {
                    warn!(error = %close_err, "failed to close connection after error");
                }
                return Err(e);
            }
        };

        let outcome = Outcome::from_count(count);
        match outcome {
            Outcome::Affected(n) => info!(table, "{} row(s) {}", n, kind.past_tense()),
            Outcome::ZeroRowsAffected => warn!(table, "no rows {}", kind.past_tense()),
        }
        Ok(outcome)
    }
}

/// Parameter variants for log fields; the values themselves are never logged.
fn param_types(params: &[Value]) -> Vec<&'static str> {
    params.iter().map(Value::type_name).collect()
}
