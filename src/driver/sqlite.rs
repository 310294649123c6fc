//! SQLite backend
//!
//! Opens a rusqlite connection per call against the file named by
//! `ConnectionConfig::host`, or `:memory:`.

use super::{Driver, DriverConnection, RowSet};
use crate::config::{ConnectionConfig, Provider};
use crate::core::{CrudError, Result, Value};
use crate::query::Dialect;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};
use std::time::Duration;
use tracing::debug;

/// Driver for SQLite databases.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

impl SqliteDriver {
    pub fn new() -> Self {
        SqliteDriver
    }
}

impl Driver for SqliteDriver {
    type Connection = SqliteConnection;

    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn open(&self, config: &ConnectionConfig) -> Result<SqliteConnection> {
        if config.provider != Provider::Sqlite {
            return Err(CrudError::Config(format!(
                "sqlite driver cannot open a {} connection",
                config.provider
            )));
        }

        let conn = Connection::open(&config.host).map_err(|e| {
            CrudError::ConnectionFailure(format!("failed to open {}: {}", config.host, e))
        })?;

        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(|e| CrudError::ConnectionFailure(format!("failed to set busy timeout: {}", e)))?;

        // Initialize connection with common pragmas
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| CrudError::ConnectionFailure(format!("failed to apply pragmas: {}", e)))?;

        debug!(path = %config.host, "sqlite connection opened");
        Ok(SqliteConnection { conn })
    }
}

/// An open rusqlite connection.
#[derive(Debug)]
pub struct SqliteConnection {
    conn: Connection,
}

impl DriverConnection for SqliteConnection {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| CrudError::Driver(format!("Failed to prepare statement: {}", e)))?;

        let affected = stmt
            .execute(params_from_iter(params.iter()))
            .map_err(|e| CrudError::Driver(e.to_string()))?;

        Ok(affected as u64)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<RowSet> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| CrudError::Driver(format!("Failed to prepare statement: {}", e)))?;

        let (columns, booleans): (Vec<String>, Vec<bool>) = stmt
            .columns()
            .iter()
            .map(|col| (col.name().to_string(), col.decl_type().map_or(false, is_boolean_decl)))
            .unzip();
        let column_count = columns.len();

        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                let mut values = Vec::with_capacity(column_count);
                for i in 0..column_count {
                    values.push(from_value_ref(row.get_ref(i)?, booleans[i]));
                }
                Ok(values)
            })
            .map_err(|e| CrudError::Driver(format!("Query execution failed: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| CrudError::Driver(format!("Result processing failed: {}", e)))?;

        Ok(RowSet { columns, rows })
    }

    fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| CrudError::Driver(format!("Failed to close connection: {}", e)))
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Bool(b) => ToSqlOutput::Borrowed(ValueRef::Integer(i64::from(*b))),
            Value::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

/// SQLite has no boolean storage class; `BOOL`/`BOOLEAN` columns hold 0/1.
fn is_boolean_decl(decl: &str) -> bool {
    decl.eq_ignore_ascii_case("BOOLEAN") || decl.eq_ignore_ascii_case("BOOL")
}

fn from_value_ref(value: ValueRef<'_>, boolean: bool) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) if boolean => Value::Bool(i != 0),
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}
