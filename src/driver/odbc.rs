//! ODBC backend for Microsoft Access and SQL Server.
//!
//! Both engines are reached through the system ODBC driver manager. The
//! connection string comes from [`ConnectionConfig::connection_string`], so the
//! flavour only decides the dialect and which provider it accepts.
//!
//! A single ODBC `Environment` is created lazily and shared for the life of
//! the process; connections borrow it with a `'static` lifetime.

use super::{Driver, DriverConnection, RowSet};
use crate::config::{ConnectionConfig, Provider};
use crate::core::{CrudError, Result, Value};
use crate::query::Dialect;
use odbc_api::buffers::TextRowSet;
use odbc_api::parameter::InputParameter;
use odbc_api::{Bit, ConnectionOptions, Cursor, DataType, Environment, IntoParameter, Nullable, ResultSetMetadata};
use once_cell::sync::OnceCell;
use tracing::debug;

/// Rows fetched per round trip.
const FETCH_BATCH_SIZE: usize = 1000;
/// Upper bound for a single text cell.
const MAX_TEXT_LENGTH: usize = 65536;

static ENVIRONMENT: OnceCell<Environment> = OnceCell::new();

fn environment() -> Result<&'static Environment> {
    ENVIRONMENT.get_or_try_init(|| {
        Environment::new().map_err(|e| {
            CrudError::ConnectionFailure(format!(
                "Failed to create ODBC environment: {}. \
                 Make sure an ODBC driver manager (unixODBC on Linux/macOS) is installed.",
                e
            ))
        })
    })
}

/// ODBC driver bound to one provider.
#[derive(Debug, Clone, Copy)]
pub struct OdbcDriver {
    provider: Provider,
}

impl OdbcDriver {
    /// Microsoft Access through the Access ODBC driver (Jet/ACE).
    pub fn access() -> Self {
        OdbcDriver { provider: Provider::Access }
    }

    /// SQL Server through the Microsoft ODBC driver.
    pub fn sql_server() -> Self {
        OdbcDriver { provider: Provider::SqlServer }
    }
}

impl Driver for OdbcDriver {
    type Connection = OdbcConnection;

    fn name(&self) -> &'static str {
        match self.provider {
            Provider::Access => "odbc-access",
            _ => "odbc-sqlserver",
        }
    }

    fn dialect(&self) -> Dialect {
        match self.provider {
            Provider::Access => Dialect::Access,
            _ => Dialect::SqlServer,
        }
    }

    fn open(&self, config: &ConnectionConfig) -> Result<OdbcConnection> {
        if config.provider != self.provider {
            return Err(CrudError::Config(format!(
                "{} driver cannot open a {} connection",
                self.name(),
                config.provider
            )));
        }

        let env = environment()?;
        debug!(
            connection = %config.connection_string_redacted(),
            "opening ODBC connection"
        );

        let conn = env
            .connect_with_connection_string(&config.connection_string(), ConnectionOptions::default())
            .map_err(|e| {
                CrudError::ConnectionFailure(format!(
                    "Failed to connect via ODBC ({}): {}",
                    config.driver_name(),
                    e
                ))
            })?;

        Ok(OdbcConnection { conn })
    }
}

/// An open ODBC connection.
pub struct OdbcConnection {
    conn: odbc_api::Connection<'static>,
}

impl DriverConnection for OdbcConnection {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        let params = to_parameters(params);
        let mut stmt = self
            .conn
            .preallocate()
            .map_err(|e| CrudError::Driver(format!("Failed to allocate statement: {}", e)))?;

        let _ = stmt
            .execute(sql, params.as_slice())
            .map_err(|e| CrudError::Driver(e.to_string()))?;

        let affected = stmt
            .row_count()
            .map_err(|e| CrudError::Driver(format!("Failed to read row count: {}", e)))?
            .ok_or_else(|| CrudError::Driver("driver did not report a row count".to_string()))?;

        Ok(affected as u64)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<RowSet> {
        let params = to_parameters(params);
        let mut set = RowSet::default();

        if let Some(mut cursor) = self
            .conn
            .execute(sql, params.as_slice())
            .map_err(|e| CrudError::Driver(format!("Query execution failed: {}", e)))?
        {
            set.columns = cursor
                .column_names()
                .map_err(|e| CrudError::Driver(format!("Failed to read column names: {}", e)))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| CrudError::Driver(format!("Failed to read column names: {}", e)))?;
            let kinds = (1..=set.columns.len() as u16)
                .map(|col| cursor.col_data_type(col).map(CellKind::from))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| CrudError::Driver(format!("Failed to read column types: {}", e)))?;

            let mut buffers = TextRowSet::for_cursor(FETCH_BATCH_SIZE, &mut cursor, Some(MAX_TEXT_LENGTH))
                .map_err(|e| CrudError::Driver(format!("Failed to create row buffer: {}", e)))?;
            let mut row_cursor = cursor
                .bind_buffer(&mut buffers)
                .map_err(|e| CrudError::Driver(format!("Failed to bind buffer: {}", e)))?;

            while let Some(batch) = row_cursor
                .fetch()
                .map_err(|e| CrudError::Driver(format!("Failed to fetch rows: {}", e)))?
            {
                for row_idx in 0..batch.num_rows() {
                    let row = kinds
                        .iter()
                        .enumerate()
                        .map(|(col_idx, kind)| kind.convert(batch.at(col_idx, row_idx)))
                        .collect();
                    set.rows.push(row);
                }
            }
        }

        Ok(set)
    }

    fn close(self) -> Result<()> {
        // odbc-api disconnects when the handle drops
        drop(self.conn);
        Ok(())
    }
}

/// How a text-fetched cell maps back onto [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Integer,
    Real,
    Bool,
    Text,
}

impl From<DataType> for CellKind {
    fn from(data_type: DataType) -> Self {
        match data_type {
            DataType::TinyInt | DataType::SmallInt | DataType::Integer | DataType::BigInt => CellKind::Integer,
            DataType::Real | DataType::Float { .. } | DataType::Double => CellKind::Real,
            DataType::Bit => CellKind::Bool,
            _ => CellKind::Text,
        }
    }
}

impl CellKind {
    /// Parses the fetched text; text that does not parse is kept as `Text`.
    fn convert(self, cell: Option<&[u8]>) -> Value {
        let Some(bytes) = cell else {
            return Value::Null;
        };
        let text = String::from_utf8_lossy(bytes);
        let trimmed = text.trim();
        let parsed = match self {
            CellKind::Integer => trimmed.parse::<i64>().ok().map(Value::Integer),
            CellKind::Real => trimmed.parse::<f64>().ok().map(Value::Real),
            CellKind::Bool => match trimmed {
                "1" => Some(Value::Bool(true)),
                "0" => Some(Value::Bool(false)),
                _ => None,
            },
            CellKind::Text => None,
        };
        parsed.unwrap_or_else(|| Value::Text(text.into_owned()))
    }
}

fn to_parameters(values: &[Value]) -> Vec<Box<dyn InputParameter>> {
    values.iter().map(to_parameter).collect()
}

fn to_parameter(value: &Value) -> Box<dyn InputParameter> {
    match value {
        Value::Null => Box::new(Nullable::<i64>::null()),
        Value::Bool(b) => Box::new(Bit::from_bool(*b)),
        Value::Integer(i) => Box::new(*i),
        Value::Real(f) => Box::new(*f),
        Value::Text(s) => Box::new(s.clone().into_parameter()),
        Value::Blob(b) => Box::new(b.clone().into_parameter()),
    }
}
