//! Parameterized single-table CRUD over pluggable SQL drivers.
//!
//! ```no_run
//! use dbtemplate::{ConnectionConfig, Filter, SqliteDriver, TableAccessor};
//!
//! # fn main() -> dbtemplate::Result<()> {
//! let accessor = TableAccessor::new(SqliteDriver, ConnectionConfig::sqlite("app.db"));
//! accessor.insert("users", &["id", "name"], &[1.into(), "Alice".into()])?;
//! for row in accessor.select("users", &["name"], Some(Filter::new("id", 1)))? {
//!     println!("{}", row.to_json());
//! }
//! # Ok(())
//! # }
//! ```

// Core infrastructure modules
pub mod core;
pub mod config;
pub mod logging;

// CRUD modules
pub mod accessor;
pub mod cursor;
pub mod driver;
pub mod query;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
mod test_utils;

pub use accessor::{Outcome, TableAccessor};
pub use config::{Config, ConnectionConfig, Provider};
pub use crate::core::{CrudError, Result, Value};
pub use cursor::{Cursor, Row};
pub use driver::{Driver, DriverConnection, RowSet, SqliteDriver};
#[cfg(feature = "odbc")]
pub use driver::OdbcDriver;
pub use query::{Dialect, Filter, Scope, Statement, StatementKind};
