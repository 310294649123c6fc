//! Cursor Module
//!
//! Forward-only iteration over a SELECT result. The cursor owns the
//! connection the query ran on and releases it on `close()`, on exhaustion,
//! or when dropped, whichever happens first.

use crate::accessor::ConnectionGuard;
use crate::core::{Result, Value};
use crate::driver::{DriverConnection, RowSet};
use std::sync::Arc;

/// One result row with shared access to the column names.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Looks up a value by column name, ignoring ASCII case.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .and_then(|idx| self.values.get(idx))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Renders the row as a JSON object keyed by column name.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .columns
            .iter()
            .cloned()
            .zip(self.values.iter().map(|v| serde_json::to_value(v).unwrap_or(serde_json::Value::Null)))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

/// Live result of [`TableAccessor::select`](crate::TableAccessor::select).
pub struct Cursor<C: DriverConnection> {
    guard: ConnectionGuard<C>,
    columns: Arc<[String]>,
    rows: std::vec::IntoIter<Vec<Value>>,
}

impl<C: DriverConnection> Cursor<C> {
    pub(crate) fn new(guard: ConnectionGuard<C>, set: RowSet) -> Self {
        Cursor {
            guard,
            columns: set.columns.into(),
            rows: set.rows.into_iter(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// True while the underlying connection has not been released.
    pub fn is_open(&self) -> bool {
        self.guard.is_open()
    }

    /// Releases the connection, reporting a failing close.
    pub fn close(self) -> Result<()> {
        self.guard.close()
    }
}

impl<C: DriverConnection> Iterator for Cursor<C> {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        match self.rows.next() {
            Some(values) => Some(Row {
                columns: Arc::clone(&self.columns),
                values,
            }),
            None => {
                self.guard.release();
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl<C: DriverConnection> std::fmt::Debug for Cursor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("columns", &self.columns)
            .field("remaining", &self.rows.len())
            .field("open", &self.guard.is_open())
            .finish()
    }
}
