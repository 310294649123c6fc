//! Identifier validation and quoting.
//!
//! Table and column names cannot be bound as parameters, so they are the one
//! piece of caller input that ends up in SQL text. Each name is validated and
//! then quoted for the target dialect with embedded quote characters escaped.

use super::Dialect;
use crate::core::{CrudError, Result};

/// Conservative limit across backends (SQL Server allows 128 characters,
/// Access 64, SQLite has no practical limit).
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Rejects empty names, NUL bytes and names longer than 128 bytes.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CrudError::InvalidIdentifier(
            "identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(CrudError::InvalidIdentifier(format!(
            "identifier contains a null byte: {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(CrudError::InvalidIdentifier(format!(
            "identifier exceeds {} bytes (got {}): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Validates and quotes a single identifier.
pub fn quote_identifier(dialect: Dialect, name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(dialect.quote(name))
}

/// Quotes a possibly schema-qualified name (`dbo.users`) part by part.
pub fn quote_qualified(dialect: Dialect, name: &str) -> Result<String> {
    let parts = name
        .split('.')
        .map(|part| quote_identifier(dialect, part))
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join("."))
}
