//! dbtemplate Error Module
//!
//! Structured error handling for the CRUD accessor and its drivers. Every
//! failure reaches the caller as a `CrudError` carrying the underlying detail;
//! nothing is collapsed into a bare `false` or a null reader.
use thiserror::Error;

/// Comprehensive error type for dbtemplate.
///
/// Caller contract violations (`ParameterMismatch`, `EmptyStatement`,
/// `InvalidIdentifier`) are detected before any driver is touched.
/// `ConnectionFailure` and `Driver` come from the backend.
#[derive(Error, Debug)]
pub enum CrudError {
    /// Column names and values differ in length
    #[error("Parameter mismatch: {columns} column(s) but {values} value(s)")]
    ParameterMismatch { columns: usize, values: usize },

    /// INSERT or UPDATE issued without any column
    #[error("Parameter mismatch: {0} requires at least one column")]
    EmptyStatement(&'static str),

    /// Table or column name rejected before quoting
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// The driver could not open a connection
    #[error("Connection failure: {0}")]
    ConnectionFailure(String),

    /// Statement execution failed (constraint violation, syntax, timeout, ...)
    #[error("Driver error: {0}")]
    Driver(String),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML configuration parse errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON rendering errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CrudError {
    /// Returns true for errors caused by the caller rather than the database.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            CrudError::ParameterMismatch { .. }
                | CrudError::EmptyStatement(_)
                | CrudError::InvalidIdentifier(_)
        )
    }
}

/// Type alias for Result to use CrudError as the error type.
pub type Result<T> = std::result::Result<T, CrudError>;
