/// Core Module for dbtemplate
///
/// Shared building blocks used by every other module: the crate-wide error
/// type and the driver-agnostic value representation that flows between the
/// accessor and the drivers.

pub mod error;
pub mod value;

// Re-export commonly used types for convenience
pub use error::{CrudError, Result};
pub use value::Value;
