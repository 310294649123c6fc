/// Query Construction Module
///
/// Turns a CRUD request into SQL text plus an ordered parameter list.
///
/// ## Architecture
///
/// - **Dialects** (`dialect.rs`): placeholder syntax and identifier quoting per backend
/// - **Identifiers** (`identifier.rs`): validation and quoting of table/column names
/// - **Statements** (`statement.rs`): the four statement shapes and their rendering
///
/// Identifiers are the only caller input ever written into SQL text. Values,
/// including filter values, always travel as bound parameters.
pub mod dialect;
pub mod identifier;
pub mod statement;

pub use dialect::Dialect;
pub use identifier::{quote_identifier, quote_qualified, validate_identifier};
pub use statement::{Filter, RenderedStatement, Scope, Statement, StatementKind};
