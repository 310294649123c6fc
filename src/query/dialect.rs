/// SQL syntax differences between the supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Numbered `?NNN` placeholders, double-quoted identifiers
    Sqlite,
    /// Positional `?` placeholders, bracketed identifiers (Jet/ACE)
    Access,
    /// Positional `?` placeholders (ODBC), bracketed identifiers
    SqlServer,
}

impl Dialect {
    /// Placeholder for the parameter at 1-based `position`.
    pub fn placeholder(&self, position: usize) -> String {
        match self {
            Dialect::Sqlite => format!("?{}", position),
            Dialect::Access | Dialect::SqlServer => "?".to_string(),
        }
    }

    /// Wraps an already validated identifier in the dialect's quotes.
    pub(crate) fn quote(&self, name: &str) -> String {
        match self {
            Dialect::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
            Dialect::Access | Dialect::SqlServer => format!("[{}]", name.replace(']', "]]")),
        }
    }
}
