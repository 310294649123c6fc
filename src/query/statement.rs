//! The four statement shapes and their rendering.

use super::{quote_identifier, quote_qualified, Dialect};
use crate::core::{CrudError, Result, Value};
use std::fmt;

/// Represents the CRUD statement types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Insert,
    Select,
    Update,
    Delete,
}

impl StatementKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            StatementKind::Insert => "INSERT",
            StatementKind::Select => "SELECT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
        }
    }

    /// Past participle used in log lines ("3 row(s) updated").
    pub fn past_tense(&self) -> &'static str {
        match self {
            StatementKind::Insert => "inserted",
            StatementKind::Select => "selected",
            StatementKind::Update => "updated",
            StatementKind::Delete => "deleted",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A single `column = value` equality constraint. A `Null` value matches
/// with `IS NULL`.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn new(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// Which rows an UPDATE or DELETE touches.
///
/// There is no implicit "no filter": mutating a whole table requires
/// `Scope::AllRows` to be spelled out.
#[derive(Debug, Clone, PartialEq)]
pub enum Scope {
    Where(Filter),
    AllRows,
}

impl Scope {
    pub fn filter(&self) -> Option<&Filter> {
        match self {
            Scope::Where(filter) => Some(filter),
            Scope::AllRows => None,
        }
    }
}

impl From<Filter> for Scope {
    fn from(filter: Filter) -> Self {
        Scope::Where(filter)
    }
}

/// SQL text plus the parameters to bind, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// One CRUD statement against one table, assembled per call.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    kind: StatementKind,
    table: String,
    columns: Vec<String>,
    values: Vec<Value>,
    filter: Option<Filter>,
}

impl Statement {
    /// `INSERT INTO table (columns) VALUES (placeholders)`
    pub fn insert<S: AsRef<str>>(table: &str, columns: &[S], values: &[Value]) -> Result<Self> {
        check_pairs(StatementKind::Insert, columns.len(), values.len())?;
        Ok(Statement {
            kind: StatementKind::Insert,
            table: table.to_string(),
            columns: owned(columns),
            values: values.to_vec(),
            filter: None,
        })
    }

    /// `SELECT columns FROM table [WHERE filter]`; no columns selects `*`.
    pub fn select<S: AsRef<str>>(table: &str, columns: &[S], filter: Option<Filter>) -> Self {
        Statement {
            kind: StatementKind::Select,
            table: table.to_string(),
            columns: owned(columns),
            values: Vec::new(),
            filter,
        }
    }

    /// `UPDATE table SET column = placeholder, ... [WHERE filter]`
    pub fn update<S: AsRef<str>>(
        table: &str,
        columns: &[S],
        values: &[Value],
        scope: Scope,
    ) -> Result<Self> {
        check_pairs(StatementKind::Update, columns.len(), values.len())?;
        Ok(Statement {
            kind: StatementKind::Update,
            table: table.to_string(),
            columns: owned(columns),
            values: values.to_vec(),
            filter: scope.filter().cloned(),
        })
    }

    /// `DELETE FROM table [WHERE filter]`
    pub fn delete(table: &str, scope: Scope) -> Self {
        Statement {
            kind: StatementKind::Delete,
            table: table.to_string(),
            columns: Vec::new(),
            values: Vec::new(),
            filter: scope.filter().cloned(),
        }
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    /// Renders SQL text for `dialect`.
    ///
    /// The text contains only quoted identifiers, keywords and placeholders.
    pub fn render(&self, dialect: Dialect) -> Result<RenderedStatement> {
        let table = quote_qualified(dialect, &self.table)?;
        let columns = self
            .columns
            .iter()
            .map(|c| quote_identifier(dialect, c))
            .collect::<Result<Vec<_>>>()?;

        let mut params: Vec<Value> = Vec::with_capacity(self.values.len() + 1);
        let mut sql = match self.kind {
            StatementKind::Insert => {
                let placeholders = (1..=columns.len())
                    .map(|i| dialect.placeholder(i))
                    .collect::<Vec<_>>();
                params.extend(self.values.iter().cloned());
                format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    table,
                    columns.join(", "),
                    placeholders.join(", ")
                )
            }
            StatementKind::Select => {
                let projection = if columns.is_empty() {
                    "*".to_string()
                } else {
                    columns.join(", ")
                };
                format!("SELECT {} FROM {}", projection, table)
            }
            StatementKind::Update => {
                let assignments = columns
                    .iter()
                    .enumerate()
                    .map(|(i, c)| format!("{} = {}", c, dialect.placeholder(i + 1)))
                    .collect::<Vec<_>>();
                params.extend(self.values.iter().cloned());
                format!("UPDATE {} SET {}", table, assignments.join(", "))
            }
            StatementKind::Delete => format!("DELETE FROM {}", table),
        };

        if let Some(filter) = &self.filter {
            let column = quote_identifier(dialect, &filter.column)?;
            if filter.value.is_null() {
                // `= NULL` is never true
                sql.push_str(&format!(" WHERE {} IS NULL", column));
            } else {
                params.push(filter.value.clone());
                sql.push_str(&format!(" WHERE {} = {}", column, dialect.placeholder(params.len())));
            }
        }

        Ok(RenderedStatement { sql, params })
    }
}

fn owned<S: AsRef<str>>(columns: &[S]) -> Vec<String> {
    columns.iter().map(|c| c.as_ref().to_string()).collect()
}

/// Column/value pairing contract for INSERT and UPDATE.
fn check_pairs(kind: StatementKind, columns: usize, values: usize) -> Result<()> {
    if columns != values {
        return Err(CrudError::ParameterMismatch { columns, values });
    }
    if columns == 0 {
        return Err(CrudError::EmptyStatement(kind.keyword()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(items: &[Value]) -> Vec<Value> {
        items.to_vec()
    }

    #[test]
    fn test_insert_rendering() {
        let stmt = Statement::insert("users", &["id", "name"], &values(&[1.into(), "Alice".into()])).unwrap();
        let rendered = stmt.render(Dialect::Sqlite).unwrap();
        insta::assert_snapshot!(rendered.sql, @r#"INSERT INTO "users" ("id", "name") VALUES (?1, ?2)"#);
        assert_eq!(rendered.params, vec![Value::Integer(1), Value::Text("Alice".into())]);

        let rendered = stmt.render(Dialect::SqlServer).unwrap();
        assert_eq!(rendered.sql, "INSERT INTO [users] ([id], [name]) VALUES (?, ?)");
    }

    #[test]
    fn test_select_rendering() {
        let all = Statement::select::<&str>("users", &[], None).render(Dialect::Sqlite).unwrap();
        assert_eq!(all.sql, "SELECT * FROM \"users\"");
        assert!(all.params.is_empty());

        let filtered = Statement::select("users", &["name"], Some(Filter::new("id", 1)))
            .render(Dialect::Sqlite)
            .unwrap();
        insta::assert_snapshot!(filtered.sql, @r#"SELECT "name" FROM "users" WHERE "id" = ?1"#);
        assert_eq!(filtered.params, vec![Value::Integer(1)]);
    }

    #[test]
    fn test_update_rendering() {
        let stmt = Statement::update(
            "dbo.users",
            &["name", "active"],
            &values(&["Bob".into(), true.into()]),
            Filter::new("id", 1).into(),
        )
        .unwrap();
        let rendered = stmt.render(Dialect::SqlServer).unwrap();
        assert_eq!(
            rendered.sql,
            "UPDATE [dbo].[users] SET [name] = ?, [active] = ? WHERE [id] = ?"
        );
        assert_eq!(
            rendered.params,
            vec![Value::Text("Bob".into()), Value::Bool(true), Value::Integer(1)]
        );

        let rendered = stmt.render(Dialect::Sqlite).unwrap();
        assert_eq!(
            rendered.sql,
            "UPDATE \"dbo\".\"users\" SET \"name\" = ?1, \"active\" = ?2 WHERE \"id\" = ?3"
        );
    }

    #[test]
    fn test_all_rows_renders_without_where() {
        let update = Statement::update("users", &["active"], &values(&[false.into()]), Scope::AllRows).unwrap();
        assert_eq!(
            update.render(Dialect::Access).unwrap().sql,
            "UPDATE [users] SET [active] = ?"
        );

        let delete = Statement::delete("users", Scope::AllRows);
        assert_eq!(delete.render(Dialect::Sqlite).unwrap().sql, "DELETE FROM \"users\"");
        assert!(delete.filter().is_none());
    }

    #[test]
    fn test_delete_rendering() {
        let rendered = Statement::delete("users", Filter::new("id", 1).into())
            .render(Dialect::Sqlite)
            .unwrap();
        assert_eq!(rendered.sql, "DELETE FROM \"users\" WHERE \"id\" = ?1");
        assert_eq!(rendered.params, vec![Value::Integer(1)]);
    }

    #[test]
    fn test_null_filter_renders_is_null() {
        let stmt = Statement::update(
            "users",
            &["name"],
            &values(&["Anon".into()]),
            Filter::new("email", Value::Null).into(),
        )
        .unwrap();
        let rendered = stmt.render(Dialect::Sqlite).unwrap();
        insta::assert_snapshot!(rendered.sql, @r#"UPDATE "users" SET "name" = ?1 WHERE "email" IS NULL"#);
        assert_eq!(rendered.params, vec![Value::Text("Anon".into())]);

        let rendered = Statement::delete("users", Filter::new("email", None::<String>).into())
            .render(Dialect::SqlServer)
            .unwrap();
        assert_eq!(rendered.sql, "DELETE FROM [users] WHERE [email] IS NULL");
        assert!(rendered.params.is_empty());
    }

    #[test]
    fn test_values_never_reach_sql_text() {
        let hostile = "x'; DROP TABLE users; --";
        let stmt = Statement::update(
            "users",
            &["name"],
            &values(&[hostile.into()]),
            Filter::new("name", hostile).into(),
        )
        .unwrap();
        let rendered = stmt.render(Dialect::Sqlite).unwrap();
        assert!(!rendered.sql.contains("DROP"));
        assert_eq!(rendered.params.len(), 2);
    }

    #[test]
    fn test_parameter_mismatch() {
        match Statement::insert("users", &["id", "name"], &values(&[1.into()])) {
            Err(CrudError::ParameterMismatch { columns: 2, values: 1 }) => {}
            other => panic!("Expected ParameterMismatch, got {:?}", other),
        }

        match Statement::update("users", &["name"], &[], Scope::AllRows) {
            Err(CrudError::ParameterMismatch { columns: 1, values: 0 }) => {}
            other => panic!("Expected ParameterMismatch, got {:?}", other),
        }

        match Statement::insert::<&str>("users", &[], &[]) {
            Err(CrudError::EmptyStatement("INSERT")) => {}
            other => panic!("Expected EmptyStatement, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_identifiers_fail_rendering() {
        let stmt = Statement::select("users", &[""], None);
        assert!(matches!(stmt.render(Dialect::Sqlite), Err(CrudError::InvalidIdentifier(_))));

        let stmt = Statement::delete("users", Filter::new("", 1).into());
        assert!(matches!(stmt.render(Dialect::Sqlite), Err(CrudError::InvalidIdentifier(_))));
    }
}
