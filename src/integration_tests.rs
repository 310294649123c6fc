/// # Integration Tests Module
///
/// End-to-end CRUD scenarios against file-backed SQLite databases, checking
/// both the data and the connection bookkeeping.

#[cfg(test)]
mod tests {
    use crate::core::{CrudError, Value};
    use crate::driver::SqliteDriver;
    use crate::test_utils::{CountingDriver, DatabaseFixture, FailingCloseDriver};
    use crate::{Filter, Outcome, Scope, TableAccessor};

    fn names_for(accessor: &TableAccessor<CountingDriver>, id: i64) -> Vec<Value> {
        accessor
            .select("users", &["name"], Some(Filter::new("id", id)))
            .unwrap()
            .flat_map(|row| row.into_values())
            .collect()
    }

    #[test]
    fn test_users_scenario() {
        let fixture = DatabaseFixture::with_users().unwrap();
        let driver = CountingDriver::new();
        let accessor = TableAccessor::new(driver.clone(), fixture.config());

        let inserted = accessor
            .insert("users", &["id", "name"], &[1.into(), "Alice".into()])
            .unwrap();
        assert_eq!(inserted.rows_affected(), 1);
        assert_eq!(names_for(&accessor, 1), vec![Value::Text("Alice".into())]);

        let updated = accessor
            .update("users", &["name"], &["Bob".into()], Filter::new("id", 1))
            .unwrap();
        assert_eq!(updated, Outcome::Affected(1));
        assert_eq!(names_for(&accessor, 1), vec![Value::Text("Bob".into())]);

        let deleted = accessor.delete("users", Filter::new("id", 1)).unwrap();
        assert_eq!(deleted, Outcome::Affected(1));
        assert!(names_for(&accessor, 1).is_empty());

        assert_eq!(driver.opens(), 6);
        assert_eq!(driver.opens(), driver.closes());
    }

    #[test]
    fn test_zero_rows_is_a_distinct_success() {
        let fixture = DatabaseFixture::with_users().unwrap();
        let accessor = TableAccessor::new(SqliteDriver, fixture.config());
        accessor.insert("users", &["id", "name"], &[1.into(), "Alice".into()]).unwrap();

        let outcome = accessor
            .update("users", &["name"], &["Nobody".into()], Filter::new("id", 99))
            .unwrap();
        assert_eq!(outcome, Outcome::ZeroRowsAffected);
        assert_eq!(outcome.rows_affected(), 0);

        let outcome = accessor.delete("users", Filter::new("id", 99)).unwrap();
        assert!(outcome.is_zero_rows());
        assert_eq!(fixture.count("users").unwrap(), 1);
    }

    #[test]
    fn test_filtered_delete_leaves_other_rows() {
        let fixture = DatabaseFixture::with_users().unwrap();
        let accessor = TableAccessor::new(SqliteDriver, fixture.config());
        for (id, name) in [(1, "Alice"), (2, "Bob"), (3, "Alice")] {
            accessor.insert("users", &["id", "name"], &[id.into(), name.into()]).unwrap();
        }

        let outcome = accessor.delete("users", Filter::new("name", "Alice")).unwrap();
        assert_eq!(outcome, Outcome::Affected(2));

        let remaining: Vec<Vec<Value>> = accessor
            .select("users", &["id", "name"], None)
            .unwrap()
            .map(|row| row.into_values())
            .collect();
        assert_eq!(remaining, vec![vec![Value::Integer(2), Value::Text("Bob".into())]]);
    }

    #[test]
    fn test_all_rows_requires_explicit_marker() {
        let fixture = DatabaseFixture::with_users().unwrap();
        let accessor = TableAccessor::new(SqliteDriver, fixture.config());
        for id in 1..=3 {
            accessor.insert("users", &["id", "name"], &[Value::from(id), "x".into()]).unwrap();
        }

        let outcome = accessor
            .update("users", &["active"], &[false.into()], Scope::AllRows)
            .unwrap();
        assert_eq!(outcome, Outcome::Affected(3));

        let inactive = accessor
            .select("users", &["id"], Some(Filter::new("active", 0)))
            .unwrap()
            .count();
        assert_eq!(inactive, 3);

        let outcome = accessor.delete("users", Scope::AllRows).unwrap();
        assert_eq!(outcome, Outcome::Affected(3));
        assert_eq!(fixture.count("users").unwrap(), 0);
    }

    #[test]
    fn test_boolean_column_reads_back_as_bool() {
        let fixture = DatabaseFixture::with_users().unwrap();
        let accessor = TableAccessor::new(SqliteDriver, fixture.config());
        accessor
            .insert("users", &["id", "name", "active"], &[1.into(), "Alice".into(), true.into()])
            .unwrap();
        accessor
            .insert("users", &["id", "name", "active"], &[2.into(), "Bob".into(), false.into()])
            .unwrap();

        let rows: Vec<Vec<Value>> = accessor
            .select("users", &["id", "active"], Some(Filter::new("active", true)))
            .unwrap()
            .map(|row| row.into_values())
            .collect();
        assert_eq!(rows, vec![vec![Value::Integer(1), Value::Bool(true)]]);
    }

    #[test]
    fn test_null_filter_matches_null_rows() {
        let fixture = DatabaseFixture::new().unwrap();
        fixture
            .execute_batch("CREATE TABLE contacts (id INTEGER PRIMARY KEY, email TEXT);")
            .unwrap();
        let accessor = TableAccessor::new(SqliteDriver, fixture.config());
        accessor.insert("contacts", &["id", "email"], &[1.into(), Value::Null]).unwrap();
        accessor.insert("contacts", &["id", "email"], &[2.into(), "b@example.com".into()]).unwrap();
        accessor.insert("contacts", &["id", "email"], &[3.into(), Value::Null]).unwrap();

        let outcome = accessor
            .update("contacts", &["email"], &["unknown".into()], Filter::new("email", Value::Null))
            .unwrap();
        assert_eq!(outcome, Outcome::Affected(2));

        let outcome = accessor.delete("contacts", Filter::new("email", Value::Null)).unwrap();
        assert_eq!(outcome, Outcome::ZeroRowsAffected);

        let unknown = accessor
            .select("contacts", &["id"], Some(Filter::new("email", "unknown")))
            .unwrap()
            .count();
        assert_eq!(unknown, 2);
    }

    #[test]
    fn test_hostile_values_are_stored_verbatim() {
        let fixture = DatabaseFixture::with_users().unwrap();
        let accessor = TableAccessor::new(SqliteDriver, fixture.config());
        let hostile = "Robert'); DROP TABLE users; --";

        accessor.insert("users", &["id", "name"], &[1.into(), hostile.into()]).unwrap();
        let rows: Vec<_> = accessor
            .select("users", &["id"], Some(Filter::new("name", hostile)))
            .unwrap()
            .collect();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_by_name("id"), Some(&Value::Integer(1)));
        assert_eq!(fixture.count("users").unwrap(), 1);
    }

    #[test]
    fn test_opens_match_closes_across_mixed_sequence() {
        let fixture = DatabaseFixture::with_users().unwrap();
        let driver = CountingDriver::new();
        let accessor = TableAccessor::new(driver.clone(), fixture.config());

        for id in 0..5 {
            let _ = accessor.insert("users", &["id", "name"], &[id.into(), "n".into()]);
            let _ = accessor.insert("users", &["id", "name"], &[id.into(), "dup".into()]);
            let _ = accessor.insert("users", &["id"], &["a".into(), "b".into()]);
            let _ = accessor.update("users", &["missing_column"], &[1.into()], Scope::AllRows);
            let partial = accessor.select::<&str>("users", &[], None).map(|mut c| c.next());
            assert!(partial.is_ok());
            let _ = accessor.select("missing_table", &["id"], None);
            let _ = accessor.delete("users", Filter::new("id", id));
        }

        assert!(driver.opens() > 0);
        assert_eq!(driver.opens(), driver.closes());
    }

    #[test]
    fn test_close_failure_surfaces_after_successful_statement() {
        let fixture = DatabaseFixture::with_users().unwrap();
        let accessor = TableAccessor::new(FailingCloseDriver, fixture.config());

        match accessor.insert("users", &["id", "name"], &[1.into(), "Alice".into()]) {
            Err(CrudError::Driver(msg)) => assert!(msg.contains("simulated close failure")),
            other => panic!("Expected close failure, got {:?}", other),
        }
        // The row itself was written before the close failed
        assert_eq!(fixture.count("users").unwrap(), 1);

        // Execution errors take precedence over close errors
        match accessor.insert("users", &["id", "name"], &[1.into(), "Again".into()]) {
            Err(CrudError::Driver(msg)) => assert!(msg.contains("UNIQUE")),
            other => panic!("Expected constraint failure, got {:?}", other),
        }
    }
}
