use dbtemplate::config::{default_config_path, load_config, Config};
use dbtemplate::logging::init_logging;
use dbtemplate::{ConnectionConfig, CrudError, Driver, Filter, Provider, Result, SqliteDriver, TableAccessor};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

const USERS_TABLE_SQL: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
)";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .get(1)
        .map(PathBuf::from)
        .or_else(|| default_config_path().filter(|path| path.exists()));

    let mut scratch: Option<PathBuf> = None;
    let config = match config_path {
        Some(path) => load_config(&path)?,
        None => {
            let path = std::env::temp_dir().join(format!("dbtemplate-demo-{}.db", std::process::id()));
            scratch = Some(path.clone());
            Config {
                connection: ConnectionConfig::sqlite(path),
                ..Default::default()
            }
        }
    };

    init_logging(&config.logging);
    info!("Starting dbtemplate...");
    println!("Running the users scenario against {}", config.connection.connection_string_redacted());

    let provider = config.connection.provider;
    let result = match provider {
        Provider::Sqlite => {
            prepare_sqlite(&config.connection)?;
            run_scenario(&TableAccessor::new(SqliteDriver, config.connection))
        }
        Provider::Access | Provider::SqlServer => run_odbc(config.connection),
    };

    if let Some(path) = scratch {
        let _ = std::fs::remove_file(path);
    }
    result
}

/// The accessor does no DDL; the demo table is created directly.
fn prepare_sqlite(config: &ConnectionConfig) -> Result<()> {
    let conn = rusqlite::Connection::open(&config.host)
        .map_err(|e| CrudError::ConnectionFailure(e.to_string()))?;
    conn.execute_batch(USERS_TABLE_SQL)
        .map_err(|e| CrudError::Driver(e.to_string()))
}

#[cfg(feature = "odbc")]
fn run_odbc(config: ConnectionConfig) -> Result<()> {
    use dbtemplate::OdbcDriver;

    let driver = match config.provider {
        Provider::Access => OdbcDriver::access(),
        _ => OdbcDriver::sql_server(),
    };
    run_scenario(&TableAccessor::new(driver, config))
}

#[cfg(not(feature = "odbc"))]
fn run_odbc(config: ConnectionConfig) -> Result<()> {
    Err(CrudError::Config(format!(
        "{} support requires building with the `odbc` feature",
        config.provider
    )))
}

fn run_scenario<D: Driver>(accessor: &TableAccessor<D>) -> Result<()> {
    accessor.delete("users", Filter::new("id", 1))?;

    let inserted = accessor.insert("users", &["id", "name"], &[1.into(), "Alice".into()])?;
    println!("insert: {} row(s) affected", inserted.rows_affected());
    print_user(accessor)?;

    let updated = accessor.update("users", &["name"], &["Bob".into()], Filter::new("id", 1))?;
    println!("update: {} row(s) affected", updated.rows_affected());
    print_user(accessor)?;

    let deleted = accessor.delete("users", Filter::new("id", 1))?;
    println!("delete: {} row(s) affected", deleted.rows_affected());
    print_user(accessor)
}

fn print_user<D: Driver>(accessor: &TableAccessor<D>) -> Result<()> {
    let cursor = accessor.select("users", &["id", "name"], Some(Filter::new("id", 1)))?;
    let mut found = false;
    for row in cursor {
        found = true;
        println!("  {}", serde_json::to_string(&row.to_json())?);
    }
    if !found {
        println!("  (no rows)");
    }
    Ok(())
}
