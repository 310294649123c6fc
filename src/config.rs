use crate::core::{CrudError, Result};
use serde::Deserialize;
use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_SERVER_HOST: &str = "localhost";
const SQLITE_IN_MEMORY: &str = ":memory:";
const DEFAULT_CATALOG: &str = "database";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Default ODBC driver names per provider.
pub const ACCESS_ODBC_DRIVER: &str = "Microsoft Access Driver (*.mdb, *.accdb)";
pub const SQL_SERVER_ODBC_DRIVER: &str = "ODBC Driver 18 for SQL Server";

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Parses configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.connection.validate()?;
        Ok(config)
    }
}

/// Logging-related configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG` when set.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// Database engine behind a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Sqlite,
    Access,
    #[serde(alias = "mssql")]
    SqlServer,
}

impl Provider {
    /// Host used when none is configured. Access has none: it needs a file.
    pub fn default_host(&self) -> &'static str {
        match self {
            Provider::Sqlite => SQLITE_IN_MEMORY,
            Provider::Access => "",
            Provider::SqlServer => DEFAULT_SERVER_HOST,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::Sqlite => "sqlite",
            Provider::Access => "access",
            Provider::SqlServer => "sqlserver",
        };
        write!(f, "{}", name)
    }
}

/// Connection settings for one database.
///
/// Freely mutable through the `with_*` builders until handed to a
/// [`TableAccessor`](crate::TableAccessor), which only lends it out by shared
/// reference afterwards.
#[derive(Clone, Deserialize)]
#[serde(from = "ConnectionSection")]
pub struct ConnectionConfig {
    pub provider: Provider,
    /// ODBC driver name override; ignored by SQLite.
    pub driver: Option<String>,
    /// Server name for SQL Server, database file path for Access and SQLite.
    pub host: String,
    pub catalog: Option<String>,
    pub integrated_auth: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    pub encrypt: bool,
    pub trust_server_certificate: bool,
    pub persist_security_info: bool,
    pub busy_timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            provider: Provider::default(),
            driver: None,
            host: Provider::default().default_host().to_string(),
            catalog: Some(DEFAULT_CATALOG.to_string()),
            integrated_auth: true,
            username: None,
            password: None,
            encrypt: false,
            trust_server_certificate: false,
            persist_security_info: false,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

/// `[connection]` as written in the file; a missing host falls back to the
/// provider's default rather than a fixed one.
#[derive(Deserialize)]
#[serde(default)]
struct ConnectionSection {
    provider: Provider,
    driver: Option<String>,
    host: Option<String>,
    catalog: Option<String>,
    integrated_auth: bool,
    username: Option<String>,
    password: Option<String>,
    encrypt: bool,
    trust_server_certificate: bool,
    persist_security_info: bool,
    busy_timeout_ms: u64,
}

impl Default for ConnectionSection {
    fn default() -> Self {
        let defaults = ConnectionConfig::default();
        ConnectionSection {
            provider: defaults.provider,
            driver: defaults.driver,
            host: None,
            catalog: defaults.catalog,
            integrated_auth: defaults.integrated_auth,
            username: defaults.username,
            password: defaults.password,
            encrypt: defaults.encrypt,
            trust_server_certificate: defaults.trust_server_certificate,
            persist_security_info: defaults.persist_security_info,
            busy_timeout_ms: defaults.busy_timeout_ms,
        }
    }
}

impl From<ConnectionSection> for ConnectionConfig {
    fn from(section: ConnectionSection) -> Self {
        ConnectionConfig {
            provider: section.provider,
            driver: section.driver,
            host: section
                .host
                .unwrap_or_else(|| section.provider.default_host().to_string()),
            catalog: section.catalog,
            integrated_auth: section.integrated_auth,
            username: section.username,
            password: section.password,
            encrypt: section.encrypt,
            trust_server_certificate: section.trust_server_certificate,
            persist_security_info: section.persist_security_info,
            busy_timeout_ms: section.busy_timeout_ms,
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("provider", &self.provider)
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("catalog", &self.catalog)
            .field("integrated_auth", &self.integrated_auth)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("encrypt", &self.encrypt)
            .field("trust_server_certificate", &self.trust_server_certificate)
            .field("persist_security_info", &self.persist_security_info)
            .field("busy_timeout_ms", &self.busy_timeout_ms)
            .finish()
    }
}

impl ConnectionConfig {
    pub fn new(provider: Provider, host: impl Into<String>) -> Self {
        ConnectionConfig {
            provider,
            host: host.into(),
            ..Default::default()
        }
    }

    /// SQLite database at `path`.
    pub fn sqlite(path: impl AsRef<Path>) -> Self {
        Self::new(Provider::Sqlite, path.as_ref().to_string_lossy())
    }

    /// Access database file at `path`.
    pub fn access(path: impl AsRef<Path>) -> Self {
        Self::new(Provider::Access, path.as_ref().to_string_lossy())
    }

    /// SQL Server `host` using `catalog`, integrated authentication.
    pub fn sql_server(host: impl Into<String>, catalog: impl Into<String>) -> Self {
        Self::new(Provider::SqlServer, host).with_catalog(catalog)
    }

    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// Switches to username/password authentication.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.integrated_auth = false;
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_encryption(mut self, encrypt: bool, trust_server_certificate: bool) -> Self {
        self.encrypt = encrypt;
        self.trust_server_certificate = trust_server_certificate;
        self
    }

    pub fn with_persist_security_info(mut self, persist: bool) -> Self {
        self.persist_security_info = persist;
        self
    }

    pub fn with_busy_timeout_ms(mut self, millis: u64) -> Self {
        self.busy_timeout_ms = millis;
        self
    }

    /// ODBC driver name in effect for this provider.
    pub fn driver_name(&self) -> &str {
        match (&self.driver, self.provider) {
            (Some(name), _) => name,
            (None, Provider::Access) => ACCESS_ODBC_DRIVER,
            (None, Provider::SqlServer) => SQL_SERVER_ODBC_DRIVER,
            (None, Provider::Sqlite) => "sqlite",
        }
    }

    /// Checks that the settings are coherent before any connection attempt.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(CrudError::Config("host must not be empty".to_string()));
        }
        if self.integrated_auth && self.username.is_some() {
            return Err(CrudError::Config(
                "username is set but integrated_auth is enabled".to_string(),
            ));
        }
        if !self.integrated_auth && self.username.as_deref().map_or(true, str::is_empty) {
            return Err(CrudError::Config(
                "integrated_auth is disabled but no username was given".to_string(),
            ));
        }
        Ok(())
    }

    /// Renders the driver connection string, password included.
    pub fn connection_string(&self) -> String {
        self.render_connection_string(self.password.as_deref().unwrap_or_default())
    }

    /// Same as [`connection_string`](Self::connection_string) with the password masked.
    pub fn connection_string_redacted(&self) -> String {
        self.render_connection_string("***")
    }

    fn render_connection_string(&self, password: &str) -> String {
        let yes_no = |flag: bool| if flag { "yes" } else { "no" };
        let username = odbc_value(self.username.as_deref().unwrap_or_default());
        let password = odbc_value(password);
        let driver = self.driver_name().replace('}', "}}");
        let host = odbc_value(&self.host);

        match self.provider {
            Provider::Sqlite => self.host.clone(),
            Provider::Access => {
                let mut s = format!("Driver={{{}}};Dbq={};", driver, host);
                if !self.integrated_auth {
                    s.push_str(&format!("Uid={};Pwd={};", username, password));
                }
                if self.persist_security_info {
                    s.push_str("PersistSecurityInfo=True;");
                }
                s
            }
            Provider::SqlServer => {
                let mut s = format!("Driver={{{}}};Server={};", driver, host);
                if let Some(catalog) = &self.catalog {
                    s.push_str(&format!("Database={};", odbc_value(catalog)));
                }
                if self.integrated_auth {
                    s.push_str("Trusted_Connection=yes;");
                } else {
                    s.push_str(&format!("UID={};PWD={};", username, password));
                }
                s.push_str(&format!(
                    "Encrypt={};TrustServerCertificate={};",
                    yes_no(self.encrypt),
                    yes_no(self.trust_server_certificate)
                ));
                s
            }
        }
    }
}

/// Quotes an ODBC attribute value when it would otherwise be read as syntax.
///
/// Values holding `;`, `{`, `}` or `=`, or with surrounding whitespace, are
/// wrapped in braces with every `}` doubled.
fn odbc_value(value: &str) -> Cow<'_, str> {
    let needs_braces = value.contains(|c| matches!(c, ';' | '{' | '}' | '='))
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace);
    if needs_braces {
        Cow::Owned(format!("{{{}}}", value.replace('}', "}}")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Loads configuration from a TOML file at the given path.
///
/// # Example
///
/// ```no_run
/// let config = dbtemplate::config::load_config("dbtemplate.toml").expect("Failed to load config");
/// println!("{:?}", config);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    Config::from_toml_str(&content)
}

/// `<config dir>/dbtemplate/config.toml`, if the platform has a config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dbtemplate").join("config.toml"))
}
