//! Logging setup on top of tracing-subscriber.

use crate::config::LoggingConfig;
use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static INIT: OnceCell<()> = OnceCell::new();

/// Installs the global subscriber once; later calls are no-ops.
///
/// `RUST_LOG` takes precedence over `config.filter` when set.
pub fn init_logging(config: &LoggingConfig) {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.filter))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let builder = tracing_subscriber::fmt().with_env_filter(filter);
        let installed = if config.json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };

        if let Err(e) = installed {
            eprintln!("Logging already initialised elsewhere: {}", e);
        }
    });
}
