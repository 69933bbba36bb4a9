//! Logger setup.

use log::SetLoggerError;

use super::Config;

/// Install the process logger. `RUST_LOG` takes precedence over the
/// environment-derived default filter.
pub fn init_logger(config: &Config) -> Result<(), SetLoggerError> {
    let default_filter = if config.is_production() {
        "info"
    } else {
        "debug,sqlx=info"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .try_init()
}
