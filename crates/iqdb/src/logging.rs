//! Logging initialization.
//!
//! Uses `tracing-subscriber` with human-readable or JSON output on stderr;
//! stdout is reserved for signatures and records.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// `level` is the default filter; the `RUST_LOG` environment variable
/// overrides it when set.
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Pick the effective level and format from config and CLI flags.
fn resolve(
    config: &iqdb_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) -> (&str, bool) {
    let level = if verbose_override && !matches!(config.logging.level.as_str(), "trace") {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let json_format = json_logs_override || config.logging.format == "json";
    (level, json_format)
}

/// Initialize logging with settings from the iqdb configuration.
pub fn init_from_config(
    config: &iqdb_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) {
    let (level, json_format) = resolve(config, verbose_override, json_logs_override);
    init(level, json_format);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_defaults() {
        let config = iqdb_core::Config::default();
        assert_eq!(resolve(&config, false, false), ("info", false));
    }

    #[test]
    fn test_resolve_overrides() {
        let mut config = iqdb_core::Config::default();
        assert_eq!(resolve(&config, true, true), ("debug", true));

        config.logging.level = "trace".to_string();
        assert_eq!(resolve(&config, true, false), ("trace", false));

        config.logging.format = "json".to_string();
        assert_eq!(resolve(&config, false, false), ("trace", true));
    }
}
