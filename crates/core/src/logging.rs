//! Logging for mdsplit.
//!
//! Logs are written to stderr; stdout carries chunk output only.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{AppError, AppResult};

const DEFAULT_FILTER: &str = "info";

/// Build the event filter from an explicit directive, `RUST_LOG`, or the default.
///
/// Directives use `EnvFilter` syntax, e.g. `debug` or `info,mdsplit_chunk=trace`.
pub fn build_filter(log_level: Option<&str>) -> AppResult<EnvFilter> {
    let directives = match log_level {
        Some(level) => level.to_string(),
        None => std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string()),
    };

    EnvFilter::try_new(&directives)
        .map_err(|e| AppError::Config(format!("Invalid log filter {:?}: {}", directives, e)))
}

/// Install the global subscriber.
///
/// Colors are disabled by `no_color` or a set `NO_COLOR` variable. Fails if a
/// subscriber is already installed.
///
/// ```no_run
/// mdsplit_core::logging::init_logging(Some("debug"), false).unwrap();
/// ```
pub fn init_logging(log_level: Option<&str>, no_color: bool) -> AppResult<()> {
    let ansi = !no_color && std::env::var_os("NO_COLOR").is_none();

    tracing_subscriber::registry()
        .with(build_filter(log_level)?)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(ansi),
        )
        .try_init()
        .map_err(|e| AppError::Config(format!("Failed to init logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter() {
        let filter = build_filter(Some("warn,mdsplit_chunk=debug")).unwrap();
        assert!(filter.to_string().contains("mdsplit_chunk=debug"));
    }

    #[test]
    fn test_invalid_filter_is_config_error() {
        let result = build_filter(Some("info,mdsplit=notalevel"));
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
