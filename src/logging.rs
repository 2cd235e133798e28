//! Tracing subscriber setup for the smoke binary and embedding services

use crate::config::LogConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter directives for `config`
///
/// sqlx logs every statement at `info`; those lines are capped at `warn`
/// unless `log_statements` is set.
pub fn filter_directives(config: &LogConfig) -> String {
    if config.log_statements {
        config.log_level.clone()
    } else {
        format!("{},sqlx=warn", config.log_level)
    }
}

/// Install the global subscriber; keep the guard alive for the process lifetime
///
/// `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &LogConfig) -> WorkerGuard {
    let file_appender = match config.rotation.as_str() {
        "hourly" => tracing_appender::rolling::hourly(&config.log_dir, &config.log_file),
        "daily" => tracing_appender::rolling::daily(&config.log_dir, &config.log_file),
        _ => tracing_appender::rolling::never(&config.log_dir, &config.log_file),
    };
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config)));
    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json {
        // Unit-of-work and tx ids are event fields; JSON keeps them queryable
        let file_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_writer(non_blocking)
            .with_ansi(false);
        registry.with(file_layer).init();
    } else {
        let file_layer = fmt::layer()
            .with_target(false)
            .with_writer(non_blocking)
            .with_ansi(false);
        // Operators running the smoke check watch the console
        let stdout_layer = fmt::layer().with_target(false).with_ansi(true);
        registry.with(file_layer).with(stdout_layer).init();
    }

    guard
}
