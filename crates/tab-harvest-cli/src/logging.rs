use std::env;
use tracing::{debug, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const HARVEST_CRATES: [&str; 2] = ["tab_harvest_core", "tab_harvest_cli"];

/// Build the filter directives for `TRACING_LEVEL`.
///
/// A bare level (`debug`) applies to this tool's crates only; dependencies
/// stay at `warn`. Anything else is taken as a full `EnvFilter` directive.
fn filter_directives(level: Option<&str>) -> String {
    let level = level.map(str::trim).filter(|l| !l.is_empty()).unwrap_or("info");
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    let mut directives: Vec<String> = HARVEST_CRATES
        .iter()
        .map(|krate| format!("{}={}", krate, level))
        .collect();
    directives.push("warn".to_string());
    directives.join(",")
}

/// Log to stderr (stdout carries tab listings and the preview table) and to
/// `LOG_FILE_PATH`. Keep the returned guard alive until exit so the file
/// writer flushes.
pub fn init_logger() -> impl Drop {
    let directives = filter_directives(env::var("TRACING_LEVEL").ok().as_deref());
    let (filter_layer, rejected) = match EnvFilter::try_new(&directives) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new(filter_directives(None)), Some(e)),
    };

    let log_file_path =
        env::var("LOG_FILE_PATH").unwrap_or_else(|_| "./logs/tab-harvest.log".to_string());
    let file_appender = tracing_appender::rolling::never("./", log_file_path);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_target(false)
                .without_time()
                .with_ansi(true),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_ansi(false),
        )
        .with(filter_layer)
        .init();

    if let Some(e) = rejected {
        warn!("Ignoring TRACING_LEVEL '{}': {}", directives, e);
    }
    debug!("Logging with filter '{}'", directives);

    guard
}
