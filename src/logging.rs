//! Logging setup: stdout plus a non-blocking log file

use std::path::Path;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize logging with dual output: stdout and the given log file.
///
/// Both outputs take their level from `RUST_LOG`, defaulting to "info".
/// The appender guard is forgotten so the file writer stays alive for the
/// program lifetime.
pub fn init_logging(log_file: &str) {
    let path = Path::new(log_file);
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let name = path.file_name().map_or(log_file, |n| {
        n.to_str().unwrap_or(log_file)
    });
    let file_appender =
        tracing_appender::rolling::never(dir.unwrap_or_else(|| Path::new(".")), name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(env_filter()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(env_filter()),
        )
        .init();

    std::mem::forget(guard);
}
