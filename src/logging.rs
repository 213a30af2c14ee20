use once_cell::sync::OnceCell;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Initializes the logging system with both console and file output.
pub fn init_logging() {
    let _ = fs::create_dir_all("logs");

    // Daily rotation, JSON lines on disk, human-readable on the console
    let file_appender = tracing_appender::rolling::daily("logs", "receipt_ingest.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
    let console_layer = fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("receipt_ingest=info".parse().unwrap()))
        .with(file_layer)
        .with(console_layer)
        .init();

    // The guard must stay alive for the process lifetime or buffered log
    // lines are dropped on exit.
    let _ = LOG_GUARD.set(guard);
}
