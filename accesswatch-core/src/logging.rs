use anyhow::Context;
use clap::ValueEnum;
use std::fs;
use std::io::{self, IsTerminal};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt};

/// Diagnostic log encoding. Stats and alerts go to stdout through a sink and
/// are not affected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Pretty,
}

pub fn default_log_format() -> LogFormat {
    if io::stderr().is_terminal() {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    }
}

/// Initialize the diagnostic logging system.
///
/// - Filters with `RUST_LOG`, defaulting to "info"
/// - Writes to stderr, or to `log_file` through a non-blocking appender
/// - Installs the tokio-console subscriber instead when `TOKIO_CONSOLE` is set
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the process.
pub fn init_logging(
    format: Option<LogFormat>,
    log_file: Option<&Path>,
) -> anyhow::Result<Option<WorkerGuard>> {
    // If tokio-console is enabled, DO NOT install the normal subscriber
    if std::env::var("TOKIO_CONSOLE").is_ok() {
        console_subscriber::init();
        return Ok(None);
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (writer, guard, to_terminal) = match log_file {
        Some(path) => {
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            (BoxMakeWriter::new(writer), Some(guard), false)
        }
        None => (
            BoxMakeWriter::new(io::stderr),
            None,
            io::stderr().is_terminal(),
        ),
    };

    let format = format.unwrap_or_else(default_log_format);
    let builder = fmt().with_env_filter(filter).with_writer(writer);

    let installed = match format {
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
        LogFormat::Pretty => builder.with_ansi(to_terminal).try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("cannot install tracing subscriber: {e}"))?;

    Ok(guard)
}
