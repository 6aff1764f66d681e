use std::{fs::File, path::Path};

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter as TracingLevel;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Keeps the log file writer alive, records still queued are written on drop.
pub struct LogFileGuard {
    _writer: WorkerGuard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[clap(rename_all = "UPPER")]
#[serde(rename_all = "UPPERCASE")]
pub enum LevelFilter {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LevelFilter> for TracingLevel {
    fn from(level: LevelFilter) -> Self {
        match level {
            LevelFilter::Off => TracingLevel::OFF,
            LevelFilter::Error => TracingLevel::ERROR,
            LevelFilter::Warn => TracingLevel::WARN,
            LevelFilter::Info => TracingLevel::INFO,
            LevelFilter::Debug => TracingLevel::DEBUG,
            LevelFilter::Trace => TracingLevel::TRACE,
        }
    }
}

/// Filter for the stderr output.
///
/// An explicit level (command line or config) wins over `RUST_LOG`, without
/// either only warnings and errors are shown.
fn stderr_filter(level: Option<LevelFilter>) -> EnvFilter {
    match level {
        Some(level) => EnvFilter::builder()
            .with_default_directive(TracingLevel::from(level).into())
            .parse_lossy(""),
        None => EnvFilter::builder()
            .with_default_directive(TracingLevel::WARN.into())
            .from_env_lossy(),
    }
}

/// Configures tracing and sets up the logging facility.
///
/// Human readable records go to stderr so that command output on stdout can
/// be piped. The log file, if any, gets every record as JSON.
pub fn setup_logging(
    log_path: Option<&Path>,
    level: Option<LevelFilter>,
) -> anyhow::Result<Option<LogFileGuard>> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .without_time()
        .with_writer(std::io::stderr)
        .with_filter(stderr_filter(level));

    let Some(log_path) = log_path else {
        tracing_subscriber::registry().with(stderr_layer).init();
        return Ok(None);
    };

    let log_file = File::create(log_path)?;
    let (file_writer, guard) = tracing_appender::non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(log_file);

    // Register traces are what the file is for, record everything.
    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(file_writer)
        .with_filter(TracingLevel::TRACE);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    tracing::debug!("Logging register accesses to {}", log_path.display());

    Ok(Some(LogFileGuard { _writer: guard }))
}

#[cfg(test)]
mod test {
    use test_case::test_case;

    use super::*;

    #[test_case(LevelFilter::Off => Some(TracingLevel::OFF))]
    #[test_case(LevelFilter::Info => Some(TracingLevel::INFO))]
    #[test_case(LevelFilter::Trace => Some(TracingLevel::TRACE))]
    fn explicit_level_sets_the_stderr_filter(level: LevelFilter) -> Option<TracingLevel> {
        stderr_filter(Some(level)).max_level_hint()
    }
}
