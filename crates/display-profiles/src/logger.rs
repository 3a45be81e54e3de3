use std::path::Path;

use tracing::{
    Level,
    subscriber::{SetGlobalDefaultError, set_global_default},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt};

/// Logs to stdout and a daily log file, the guards must be held until exit.
pub fn setup_logger(
    debug: bool,
    log_dir: &Path,
) -> Result<(WorkerGuard, WorkerGuard), SetGlobalDefaultError> {
    let level = if debug { Level::TRACE } else { Level::INFO };
    let filter = tracing_subscriber::filter::Targets::new().with_default(level);

    // stdout logger
    let (std_writer, std_guard) = tracing_appender::non_blocking(std::io::stdout());
    let std_logger = tracing_subscriber::fmt::layer()
        .with_writer(std_writer)
        .with_ansi(false)
        .with_target(false)
        .without_time();

    // file logger
    let file_appender = tracing_appender::rolling::daily(log_dir, "display-profiles.log");
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    let file_logger = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE);

    // Register loggers
    let collector = tracing_subscriber::registry()
        .with(std_logger)
        .with(file_logger)
        .with(filter);

    set_global_default(collector)?;

    Ok((std_guard, file_guard))
}
