//! Log output
//!
//! The console shows INFO and above (adjusted by `-v`/`-q`), while a plain
//! text log file under the log directory keeps DEBUG detail for the run.

use std::io;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Name of the log file inside the log directory
pub const LOG_FILE_NAME: &str = "campus_archiver.log";

const FILE_DIRECTIVES: &str = "campus_archiver=debug,info";

fn console_directives(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }

    match verbose {
        0 => "campus_archiver=info,warn",
        1 => "campus_archiver=debug,info",
        2 => "campus_archiver=trace,debug",
        _ => "trace",
    }
}

/// Console filter for the given verbosity
pub fn console_filter(verbose: u8, quiet: bool) -> EnvFilter {
    EnvFilter::new(console_directives(verbose, quiet))
}

/// Opens `<dir>/campus_archiver.log` for appending through a background writer
///
/// Lines still buffered are flushed when the returned guard is dropped.
pub fn file_writer(dir: &Path) -> io::Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    Ok(tracing_appender::non_blocking(appender))
}

/// DEBUG-level layer writing plain text to `writer`
pub fn file_layer<S>(writer: NonBlocking) -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(EnvFilter::new(FILE_DIRECTIVES))
}

/// Installs the global subscriber
///
/// # Arguments
///
/// * `verbose` - Number of `-v` flags
/// * `quiet` - Only errors reach the console
/// * `log_dir` - Directory of the log file; `None` logs to the console only
///
/// # Returns
///
/// The file writer's guard, which must live until the program exits
pub fn init(verbose: u8, quiet: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let console = fmt::layer()
        .with_target(false)
        .with_filter(console_filter(verbose, quiet));

    let mut guard = None;
    let mut failure = None;
    let file = match log_dir.map(|dir| (dir, file_writer(dir))) {
        Some((_, Ok((writer, worker)))) => {
            guard = Some(worker);
            Some(file_layer(writer))
        }
        Some((dir, Err(e))) => {
            failure = Some((dir, e));
            None
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .init();

    if let Some((dir, e)) = failure {
        tracing::warn!("Could not open log file in {}: {}", dir.display(), e);
    }
    guard
}
