//! Logging setup: console output plus an optional daily rolling file.
//!
//! - Local timezone timestamps
//! - `RUST_LOG` honored unless a filter is forced by the command line
//! - Log file retention cleanup (deletes logs older than 7 days)

use std::path::Path;

use chrono::{Local, NaiveDate, Utc};
use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::{Error, Result, utils::fs};

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "bili_archiver=info,platforms_parser=info";

/// Log retention period in days.
const LOG_RETENTION_DAYS: i64 = 7;

/// Rolling file name prefix; files are named `bili-archiver.log.YYYY-MM-DD`.
const LOG_FILE_PREFIX: &str = "bili-archiver.log";

/// Custom timer that uses the local timezone via chrono.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoggingOptions<'a> {
    pub verbose: bool,
    pub quiet: bool,
    /// Filter from configuration, used when neither flag nor `RUST_LOG` is set.
    pub filter: Option<&'a str>,
    pub log_dir: Option<&'a Path>,
}

fn build_filter(options: &LoggingOptions<'_>) -> Result<EnvFilter> {
    if options.quiet {
        return Ok(EnvFilter::new("error"));
    }
    if options.verbose {
        return Ok(EnvFilter::new(
            "bili_archiver=debug,platforms_parser=debug,info",
        ));
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directive = options.filter.unwrap_or(DEFAULT_LOG_FILTER);
    EnvFilter::try_new(directive)
        .map_err(|e| Error::config(format!("Invalid log filter directive '{directive}': {e}")))
}

/// Install the global subscriber.
///
/// The returned guard must be held until exit so buffered file output is flushed.
pub fn init_logging(options: LoggingOptions<'_>) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(&options)?;

    let console = fmt::layer()
        .with_timer(LocalTimer)
        .with_target(options.verbose)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match options.log_dir {
        Some(dir) => {
            fs::ensure_dir_all_sync(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_timer(LocalTimer)
                .with_ansi(false)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Other(format!("Failed to install log subscriber: {e}")))?;

    if let Some(dir) = options.log_dir {
        match cleanup_old_logs(dir, LOG_RETENTION_DAYS) {
            Ok(0) => {}
            Ok(deleted) => debug!(deleted, "Removed old log files"),
            Err(e) => warn!(error = %e, "Failed to cleanup old logs"),
        }
    }

    Ok(guard)
}

/// Delete rolled log files older than `retention_days`. Returns how many were removed.
pub fn cleanup_old_logs(log_dir: &Path, retention_days: i64) -> std::io::Result<usize> {
    let cutoff = (Utc::now() - chrono::Duration::days(retention_days)).date_naive();
    let mut deleted = 0;

    for entry in std::fs::read_dir(log_dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let Some(date) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(LOG_FILE_PREFIX))
            .and_then(|n| n.strip_prefix('.'))
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        else {
            continue;
        };

        if date < cutoff {
            std::fs::remove_file(&path)?;
            deleted += 1;
        }
    }

    Ok(deleted)
}
