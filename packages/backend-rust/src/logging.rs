use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogSettings, DEFAULT_LOG_LEVEL};

const LOG_FILE_PREFIX: &str = "nsm";
const LOG_FILE_SUFFIX: &str = "log";

/// Flushes buffered file logs on drop. Hold it for the whole process.
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Installs the global subscriber. Console output goes to stderr because
/// stdout carries the command's JSON result. A second call leaves the first
/// subscriber in place.
pub fn init_tracing(settings: &LogSettings) -> LoggingGuard {
    let (filter, rejected) = env_filter(&settings.level);
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    let (file_layer, file_guard) = match settings.file_dir.as_deref() {
        Some(dir) => match file_writer(dir, settings.max_files) {
            Ok((writer, guard)) => {
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true);
                (Some(layer), Some(guard))
            }
            Err(reason) => {
                eprintln!("file logging disabled: {reason}");
                (None, None)
            }
        },
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    if installed {
        if let Some(directives) = rejected {
            tracing::warn!(%directives, fallback = DEFAULT_LOG_LEVEL, "ignoring invalid log filter");
        }
        if let Some(dir) = &settings.file_dir {
            tracing::debug!(dir = %dir.display(), max_files = settings.max_files, "file logging enabled");
        }
    }

    LoggingGuard { _file: file_guard }
}

/// Parses `directives`, falling back to the default filter. The rejected
/// input is returned so it can be reported once a subscriber exists.
fn env_filter(directives: &str) -> (EnvFilter, Option<String>) {
    match EnvFilter::try_new(directives) {
        Ok(filter) => (filter, None),
        Err(_) => (EnvFilter::new(DEFAULT_LOG_LEVEL), Some(directives.to_string())),
    }
}

fn file_writer(dir: &Path, max_files: usize) -> Result<(NonBlocking, WorkerGuard), String> {
    std::fs::create_dir_all(dir)
        .map_err(|err| format!("failed to create log directory {}: {err}", dir.display()))?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(max_files)
        .build(dir)
        .map_err(|err| format!("failed to open log file in {}: {err}", dir.display()))?;
    Ok(tracing_appender::non_blocking(appender))
}
