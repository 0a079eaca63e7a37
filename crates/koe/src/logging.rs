use crate::{AppError, AppResult};

use std::{panic::Location, path::Path};

use error_location::ErrorLocation;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "koe=info,koe_core=info";

/// Installs the global subscriber writing to a daily log file in `log_dir`.
///
/// The returned guard flushes buffered lines when dropped and must outlive
/// the invocation. `RUST_LOG` overrides the default filter.
#[track_caller]
pub(crate) fn init(log_dir: &Path) -> AppResult<WorkerGuard> {
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("koe")
        .filename_suffix("log")
        .build(log_dir)
        .map_err(|e| AppError::LoggingError {
            reason: format!("Failed to open log directory {:?}: {}", log_dir, e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .map_err(|e| AppError::LoggingError {
            reason: format!("Failed to install subscriber: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    Ok(guard)
}
