use std::result::Result as StdResult;

use error_location::ErrorLocation;
use thiserror::Error;

/// Faults of the koe binary that sit outside the modeled pipeline failures.
///
/// Either of these ends an invocation as `error_unexpected`.
#[derive(Error, Debug)]
pub enum AppError {
    /// `config.toml` exists but could not be read or parsed.
    #[error("Configuration error: {reason} {location}")]
    ConfigError {
        /// What went wrong, including the offending path when known.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },

    /// The log file or the global subscriber could not be set up.
    #[error("Logging setup failed: {reason} {location}")]
    LoggingError {
        /// What went wrong.
        reason: String,
        /// Location where this error was created.
        location: ErrorLocation,
    },
}

/// Convenience type alias for Results using `AppError`.
pub type Result<T> = StdResult<T, AppError>;
