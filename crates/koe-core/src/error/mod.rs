use std::path::PathBuf;

use error_location::ErrorLocation;
use serde::Serialize;
use thiserror::Error;

/// Failure categories shared by every pipeline stage, with source location tracking.
///
/// Each variant carries the human-readable message shown to the user plus the
/// category-specific fields the notifier and logs need.
#[derive(Error, Debug)]
pub enum KoeError {
    /// A required external tool or device configuration is unavailable.
    #[error("Dependency error: {message} {location}")]
    Dependency {
        /// Human-readable description.
        message: String,
        /// Name of the missing tool or offending setting.
        missing_tool: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The instance lock could not be taken.
    ///
    /// `conflicting_pid` is `Some` for genuine contention with a live owner
    /// and `None` when acquisition failed for an OS-level reason.
    #[error("Already running: {message} {location}")]
    AlreadyRunning {
        /// Human-readable description.
        message: String,
        /// Lock file that could not be acquired.
        lock_file: PathBuf,
        /// PID of the live owner, if one was identified.
        conflicting_pid: Option<u32>,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No focused window context is available.
    #[error("Focus error: {message} {location}")]
    Focus {
        /// Human-readable description.
        message: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio capture or artifact persistence failed.
    #[error("Audio error: {message} {location}")]
    Audio {
        /// Human-readable description.
        message: String,
        /// Input device involved, when it could be identified.
        device: Option<String>,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The speech-to-text engine failed.
    #[error("Transcription failed: {message} {location}")]
    Transcription {
        /// Human-readable description.
        message: String,
        /// Whether CUDA appeared usable when the failure happened.
        cuda_available: bool,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Inserting the transcript into the focused application failed.
    #[error("Insertion failed: {message} {location}")]
    Insertion {
        /// Human-readable description.
        message: String,
        /// Transcript that could not be inserted.
        transcript_text: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Taxonomy tag of a [`KoeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// See [`KoeError::Dependency`].
    Dependency,
    /// See [`KoeError::AlreadyRunning`].
    AlreadyRunning,
    /// See [`KoeError::Focus`].
    Focus,
    /// See [`KoeError::Audio`].
    Audio,
    /// See [`KoeError::Transcription`].
    Transcription,
    /// See [`KoeError::Insertion`].
    Insertion,
}

impl KoeError {
    /// Returns the taxonomy tag for this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            KoeError::Dependency { .. } => ErrorCategory::Dependency,
            KoeError::AlreadyRunning { .. } => ErrorCategory::AlreadyRunning,
            KoeError::Focus { .. } => ErrorCategory::Focus,
            KoeError::Audio { .. } => ErrorCategory::Audio,
            KoeError::Transcription { .. } => ErrorCategory::Transcription,
            KoeError::Insertion { .. } => ErrorCategory::Insertion,
        }
    }

    /// Message without the source location suffix, suitable for notifications.
    pub fn message(&self) -> &str {
        match self {
            KoeError::Dependency { message, .. }
            | KoeError::AlreadyRunning { message, .. }
            | KoeError::Focus { message, .. }
            | KoeError::Audio { message, .. }
            | KoeError::Transcription { message, .. }
            | KoeError::Insertion { message, .. } => message,
        }
    }
}

/// Result type alias using [`KoeError`].
pub type Result<T> = std::result::Result<T, KoeError>;
