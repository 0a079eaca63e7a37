use std::fmt;

use serde::Serialize;

/// How one invocation ended. Exactly one per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineOutcome {
    /// Transcript inserted.
    Success,
    /// Another instance was recording and has been told to stop.
    SignaledStop,
    /// No focused window to insert into.
    NoFocus,
    /// Capture or transcription produced nothing.
    NoSpeech,
    /// Another instance holds the lock, or the lock could not be taken.
    AlreadyRunning,
    /// Preflight or display context check failed.
    ErrorDependency,
    /// Capture failed.
    ErrorAudio,
    /// Transcription failed.
    ErrorTranscription,
    /// Insertion failed.
    ErrorInsertion,
    /// A fault outside the modeled failures.
    ErrorUnexpected,
}

impl PipelineOutcome {
    /// Every outcome, in declaration order.
    pub const ALL: [PipelineOutcome; 10] = [
        PipelineOutcome::Success,
        PipelineOutcome::SignaledStop,
        PipelineOutcome::NoFocus,
        PipelineOutcome::NoSpeech,
        PipelineOutcome::AlreadyRunning,
        PipelineOutcome::ErrorDependency,
        PipelineOutcome::ErrorAudio,
        PipelineOutcome::ErrorTranscription,
        PipelineOutcome::ErrorInsertion,
        PipelineOutcome::ErrorUnexpected,
    ];

    /// Process exit code: 0 handled, 1 modeled failure, 2 unexpected.
    pub fn exit_code(self) -> i32 {
        match self {
            PipelineOutcome::Success | PipelineOutcome::SignaledStop => 0,
            PipelineOutcome::NoFocus
            | PipelineOutcome::NoSpeech
            | PipelineOutcome::AlreadyRunning
            | PipelineOutcome::ErrorDependency
            | PipelineOutcome::ErrorAudio
            | PipelineOutcome::ErrorTranscription
            | PipelineOutcome::ErrorInsertion => 1,
            PipelineOutcome::ErrorUnexpected => 2,
        }
    }

    /// Snake-case name as written to the usage log.
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineOutcome::Success => "success",
            PipelineOutcome::SignaledStop => "signaled_stop",
            PipelineOutcome::NoFocus => "no_focus",
            PipelineOutcome::NoSpeech => "no_speech",
            PipelineOutcome::AlreadyRunning => "already_running",
            PipelineOutcome::ErrorDependency => "error_dependency",
            PipelineOutcome::ErrorAudio => "error_audio",
            PipelineOutcome::ErrorTranscription => "error_transcription",
            PipelineOutcome::ErrorInsertion => "error_insertion",
            PipelineOutcome::ErrorUnexpected => "error_unexpected",
        }
    }
}

impl fmt::Display for PipelineOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-facing events the pipeline announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Microphone is live.
    RecordingStarted,
    /// Capture finished, transcription running.
    Processing,
    /// Transcript inserted.
    Completed,
    /// Nothing was said.
    NoSpeech,
    /// No focused window.
    ErrorFocus,
    /// Capture failed.
    ErrorAudio,
    /// Transcription failed.
    ErrorTranscription,
    /// Insertion failed.
    ErrorInsertion,
    /// A dependency is missing.
    ErrorDependency,
    /// Lock contention or lock failure.
    AlreadyRunning,
}

impl NotificationKind {
    /// Snake-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::RecordingStarted => "recording_started",
            NotificationKind::Processing => "processing",
            NotificationKind::Completed => "completed",
            NotificationKind::NoSpeech => "no_speech",
            NotificationKind::ErrorFocus => "error_focus",
            NotificationKind::ErrorAudio => "error_audio",
            NotificationKind::ErrorTranscription => "error_transcription",
            NotificationKind::ErrorInsertion => "error_insertion",
            NotificationKind::ErrorDependency => "error_dependency",
            NotificationKind::AlreadyRunning => "already_running",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
