//! Seams between the orchestrator and the components it sequences.
//!
//! Every collaborator is a trait so the orchestrator can be driven by real
//! desktop integrations in the binary and by scripted fakes in tests.

use crate::{
    KoeError, KoeResult,
    audio::{AudioArtifact, CaptureOutcome, Transcript, WhisperEngine},
    instance::{
        HotkeyAction, InstanceGuard, LockHandle, ProcessId, StopToken, determine_action,
        install_stop_handler, signal_running_instance,
    },
    pipeline::{NotificationKind, PipelineOutcome},
};

use std::{
    io,
    path::Path,
    time::{Duration, SystemTime},
};

/// Window that will receive the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusedWindow {
    /// Backend-specific window id.
    pub id: u64,
    /// Window title, empty when unavailable.
    pub title: String,
}

/// Verifies external tools and settings before any shared state is touched.
pub trait DependencyPreflight {
    /// # Errors
    ///
    /// [`KoeError::Dependency`] naming the first missing tool or bad setting.
    fn check(&self) -> KoeResult<()>;
}

/// Toggle decision, stop notification, and the instance lock.
pub trait InstanceControl {
    /// Start-vs-stop for this invocation, with the owner PID for `Stop`.
    fn determine_action(&self) -> (HotkeyAction, Option<ProcessId>);

    /// Tells a recording owner to stop. `false` when not delivered.
    fn signal_running_instance(&self, pid: ProcessId) -> bool;

    /// # Errors
    ///
    /// [`KoeError::AlreadyRunning`] on contention or acquisition failure.
    fn acquire(&self) -> KoeResult<LockHandle>;

    /// Releases the lock. Never fails.
    fn release(&self, handle: LockHandle);

    /// Starts listening for stop notifications.
    fn install_stop_handler(&self) -> io::Result<StopToken>;
}

/// Display session and focus checks.
pub trait FocusProbe {
    /// # Errors
    ///
    /// [`KoeError::Dependency`] when there is no usable display session.
    fn check_display_context(&self) -> KoeResult<()>;

    /// # Errors
    ///
    /// [`KoeError::Focus`] when no window has focus.
    fn focused_window(&self) -> KoeResult<FocusedWindow>;
}

/// Audio capture and artifact disposal.
pub trait Recorder {
    /// Records until `stop` fires or the recording ceiling elapses.
    ///
    /// # Errors
    ///
    /// [`KoeError::Audio`] on driver or persistence failure.
    fn capture(&self, stop: &StopToken) -> KoeResult<CaptureOutcome>;

    /// Deletes an artifact. Never fails.
    fn remove_artifact(&self, artifact: AudioArtifact);
}

/// Speech-to-text.
pub trait TranscriptionEngine {
    /// # Errors
    ///
    /// [`KoeError::Transcription`] when the engine fails.
    fn transcribe(&self, audio: &Path) -> KoeResult<Transcript>;
}

/// Append-only record of successful transcripts. Never fails.
pub trait TranscriptLog {
    /// Records one transcript.
    fn record(&self, text: &str);
}

/// Puts text into the focused application.
pub trait TextInserter {
    /// # Errors
    ///
    /// [`KoeError::Insertion`] carrying the transcript.
    fn insert(&self, text: &str) -> KoeResult<()>;
}

/// Fire-and-forget user notifications.
pub trait Notifier {
    /// Announces an event. Failures stay inside the implementation.
    fn notify(&self, kind: NotificationKind, error: Option<&KoeError>);
}

/// Append-only per-invocation usage records. Never fails.
pub trait UsageLogger {
    /// Records how an invocation ended.
    fn record(&self, outcome: PipelineOutcome, invoked_at: SystemTime, duration: Duration);
}

impl InstanceControl for InstanceGuard {
    fn determine_action(&self) -> (HotkeyAction, Option<ProcessId>) {
        determine_action(self.lock_file())
    }

    fn signal_running_instance(&self, pid: ProcessId) -> bool {
        signal_running_instance(pid)
    }

    #[track_caller]
    fn acquire(&self) -> KoeResult<LockHandle> {
        InstanceGuard::acquire(self)
    }

    fn release(&self, mut handle: LockHandle) {
        InstanceGuard::release(self, &mut handle);
    }

    fn install_stop_handler(&self) -> io::Result<StopToken> {
        install_stop_handler()
    }
}

impl TranscriptionEngine for WhisperEngine {
    #[track_caller]
    fn transcribe(&self, audio: &Path) -> KoeResult<Transcript> {
        WhisperEngine::transcribe(self, audio)
    }
}
