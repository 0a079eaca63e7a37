use crate::{
    KoeError,
    audio::{AudioArtifact, CaptureOutcome, Transcript},
    instance::{HotkeyAction, LockHandle},
    pipeline::{
        DependencyPreflight, FocusProbe, InstanceControl, NotificationKind, Notifier,
        PipelineOutcome, Recorder, TextInserter, TranscriptLog, TranscriptionEngine, UsageLogger,
    },
};

use std::{
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    time::{Instant, SystemTime},
};

use tracing::{debug, error, info, instrument, warn};

/// The collaborators of one invocation, sequenced by [`Pipeline::run`].
pub struct Pipeline<'a> {
    /// External tool and settings checks.
    pub preflight: &'a dyn DependencyPreflight,
    /// Toggle, lock and stop handler.
    pub instance: &'a dyn InstanceControl,
    /// Display context and focused window.
    pub focus: &'a dyn FocusProbe,
    /// Capture and artifact removal.
    pub recorder: &'a dyn Recorder,
    /// Speech-to-text.
    pub engine: &'a dyn TranscriptionEngine,
    /// Transcript history.
    pub transcripts: &'a dyn TranscriptLog,
    /// Text insertion into the focused window.
    pub inserter: &'a dyn TextInserter,
    /// User notifications.
    pub notifier: &'a dyn Notifier,
}

impl Pipeline<'_> {
    /// Runs one invocation to a single outcome.
    ///
    /// Stages run in a fixed order and the first failure ends the run. Once
    /// the lock is held it is released on every path, and an artifact that
    /// was produced is removed before the lock goes.
    #[instrument(skip(self))]
    pub fn run(&self) -> PipelineOutcome {
        if let Err(e) = self.preflight.check() {
            return self.fail(NotificationKind::ErrorDependency, &e, PipelineOutcome::ErrorDependency);
        }

        let (action, owner) = self.instance.determine_action();
        if let (HotkeyAction::Stop, Some(pid)) = (action, owner) {
            let delivered = self.instance.signal_running_instance(pid);
            info!(%pid, delivered, "Asked the recording instance to stop");
            return PipelineOutcome::SignaledStop;
        }

        let handle = match self.instance.acquire() {
            Ok(handle) => handle,
            Err(e) => {
                return self.fail(NotificationKind::AlreadyRunning, &e, PipelineOutcome::AlreadyRunning);
            }
        };
        let _lock = LockScope::new(self.instance, handle);

        self.record_and_insert()
    }

    fn record_and_insert(&self) -> PipelineOutcome {
        let stop = match self.instance.install_stop_handler() {
            Ok(stop) => stop,
            Err(e) => {
                error!(error = %e, "Failed to install stop handler");
                return PipelineOutcome::ErrorUnexpected;
            }
        };

        if let Err(e) = self.focus.check_display_context() {
            return self.fail(NotificationKind::ErrorDependency, &e, PipelineOutcome::ErrorDependency);
        }

        match self.focus.focused_window() {
            Ok(window) => debug!(window_id = window.id, title = %window.title, "Focused window"),
            Err(e) => return self.fail(NotificationKind::ErrorFocus, &e, PipelineOutcome::NoFocus),
        }

        self.notifier.notify(NotificationKind::RecordingStarted, None);

        let artifact = match self.recorder.capture(&stop) {
            Ok(CaptureOutcome::Captured(artifact)) => artifact,
            Ok(CaptureOutcome::Empty) => {
                info!("Nothing recorded");
                self.notifier.notify(NotificationKind::NoSpeech, None);
                return PipelineOutcome::NoSpeech;
            }
            Err(e) => return self.fail(NotificationKind::ErrorAudio, &e, PipelineOutcome::ErrorAudio),
        };
        let artifact = ArtifactScope::new(self.recorder, artifact);

        self.transcribe_and_insert(artifact.path())
    }

    fn transcribe_and_insert(&self, audio: &Path) -> PipelineOutcome {
        self.notifier.notify(NotificationKind::Processing, None);

        let text = match self.engine.transcribe(audio) {
            Ok(Transcript::Text(text)) => text,
            Ok(Transcript::Empty) => {
                info!("Transcript was empty");
                self.notifier.notify(NotificationKind::NoSpeech, None);
                return PipelineOutcome::NoSpeech;
            }
            Err(e) => {
                return self.fail(
                    NotificationKind::ErrorTranscription,
                    &e,
                    PipelineOutcome::ErrorTranscription,
                );
            }
        };

        self.transcripts.record(&text);

        if let Err(e) = self.inserter.insert(&text) {
            return self.fail(NotificationKind::ErrorInsertion, &e, PipelineOutcome::ErrorInsertion);
        }

        self.notifier.notify(NotificationKind::Completed, None);
        info!(text_len = text.len(), "Transcript inserted");
        PipelineOutcome::Success
    }

    fn fail(
        &self,
        kind: NotificationKind,
        err: &KoeError,
        outcome: PipelineOutcome,
    ) -> PipelineOutcome {
        warn!(category = ?err.category(), %outcome, "{}", err);
        self.notifier.notify(kind, Some(err));
        outcome
    }
}

/// Runs one invocation, timing it and recording its outcome.
///
/// A panic anywhere in the pipeline unwinds through the scoped releases and
/// is reported as [`PipelineOutcome::ErrorUnexpected`].
pub fn run_invocation(pipeline: &Pipeline<'_>, usage: &dyn UsageLogger) -> PipelineOutcome {
    let invoked_at = SystemTime::now();
    let started = Instant::now();

    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| pipeline.run())) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(reason = %reason, "Pipeline panicked");
            PipelineOutcome::ErrorUnexpected
        }
    };

    let duration = started.elapsed();
    info!(%outcome, duration_ms = duration.as_millis(), "Invocation finished");
    usage.record(outcome, invoked_at, duration);

    outcome
}

/// Releases the instance lock when dropped.
struct LockScope<'a> {
    instance: &'a dyn InstanceControl,
    handle: Option<LockHandle>,
}

impl<'a> LockScope<'a> {
    fn new(instance: &'a dyn InstanceControl, handle: LockHandle) -> Self {
        Self {
            instance,
            handle: Some(handle),
        }
    }
}

impl Drop for LockScope<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.instance.release(handle);
        }
    }
}

/// Removes the audio artifact when dropped.
struct ArtifactScope<'a> {
    recorder: &'a dyn Recorder,
    path: PathBuf,
    artifact: Option<AudioArtifact>,
}

impl<'a> ArtifactScope<'a> {
    fn new(recorder: &'a dyn Recorder, artifact: AudioArtifact) -> Self {
        Self {
            recorder,
            path: artifact.path().to_path_buf(),
            artifact: Some(artifact),
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ArtifactScope<'_> {
    fn drop(&mut self) {
        if let Some(artifact) = self.artifact.take() {
            self.recorder.remove_artifact(artifact);
        }
    }
}
