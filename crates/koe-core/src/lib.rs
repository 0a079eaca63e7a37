//! Koe Core Library
//!
//! Push-to-talk dictation pipeline: a single-owner instance lock with a
//! start/stop toggle, cancellable microphone capture via CPAL, Whisper
//! transcription, and an orchestrator that sequences the stages with
//! guaranteed cleanup.
//!
//! # Example
//!
//! ```no_run
//! use koe_core::{
//!     CaptureController, CaptureMode, CaptureOutcome, CpalSource, KoeResult, StopToken,
//!     WavArtifactStore,
//! };
//!
//! use std::{thread, time::Duration};
//!
//! fn main() -> KoeResult<()> {
//!     let source = CpalSource::new(None)?;
//!     let store = WavArtifactStore::new(std::env::temp_dir());
//!     let controller = CaptureController::new(Box::new(source), Box::new(store));
//!
//!     let stop = StopToken::new();
//!     let remote = stop.clone();
//!     thread::spawn(move || {
//!         thread::sleep(Duration::from_secs(3));
//!         remote.request_stop();
//!     });
//!
//!     if let CaptureOutcome::Captured(artifact) = controller.capture(CaptureMode::UntilStopped(&stop))? {
//!         println!("Recorded to {}", artifact.path().display());
//!         artifact.remove();
//!     }
//!     Ok(())
//! }
//! ```

mod audio;
mod error;
mod instance;
mod pipeline;

pub use {
    audio::{
        ArtifactStore, AudioArtifact, AudioSource, BufferCallback, CaptureController, CaptureMode,
        CaptureOutcome, CaptureSession, CaptureStream, CpalSource, ErrorCallback,
        MAX_RECORDING_DURATION, MicrophoneRecorder, MicrophoneSettings, Transcript,
        WHISPER_SAMPLE_RATE, WavArtifactStore, WhisperEngine, WhisperSettings,
    },
    error::{ErrorCategory, KoeError, Result as KoeResult},
    instance::{
        HotkeyAction, InstanceGuard, LockHandle, ProcessId, STOP_SIGNAL, StopToken, WaitOutcome,
        determine_action, install_stop_handler, is_process_alive, signal_running_instance,
    },
    pipeline::{
        DependencyPreflight, FocusProbe, FocusedWindow, InstanceControl, NotificationKind,
        Notifier, Pipeline, PipelineOutcome, Recorder, TextInserter, TranscriptLog,
        TranscriptionEngine, UsageLogger, run_invocation,
    },
};
