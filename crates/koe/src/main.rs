//! Koe: push-to-talk dictation for Linux desktops.
//!
//! Bound to a single hotkey. The first press starts recording; the second
//! press signals the running invocation to stop, which then transcribes the
//! recording and pastes the text into the focused window.

mod backend;
mod config;
mod error;
mod focus;
mod history;
mod inserter;
mod logging;
mod notifier;
mod paste_key_guard;
mod preflight;
mod tool;

pub(crate) use {
    backend::Backend,
    error::{AppError, Result as AppResult},
    focus::DesktopFocus,
    history::{TranscriptHistory, UsageHistory},
    inserter::ClipboardInserter,
    notifier::DesktopNotifier,
    paste_key_guard::PasteKeyGuard,
    preflight::Preflight,
};

use crate::config::Config;

use std::time::{Duration, SystemTime};

use koe_core::{
    InstanceGuard, MicrophoneRecorder, Pipeline, PipelineOutcome, UsageLogger, WhisperEngine,
    run_invocation,
};
use tracing::info;

/// Application entry point.
fn main() {
    std::process::exit(run().exit_code());
}

fn run() -> PipelineOutcome {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("koe: {}", e);
            return PipelineOutcome::ErrorUnexpected;
        }
    };

    // Not fatal: the log init below fails on its own if the dir is missing.
    let log_dir = config.paths.log_dir();
    if let Err(e) = history::ensure_data_dir(&log_dir) {
        eprintln!("koe: failed to create data directory {}: {}", log_dir.display(), e);
    }
    let usage = UsageHistory::new(config.paths.usage_log());

    // Held until exit so buffered log lines are flushed.
    let _log_guard = match logging::init(&log_dir) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("koe: {}", e);
            usage.record(PipelineOutcome::ErrorUnexpected, SystemTime::now(), Duration::ZERO);
            return PipelineOutcome::ErrorUnexpected;
        }
    };

    let backend = Backend::detect();
    info!(%backend, version = env!("CARGO_PKG_VERSION"), "Koe invoked");

    let preflight = Preflight::new(backend, &config);
    let instance = InstanceGuard::new(config.paths.lock_file.clone());
    let focus = DesktopFocus::new(backend);
    let recorder = MicrophoneRecorder::new(config.microphone_settings());
    let engine = WhisperEngine::new(config.whisper_settings());
    let transcripts = TranscriptHistory::new(config.paths.transcription_log());
    let inserter = ClipboardInserter::new(backend, config.paste.clone());
    let notifier = DesktopNotifier;

    let pipeline = Pipeline {
        preflight: &preflight,
        instance: &instance,
        focus: &focus,
        recorder: &recorder,
        engine: &engine,
        transcripts: &transcripts,
        inserter: &inserter,
        notifier: &notifier,
    };

    run_invocation(&pipeline, &usage)
}
