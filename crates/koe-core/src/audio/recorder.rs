use crate::{
    KoeResult,
    audio::{AudioArtifact, CaptureController, CaptureMode, CaptureOutcome, CpalSource, WavArtifactStore},
    instance::StopToken,
    pipeline::Recorder,
};

use std::{path::PathBuf, time::Duration};

use tracing::instrument;

/// Microphone and artifact settings for [`MicrophoneRecorder`].
#[derive(Debug, Clone)]
pub struct MicrophoneSettings {
    /// Input device name, `None` for the system default.
    pub selected_device: Option<String>,
    /// Preferred capture rate.
    pub sample_rate: u32,
    /// Preferred channel count. Input is always down-mixed to mono.
    pub channels: u16,
    /// Directory receiving `koe-*.wav` artifacts.
    pub temp_dir: PathBuf,
    /// Hard ceiling on a single recording.
    pub max_duration: Duration,
}

/// [`Recorder`] over the real microphone.
///
/// The device is opened inside [`Recorder::capture`], so invocations that
/// never record never touch the audio subsystem.
pub struct MicrophoneRecorder {
    settings: MicrophoneSettings,
}

impl MicrophoneRecorder {
    /// Recorder for the given settings. Nothing is opened yet.
    pub fn new(settings: MicrophoneSettings) -> Self {
        Self { settings }
    }
}

impl Recorder for MicrophoneRecorder {
    #[track_caller]
    #[instrument(skip(self, stop), fields(device = ?self.settings.selected_device))]
    fn capture(&self, stop: &StopToken) -> KoeResult<CaptureOutcome> {
        let settings = &self.settings;

        let source = CpalSource::new(settings.selected_device.as_deref())?
            .with_preferred_format(settings.sample_rate, settings.channels);
        let store = WavArtifactStore::new(&settings.temp_dir);

        CaptureController::new(Box::new(source), Box::new(store))
            .with_ceiling(settings.max_duration)
            .capture(CaptureMode::UntilStopped(stop))
    }

    fn remove_artifact(&self, artifact: AudioArtifact) {
        artifact.remove();
    }
}
