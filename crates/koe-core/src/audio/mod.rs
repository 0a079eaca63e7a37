pub(crate) mod artifact;
pub(crate) mod capture;
pub(crate) mod engine;
mod recorder;
pub(crate) mod resampler;
mod source;

pub use {
    artifact::{ArtifactStore, AudioArtifact, WavArtifactStore},
    capture::{
        CaptureController, CaptureMode, CaptureOutcome, CaptureSession, MAX_RECORDING_DURATION,
    },
    engine::{Transcript, WHISPER_SAMPLE_RATE, WhisperEngine, WhisperSettings},
    recorder::{MicrophoneRecorder, MicrophoneSettings},
    source::{AudioSource, BufferCallback, CaptureStream, CpalSource, ErrorCallback},
};
