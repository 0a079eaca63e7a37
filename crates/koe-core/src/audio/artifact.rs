use crate::{KoeError, KoeResult};

use std::{
    fs,
    io::ErrorKind,
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::{debug, info, instrument, warn};

/// Temporary WAV file holding one capture session's audio.
///
/// Removal consumes the artifact, so it happens at most once.
#[derive(Debug, PartialEq, Eq)]
pub struct AudioArtifact {
    path: PathBuf,
}

impl AudioArtifact {
    /// Wraps an existing file.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Location of the audio file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Best-effort delete. A missing file or OS error is logged, never returned.
    pub fn remove(self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(artifact = ?self.path, "Audio artifact removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(artifact = ?self.path, error = %e, "Failed to remove audio artifact"),
        }
    }
}

/// Persists captured samples as an [`AudioArtifact`].
pub trait ArtifactStore {
    /// Writes mono samples to a newly allocated file.
    ///
    /// # Errors
    ///
    /// [`KoeError::Audio`] on failure. No file is left behind in that case.
    fn persist(&self, samples: &[f32], sample_rate: u32) -> KoeResult<AudioArtifact>;
}

/// 16-bit PCM mono WAV files with unique names in a temp directory.
#[derive(Debug, Clone)]
pub struct WavArtifactStore {
    temp_dir: PathBuf,
}

impl WavArtifactStore {
    /// Store writing into `temp_dir`.
    pub fn new<P: Into<PathBuf>>(temp_dir: P) -> Self {
        Self {
            temp_dir: temp_dir.into(),
        }
    }
}

impl ArtifactStore for WavArtifactStore {
    #[track_caller]
    #[instrument(skip(self, samples), fields(sample_count = samples.len()))]
    fn persist(&self, samples: &[f32], sample_rate: u32) -> KoeResult<AudioArtifact> {
        persist_with(&self.temp_dir, samples, sample_rate, write_wav)
    }
}

/// Allocates a unique `koe-*.wav` in `temp_dir` and fills it with `write`.
///
/// If `write` fails the partially written file is deleted before the error
/// is returned.
#[track_caller]
pub(crate) fn persist_with<W>(
    temp_dir: &Path,
    samples: &[f32],
    sample_rate: u32,
    write: W,
) -> KoeResult<AudioArtifact>
where
    W: FnOnce(&Path, &[f32], u32) -> Result<(), hound::Error>,
{
    let caller = Location::caller();

    let temp_path = tempfile::Builder::new()
        .prefix("koe-")
        .suffix(".wav")
        .tempfile_in(temp_dir)
        .map_err(|e| wav_error(format!("wav write failed: {}", e), caller))?
        .into_temp_path();

    if let Err(e) = write(&temp_path, samples, sample_rate) {
        let path = temp_path.to_path_buf();
        if let Err(cleanup) = temp_path.close() {
            warn!(artifact = ?path, error = %cleanup, "Failed to remove partial audio artifact");
        }
        return Err(wav_error(format!("wav write failed: {}", e), caller));
    }

    let path = temp_path
        .keep()
        .map_err(|e| wav_error(format!("wav write failed: {}", e), caller))?;

    info!(artifact = ?path, sample_rate, "Audio artifact written");

    Ok(AudioArtifact { path })
}

fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), hound::Error> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * f32::from(i16::MAX)) as i16)?;
    }
    writer.finalize()
}

fn wav_error(message: String, caller: &'static Location<'static>) -> KoeError {
    KoeError::Audio {
        message,
        device: None,
        location: ErrorLocation::from(caller),
    }
}
