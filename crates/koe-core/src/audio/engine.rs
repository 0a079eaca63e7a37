use crate::{KoeError, KoeResult, audio::resampler};

use std::{
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use hound::{SampleFormat, WavReader};
use tracing::{debug, info, instrument, warn};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

/// Sample rate Whisper expects.
pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// Segment texts that carry no speech and are dropped from transcripts.
const NOISE_TOKENS: &[&str] = &[
    "[BLANK_AUDIO]",
    "[blank_audio]",
    "(background noise)",
    "(Background Noise)",
    "(silence)",
    "(Silence)",
    "[MUSIC]",
    "(music)",
    "(Music)",
    "(noise)",
    "(Noise)",
    "(beep)",
    "(Beep)",
    "[beep]",
    "[noise]",
    "[inaudible]",
    "(inaudible)",
    "(Inaudible)",
];

/// Words that, next to "cuda" in a load error, mean the GPU runtime is missing.
const CUDA_UNAVAILABLE_INDICATORS: &[&str] = &["not available", "unavailable", "not found", "driver"];

/// Successful transcription result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcript {
    /// Speech was recognised.
    Text(String),
    /// Nothing but silence or noise markers.
    Empty,
}

/// Model settings for [`WhisperEngine`].
#[derive(Debug, Clone)]
pub struct WhisperSettings {
    /// Path to a ggml Whisper model.
    pub model_path: PathBuf,
    /// Run inference on the GPU backend compiled into whisper-rs.
    pub use_gpu: bool,
    /// Spoken language code, e.g. `"en"`.
    pub language: String,
}

/// Speech-to-text over audio artifacts using whisper.cpp.
///
/// The model is loaded per call; one invocation transcribes one artifact.
pub struct WhisperEngine {
    settings: WhisperSettings,
}

impl WhisperEngine {
    /// Engine for the given settings. Nothing is loaded until [`transcribe`](Self::transcribe).
    pub fn new(settings: WhisperSettings) -> Self {
        Self { settings }
    }

    /// Transcribes a WAV file.
    ///
    /// # Errors
    ///
    /// [`KoeError::Transcription`] if the model cannot be loaded, the audio
    /// cannot be read, or inference fails. `cuda_available` is `false` only
    /// when model loading failed because CUDA is missing.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn transcribe(&self, audio_path: &Path) -> KoeResult<Transcript> {
        let caller = Location::caller();

        let ctx = self.load_model(caller)?;

        let samples = read_wav_mono(audio_path).map_err(|reason| KoeError::Transcription {
            message: format!("inference failed: {}", reason),
            cuda_available: true,
            location: ErrorLocation::from(caller),
        })?;

        let samples = self.to_whisper_rate(samples)?;

        let start = std::time::Instant::now();
        let segments = self.run_inference(&ctx, &samples, caller)?;
        let text = normalize_segments(&segments);

        info!(
            duration_ms = start.elapsed().as_millis(),
            segment_count = segments.len(),
            text_len = text.len(),
            "Transcription complete"
        );

        if text.is_empty() {
            return Ok(Transcript::Empty);
        }
        Ok(Transcript::Text(text))
    }

    fn load_model(&self, caller: &'static Location<'static>) -> KoeResult<WhisperContext> {
        let path = &self.settings.model_path;

        let path_str = path.to_str().ok_or_else(|| KoeError::Transcription {
            message: format!("model load failed: path is not valid UTF-8: {:?}", path),
            cuda_available: true,
            location: ErrorLocation::from(caller),
        })?;

        let mut params = WhisperContextParameters::default();
        params.use_gpu(self.settings.use_gpu);

        let ctx = WhisperContext::new_with_params(path_str, params).map_err(|e| {
            let reason = e.to_string();
            if is_cuda_unavailable(&reason) {
                KoeError::Transcription {
                    message: format!("CUDA not available: {}", reason),
                    cuda_available: false,
                    location: ErrorLocation::from(caller),
                }
            } else {
                KoeError::Transcription {
                    message: format!("model load failed: {}", reason),
                    cuda_available: true,
                    location: ErrorLocation::from(caller),
                }
            }
        })?;

        info!(model_path = ?path, use_gpu = self.settings.use_gpu, "Whisper model loaded");

        Ok(ctx)
    }

    #[track_caller]
    fn to_whisper_rate(&self, samples: (Vec<f32>, u32)) -> KoeResult<Vec<f32>> {
        let (samples, rate) = samples;
        if rate == WHISPER_SAMPLE_RATE {
            return Ok(samples);
        }

        debug!(input_rate = rate, output_rate = WHISPER_SAMPLE_RATE, "Resampling artifact");
        resampler::resample(&samples, rate, WHISPER_SAMPLE_RATE)
    }

    fn run_inference(
        &self,
        ctx: &WhisperContext,
        samples: &[f32],
        caller: &'static Location<'static>,
    ) -> KoeResult<Vec<String>> {
        let inference_failed = |reason: String| KoeError::Transcription {
            message: format!("inference failed: {}", reason),
            cuda_available: true,
            location: ErrorLocation::from(caller),
        };

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        params.set_language(Some(self.settings.language.as_str()));
        params.set_print_progress(false);
        params.set_print_special(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_suppress_blank(true);
        params.set_suppress_nst(true);

        let mut state = ctx
            .create_state()
            .map_err(|e| inference_failed(e.to_string()))?;

        state
            .full(params, samples)
            .map_err(|e| inference_failed(e.to_string()))?;

        let num_segments = state.full_n_segments();
        let mut segments = Vec::with_capacity(num_segments.max(0) as usize);

        for i in 0..num_segments {
            let segment = state
                .get_segment(i)
                .ok_or_else(|| inference_failed(format!("failed to get segment {}", i)))?;
            segments.push(segment.to_string());
        }

        Ok(segments)
    }
}

/// Trims segments, drops blanks and noise markers, joins the rest with spaces.
pub(crate) fn normalize_segments<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty() && !NOISE_TOKENS.contains(s))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a model-load error means the CUDA runtime is unavailable.
pub(crate) fn is_cuda_unavailable(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("cuda")
        && CUDA_UNAVAILABLE_INDICATORS
            .iter()
            .any(|indicator| message.contains(indicator))
}

/// Reads a WAV file as mono `f32` samples plus its sample rate.
fn read_wav_mono(path: &Path) -> Result<(Vec<f32>, u32), String> {
    let mut reader =
        WavReader::open(path).map_err(|e| format!("could not read {:?}: {}", path, e))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| e.to_string())?,
        SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| e.to_string())?
        }
    };

    if channels == 1 {
        return Ok((interleaved, spec.sample_rate));
    }

    warn!(channels, "Down-mixing multi-channel artifact");
    let mono = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();
    Ok((mono, spec.sample_rate))
}
