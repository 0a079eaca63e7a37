use crate::{KoeError, KoeResult};

use std::panic::Location;

use audioadapter_buffers::direct::InterleavedSlice;
use error_location::ErrorLocation;
use rubato::{Fft, FixedSync, Resampler};
use tracing::{debug, instrument};

/// Input frames handed to the FFT resampler per call.
const CHUNK_FRAMES: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// Converts a whole mono recording from `input_rate` to `output_rate`.
///
/// The tail is flushed with silence and the filter delay is dropped from
/// the front, so the result lines up with the input and has exactly
/// `len * output_rate / input_rate` samples.
#[track_caller]
#[instrument(skip(samples), fields(input_len = samples.len()))]
pub(crate) fn resample(samples: &[f32], input_rate: u32, output_rate: u32) -> KoeResult<Vec<f32>> {
    if samples.is_empty() {
        return Ok(Vec::new());
    }

    let caller = Location::caller();
    let failed = |step: &str, reason: String| KoeError::Transcription {
        message: format!("resampling failed: {}: {}", step, reason),
        cuda_available: true,
        location: ErrorLocation::from(caller),
    };

    let mut fft = Fft::<f32>::new(
        input_rate as usize,
        output_rate as usize,
        CHUNK_FRAMES,
        SUB_CHUNKS,
        1,
        FixedSync::Input,
    )
    .map_err(|e| failed("create", e.to_string()))?;

    let expected = (samples.len() as u64 * u64::from(output_rate) / u64::from(input_rate)) as usize;
    let delay = fft.output_delay();
    let wanted = expected + delay;

    let mut input = vec![0.0f32; CHUNK_FRAMES];
    let mut chunk_out = vec![0.0f32; fft.output_frames_max()];
    let mut output = Vec::with_capacity(wanted + chunk_out.len());
    let mut consumed = 0;

    while output.len() < wanted {
        input.fill(0.0);
        if consumed < samples.len() {
            let end = (consumed + CHUNK_FRAMES).min(samples.len());
            input[..end - consumed].copy_from_slice(&samples[consumed..end]);
        }
        consumed += CHUNK_FRAMES;

        let input_adapter = InterleavedSlice::new(&input, 1, CHUNK_FRAMES)
            .map_err(|e| failed("input buffer", e.to_string()))?;
        let out_frames = chunk_out.len();
        let mut output_adapter = InterleavedSlice::new_mut(&mut chunk_out, 1, out_frames)
            .map_err(|e| failed("output buffer", e.to_string()))?;

        let (_, written) = fft
            .process_into_buffer(&input_adapter, &mut output_adapter, None)
            .map_err(|e| failed("process", e.to_string()))?;

        if written == 0 && consumed >= samples.len() {
            break;
        }
        output.extend_from_slice(&chunk_out[..written]);
    }

    output.drain(..delay.min(output.len()));
    output.truncate(expected);

    debug!(input_rate, output_rate, output_len = output.len(), "Resampled audio");

    Ok(output)
}
