use crate::{
    KoeError, KoeResult,
    audio::{ArtifactStore, AudioArtifact, AudioSource, BufferCallback, ErrorCallback},
    instance::{StopToken, WaitOutcome, stop_signal::wait_any},
};

use std::{
    panic::Location,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};

/// Default hard ceiling on a single recording.
pub const MAX_RECORDING_DURATION: Duration = Duration::from_secs(300);

/// Extra time a fixed-duration capture may take beyond its nominal length
/// before it is cut off, covering stream start-up latency.
const FIXED_CAPTURE_GRACE: Duration = Duration::from_secs(2);

/// How a capture decides when to stop.
#[derive(Debug, Clone, Copy)]
pub enum CaptureMode<'a> {
    /// Stream until the token is stopped, bounded by the ceiling.
    UntilStopped(&'a StopToken),
    /// Record exactly `sample_rate × ceiling` samples.
    Fixed,
}

/// Result of a capture that did not fail.
#[derive(Debug, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Non-empty audio was persisted.
    Captured(AudioArtifact),
    /// Nothing was recorded; no file exists.
    Empty,
}

/// Accumulates copies of incoming buffers for one capture call.
#[derive(Debug, Default)]
pub struct CaptureSession {
    samples: Vec<f32>,
    limit: Option<usize>,
    buffers: usize,
}

impl CaptureSession {
    /// Session keeping at most `limit` samples, or everything when `None`.
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            samples: Vec::new(),
            limit,
            buffers: 0,
        }
    }

    /// Appends a copy of `data`. Returns `true` once the limit has been reached.
    pub fn append(&mut self, data: &[f32]) -> bool {
        self.buffers += 1;
        match self.limit {
            Some(limit) => {
                let room = limit.saturating_sub(self.samples.len());
                self.samples.extend_from_slice(&data[..data.len().min(room)]);
                self.samples.len() >= limit
            }
            None => {
                self.samples.extend_from_slice(data);
                false
            }
        }
    }

    /// Number of samples accumulated so far.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Number of driver buffers received.
    pub fn buffer_count(&self) -> usize {
        self.buffers
    }

    /// Concatenated samples.
    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

/// Runs capture sessions against an [`AudioSource`] and persists the result
/// through an [`ArtifactStore`].
pub struct CaptureController {
    source: Box<dyn AudioSource>,
    store: Box<dyn ArtifactStore>,
    ceiling: Duration,
}

impl CaptureController {
    /// Controller with the default [`MAX_RECORDING_DURATION`] ceiling.
    pub fn new(source: Box<dyn AudioSource>, store: Box<dyn ArtifactStore>) -> Self {
        Self {
            source,
            store,
            ceiling: MAX_RECORDING_DURATION,
        }
    }

    /// Overrides the recording ceiling.
    pub fn with_ceiling(mut self, ceiling: Duration) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Hard ceiling on a single recording.
    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    /// Records one session and classifies it.
    ///
    /// Zero samples yield [`CaptureOutcome::Empty`] without touching the store.
    ///
    /// # Errors
    ///
    /// [`KoeError::Audio`] for driver failures at any point, or when the
    /// samples cannot be persisted.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn capture(&self, mode: CaptureMode<'_>) -> KoeResult<CaptureOutcome> {
        let session = match mode {
            CaptureMode::UntilStopped(stop) => self.record(stop, None, self.ceiling)?,
            CaptureMode::Fixed => {
                let target = self.fixed_sample_target();
                let done = StopToken::new();
                self.record(&done, Some(target), self.ceiling + FIXED_CAPTURE_GRACE)?
            }
        };

        if session.sample_count() == 0 {
            info!("Capture produced no samples");
            return Ok(CaptureOutcome::Empty);
        }

        let samples = session.into_samples();
        let artifact = self.store.persist(&samples, self.source.sample_rate())?;

        Ok(CaptureOutcome::Captured(artifact))
    }

    fn fixed_sample_target(&self) -> usize {
        let samples = u128::from(self.source.sample_rate()) * self.ceiling.as_millis() / 1000;
        usize::try_from(samples).unwrap_or(usize::MAX)
    }

    /// Streams into a session until `stop` fires, the limit is reached, or
    /// `ceiling` elapses.
    ///
    /// The callback thread is the only writer while the stream is open and the
    /// session is read only after [`CaptureStream::close`](crate::audio::CaptureStream::close),
    /// so the mutex is never contended.
    #[track_caller]
    fn record(
        &self,
        stop: &StopToken,
        limit: Option<usize>,
        ceiling: Duration,
    ) -> KoeResult<CaptureSession> {
        let caller = Location::caller();

        let session = Arc::new(Mutex::new(CaptureSession::new(limit)));
        let driver_error: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let driver_failed = StopToken::new();

        let on_buffer: BufferCallback = {
            let session = Arc::clone(&session);
            let full = limit.map(|_| stop.clone());
            Box::new(move |data: &[f32]| {
                let reached = lock_recovering(&session).append(data);
                if let (true, Some(full)) = (reached, &full) {
                    full.request_stop();
                }
            })
        };

        let on_error: ErrorCallback = {
            let driver_error = Arc::clone(&driver_error);
            let driver_failed = driver_failed.clone();
            Box::new(move |message: String| {
                lock_recovering(&driver_error).get_or_insert(message);
                driver_failed.request_stop();
            })
        };

        let started = Instant::now();
        let stream = self.source.start(on_buffer, on_error)?;

        info!(ceiling_secs = ceiling.as_secs(), "Recording");
        let waited = wait_any(&[stop, &driver_failed], ceiling);

        stream.close();

        let elapsed = started.elapsed();
        match waited {
            WaitOutcome::Stopped => debug!(elapsed_ms = elapsed.as_millis(), "Capture stopped"),
            WaitOutcome::TimedOut => warn!(
                elapsed_ms = elapsed.as_millis(),
                "Capture hit the recording ceiling"
            ),
        }

        if let Some(message) = lock_recovering(&driver_error).take() {
            return Err(KoeError::Audio {
                message: format!("audio stream failed: {}", message),
                device: self.source.device_name(),
                location: ErrorLocation::from(caller),
            });
        }

        let session = match Arc::try_unwrap(session) {
            Ok(session) => session.into_inner().unwrap_or_else(PoisonError::into_inner),
            Err(shared) => {
                // The backend kept the callback alive past close; nothing writes anymore.
                warn!("Input stream retained its callback after close");
                std::mem::take(&mut *lock_recovering(&shared))
            }
        };

        info!(
            sample_count = session.sample_count(),
            buffer_count = session.buffer_count(),
            "Capture finished"
        );

        Ok(session)
    }
}

fn lock_recovering<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
