use crate::{
    ArtifactStore, AudioArtifact, AudioSource, BufferCallback, CaptureController, CaptureMode,
    CaptureOutcome, CaptureSession, CaptureStream, ErrorCallback, KoeError, KoeResult, StopToken,
    WavArtifactStore,
};

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use hound::WavReader;
use tempfile::TempDir;

// Test constants
const FAKE_SAMPLE_RATE: u32 = 1_000;
const FAKE_BUFFER_LEN: usize = 50;
const FAKE_BUFFER_INTERVAL: Duration = Duration::from_millis(5);
const STOP_DELAY: Duration = Duration::from_millis(100);
const FAKE_DEVICE: &str = "fake mic";

/// Audio source that feeds constant buffers from a worker thread until closed.
struct FakeSource {
    max_buffers: Option<usize>,
    driver_error: Option<&'static str>,
}

impl FakeSource {
    fn streaming() -> Self {
        Self {
            max_buffers: None,
            driver_error: None,
        }
    }

    fn silent() -> Self {
        Self {
            max_buffers: Some(0),
            driver_error: None,
        }
    }

    fn failing(message: &'static str) -> Self {
        Self {
            max_buffers: Some(1),
            driver_error: Some(message),
        }
    }
}

struct FakeStream {
    running: Arc<AtomicBool>,
    worker: JoinHandle<()>,
}

impl CaptureStream for FakeStream {
    fn close(self: Box<Self>) {
        let this = *self;
        this.running.store(false, Ordering::SeqCst);
        this.worker.join().unwrap();
    }
}

impl AudioSource for FakeSource {
    fn start(
        &self,
        mut on_buffer: BufferCallback,
        mut on_error: ErrorCallback,
    ) -> KoeResult<Box<dyn CaptureStream>> {
        let running = Arc::new(AtomicBool::new(true));
        let max_buffers = self.max_buffers;
        let driver_error = self.driver_error;

        let worker = {
            let running = Arc::clone(&running);
            thread::spawn(move || {
                let buffer = vec![0.25f32; FAKE_BUFFER_LEN];
                let mut sent = 0;
                while running.load(Ordering::SeqCst) {
                    if max_buffers.is_none_or(|max| sent < max) {
                        on_buffer(&buffer);
                        sent += 1;
                        if let Some(message) = driver_error {
                            on_error(message.to_string());
                        }
                    }
                    thread::sleep(FAKE_BUFFER_INTERVAL);
                }
            })
        };

        Ok(Box::new(FakeStream { running, worker }))
    }

    fn sample_rate(&self) -> u32 {
        FAKE_SAMPLE_RATE
    }

    fn device_name(&self) -> Option<String> {
        Some(FAKE_DEVICE.to_string())
    }
}

/// Store wrapper counting persist calls.
struct CountingStore {
    inner: WavArtifactStore,
    calls: Arc<AtomicUsize>,
}

impl ArtifactStore for CountingStore {
    fn persist(&self, samples: &[f32], sample_rate: u32) -> KoeResult<AudioArtifact> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.persist(samples, sample_rate)
    }
}

fn controller(source: FakeSource, dir: &TempDir) -> (CaptureController, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = CountingStore {
        inner: WavArtifactStore::new(dir.path()),
        calls: Arc::clone(&calls),
    };
    (
        CaptureController::new(Box::new(source), Box::new(store)),
        calls,
    )
}

fn stop_after(token: &StopToken, delay: Duration) -> JoinHandle<()> {
    let remote = token.clone();
    thread::spawn(move || {
        thread::sleep(delay);
        remote.request_stop();
    })
}

fn dir_entries(dir: &TempDir) -> usize {
    std::fs::read_dir(dir.path()).unwrap().count()
}

/// WHAT: A stopped capture with audio persists one WAV artifact
/// WHY: The transcription stage consumes exactly that file
#[test]
fn given_streaming_source_when_stopped_then_artifact_written() {
    // Given: A source producing buffers and a stop shortly after start
    let dir = TempDir::new().unwrap();
    let (controller, calls) = controller(FakeSource::streaming(), &dir);
    let stop = StopToken::new();
    let stopper = stop_after(&stop, STOP_DELAY);

    // When: Capturing until stopped
    let outcome = controller.capture(CaptureMode::UntilStopped(&stop)).unwrap();
    stopper.join().unwrap();

    // Then: One artifact, readable at the source rate, inside the temp dir
    let CaptureOutcome::Captured(artifact) = outcome else {
        panic!("expected a captured artifact");
    };
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(artifact.path().starts_with(dir.path()));
    let reader = WavReader::open(artifact.path()).unwrap();
    assert_eq!(reader.spec().sample_rate, FAKE_SAMPLE_RATE);
    assert_eq!(reader.spec().channels, 1);
    assert!(reader.len() > 0);

    artifact.remove();
    assert_eq!(dir_entries(&dir), 0);
}

/// WHAT: Zero samples yield Empty and the store is never called
/// WHY: No file may exist for an empty recording
#[test]
fn given_silent_source_when_stopped_then_empty_without_persisting() {
    // Given: A source that delivers no buffers
    let dir = TempDir::new().unwrap();
    let (controller, calls) = controller(FakeSource::silent(), &dir);
    let stop = StopToken::new();
    let stopper = stop_after(&stop, STOP_DELAY);

    // When: Capturing until stopped
    let outcome = controller.capture(CaptureMode::UntilStopped(&stop)).unwrap();
    stopper.join().unwrap();

    // Then: Empty, store untouched, directory empty
    assert_eq!(outcome, CaptureOutcome::Empty);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(dir_entries(&dir), 0);
}

/// WHAT: Capture ends at the ceiling when nobody stops it
/// WHY: A forgotten recording must not run forever
#[test]
fn given_no_stop_when_ceiling_elapses_then_capture_returns() {
    // Given: A short ceiling and a token nobody stops
    let dir = TempDir::new().unwrap();
    let (controller, _) = controller(FakeSource::streaming(), &dir);
    let controller = controller.with_ceiling(Duration::from_millis(150));
    let stop = StopToken::new();

    // When: Capturing
    let started = Instant::now();
    let outcome = controller.capture(CaptureMode::UntilStopped(&stop)).unwrap();

    // Then: Returned near the ceiling with audio
    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(matches!(outcome, CaptureOutcome::Captured(_)));
}

/// WHAT: Fixed mode records exactly sample_rate × duration samples
/// WHY: Fixed-length captures back diagnostics and calibration runs
#[test]
fn given_fixed_mode_when_capturing_then_exact_sample_count() {
    // Given: 200ms at 1kHz
    let dir = TempDir::new().unwrap();
    let (controller, _) = controller(FakeSource::streaming(), &dir);
    let controller = controller.with_ceiling(Duration::from_millis(200));

    // When: Capturing a fixed-length session
    let outcome = controller.capture(CaptureMode::Fixed).unwrap();

    // Then: 200 samples exactly
    let CaptureOutcome::Captured(artifact) = outcome else {
        panic!("expected a captured artifact");
    };
    let reader = WavReader::open(artifact.path()).unwrap();
    assert_eq!(reader.len(), 200);
    artifact.remove();
}

/// WHAT: A driver error during capture surfaces as an audio error with the device
/// WHY: Unplugged microphones must not look like silence
#[test]
fn given_driver_error_when_capturing_then_audio_error_with_device() {
    // Given: A source that reports an error after its first buffer
    let dir = TempDir::new().unwrap();
    let (controller, calls) = controller(FakeSource::failing("device unplugged"), &dir);
    let stop = StopToken::new();

    // When: Capturing (the error ends the wait without a stop)
    let result = controller.capture(CaptureMode::UntilStopped(&stop));

    // Then: Audio error naming the device, nothing persisted
    match result {
        Err(KoeError::Audio {
            message, device, ..
        }) => {
            assert!(message.contains("device unplugged"));
            assert_eq!(device.as_deref(), Some(FAKE_DEVICE));
        }
        other => panic!("expected an audio error, got {:?}", other),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(dir_entries(&dir), 0);
}

/// WHAT: A session with a limit keeps only up to the limit
/// WHY: Fixed-length captures must not overshoot
#[test]
fn given_session_limit_when_appending_past_it_then_truncated_and_full() {
    // Given: A session limited to 75 samples
    let mut session = CaptureSession::new(Some(75));

    // When: Appending two 50-sample buffers
    let first = session.append(&[0.1; 50]);
    let second = session.append(&[0.2; 50]);

    // Then: Only the second reports full, count capped
    assert!(!first);
    assert!(second);
    assert_eq!(session.sample_count(), 75);
    assert_eq!(session.buffer_count(), 2);
}

/// WHAT: An unlimited session concatenates buffers in order
/// WHY: The artifact must contain every sample in arrival order
#[test]
fn given_unlimited_session_when_appending_then_samples_concatenated() {
    // Given: An unlimited session
    let mut session = CaptureSession::default();

    // When: Appending two buffers
    session.append(&[0.1, 0.2]);
    session.append(&[0.3]);

    // Then: Samples are concatenated
    assert_eq!(session.into_samples(), vec![0.1, 0.2, 0.3]);
}
