use crate::{
    KoeError, Transcript, WhisperEngine, WhisperSettings,
    audio::engine::{is_cuda_unavailable, normalize_segments},
};

use std::path::PathBuf;

use tempfile::TempDir;

/// WHAT: Segments are trimmed and joined with single spaces
/// WHY: Whisper segments carry leading spaces that would double up
#[test]
fn given_padded_segments_when_normalizing_then_joined_with_single_spaces() {
    // Given: Segments with surrounding whitespace
    let segments = [" Hello there.", "  How are you? "];

    // When: Normalizing
    let text = normalize_segments(&segments);

    // Then: Clean single-spaced text
    assert_eq!(text, "Hello there. How are you?");
}

/// WHAT: Noise markers and blank segments are dropped
/// WHY: "[BLANK_AUDIO]" must never be pasted into the user's window
#[test]
fn given_only_noise_markers_when_normalizing_then_empty() {
    // Given: Nothing but markers and whitespace
    let segments = ["[BLANK_AUDIO]", "  ", "(silence)", "[MUSIC]"];

    // When: Normalizing
    let text = normalize_segments(&segments);

    // Then: Empty text, which the engine reports as no speech
    assert!(text.is_empty());
}

/// WHAT: Markers between speech are removed without leaving gaps
/// WHY: Partial silence should not break the transcript
#[test]
fn given_speech_around_marker_when_normalizing_then_marker_removed() {
    let segments = vec!["first".to_string(), "(inaudible)".to_string(), "second".to_string()];
    assert_eq!(normalize_segments(&segments), "first second");
}

/// WHAT: CUDA-missing load errors are recognised case-insensitively
/// WHY: The user should be told to switch to the CPU device
#[test]
fn given_cuda_load_errors_when_classifying_then_unavailable_detected() {
    assert!(is_cuda_unavailable("CUDA driver version is insufficient"));
    assert!(is_cuda_unavailable("cuda backend not available"));
    assert!(is_cuda_unavailable("libcuda.so: not found"));
    assert!(!is_cuda_unavailable("failed to open model file"));
    assert!(!is_cuda_unavailable("driver not found"));
}

/// WHAT: A missing model is a transcription error with CUDA considered available
/// WHY: Model problems must not be misreported as GPU problems
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn given_missing_model_when_transcribing_then_model_load_error() {
    // Given: An engine pointing at a model that does not exist
    let dir = TempDir::new().unwrap();
    let engine = WhisperEngine::new(WhisperSettings {
        model_path: dir.path().join("ggml-missing.bin"),
        use_gpu: false,
        language: "en".to_string(),
    });

    // When: Transcribing any path
    let result = engine.transcribe(&dir.path().join("koe-audio.wav"));

    // Then: Transcription error, CUDA not blamed
    match result {
        Err(KoeError::Transcription {
            message,
            cuda_available,
            ..
        }) => {
            assert!(message.starts_with("model load failed"));
            assert!(cuda_available);
        }
        other => panic!("expected a transcription error, got {:?}", other),
    }
}

/// WHAT: Silence transcribes to Empty
/// WHY: Silence maps to the no-speech outcome rather than inserting nothing
#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn given_silent_artifact_when_transcribing_then_empty() {
    // Given: A real model and one second of silence
    let model_path = std::env::var("TEST_WHISPER_MODEL_PATH")
        .unwrap_or_else(|_| "models/ggml-base.en.bin".to_string());
    let dir = TempDir::new().unwrap();
    let store = crate::WavArtifactStore::new(dir.path());
    let artifact = crate::ArtifactStore::persist(&store, &[0.0; 48_000], 48_000).unwrap();
    let engine = WhisperEngine::new(WhisperSettings {
        model_path: PathBuf::from(model_path),
        use_gpu: false,
        language: "en".to_string(),
    });

    // When: Transcribing
    let transcript = engine.transcribe(artifact.path()).unwrap();

    // Then: Nothing recognised
    assert_eq!(transcript, Transcript::Empty);
}
