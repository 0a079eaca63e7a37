//! Configuration management for koe.
//!
//! Loads an optional TOML file from the platform config directory. Every
//! section and field has a default, so a missing file or a partial one is
//! valid. Nothing is written back: each invocation is a one-shot process.

use crate::{
    AppError, AppResult,
    config::{AudioConfig, PasteConfig, PathsConfig, WhisperConfig, WhisperDevice, project_dirs},
};

use std::{fs, io::ErrorKind, panic::Location, path::PathBuf};

use error_location::ErrorLocation;
use koe_core::{MicrophoneSettings, WhisperSettings};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Audio capture configuration.
    pub audio: AudioConfig,
    /// Whisper model configuration.
    pub whisper: WhisperConfig,
    /// Paste chord.
    pub paste: PasteConfig,
    /// Filesystem locations.
    pub paths: PathsConfig,
}

impl Config {
    /// Loads `config.toml` from the config directory, or defaults when absent.
    #[track_caller]
    #[instrument]
    pub fn load() -> AppResult<Self> {
        let Some(config_path) = Self::config_path() else {
            debug!("No config directory available, using defaults");
            return Ok(Self::default());
        };

        let contents = match fs::read_to_string(&config_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(config_path = ?config_path, "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(AppError::ConfigError {
                    reason: format!("Failed to read config {:?}: {}", config_path, e),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        let config = Self::from_toml_str(&contents)?;
        debug!(config_path = ?config_path, "Configuration loaded");

        Ok(config)
    }

    /// Parses TOML text. Missing fields take their defaults.
    #[track_caller]
    pub fn from_toml_str(contents: &str) -> AppResult<Self> {
        toml::from_str(contents).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Settings for the transcription engine.
    pub fn whisper_settings(&self) -> WhisperSettings {
        WhisperSettings {
            model_path: self.whisper.model_path.clone(),
            use_gpu: self.whisper.device == WhisperDevice::Cuda,
            language: self.whisper.language.clone(),
        }
    }

    /// Settings for the microphone recorder.
    pub fn microphone_settings(&self) -> MicrophoneSettings {
        MicrophoneSettings {
            selected_device: self.audio.selected_device.clone(),
            sample_rate: self.audio.sample_rate,
            channels: self.audio.channels,
            temp_dir: self.paths.temp_dir.clone(),
            max_duration: self.audio.max_recording_duration(),
        }
    }

    fn config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
