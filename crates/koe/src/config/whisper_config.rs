use crate::config::{DEFAULT_LANGUAGE, default_data_dir};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Compute device for inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhisperDevice {
    /// NVIDIA GPU through the `cuda` build feature.
    Cuda,
    /// CPU only.
    Cpu,
}

/// Whisper model configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhisperConfig {
    /// Path to the Whisper model file (e.g., ggml-base.en.bin).
    pub model_path: PathBuf,
    /// Compute device.
    pub device: WhisperDevice,
    /// Spoken language code.
    pub language: String,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model_path: default_data_dir().join("models").join("ggml-base.en.bin"),
            device: WhisperDevice::Cuda,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}
