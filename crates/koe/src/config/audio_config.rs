use crate::config::{DEFAULT_CHANNELS, DEFAULT_MAX_RECORDING_SECONDS, DEFAULT_SAMPLE_RATE};

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Audio capture configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Preferred capture rate in Hz.
    pub sample_rate: u32,
    /// Preferred channel count.
    pub channels: u16,
    /// Selected audio device name (None = default device).
    pub selected_device: Option<String>,
    /// Hard ceiling on one recording, in seconds.
    pub max_recording_seconds: u64,
}

impl AudioConfig {
    /// Recording ceiling as a [`Duration`].
    pub fn max_recording_duration(&self) -> Duration {
        Duration::from_secs(self.max_recording_seconds)
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            selected_device: None,
            max_recording_seconds: DEFAULT_MAX_RECORDING_SECONDS,
        }
    }
}
