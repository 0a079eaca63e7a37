mod audio_config;
#[allow(clippy::module_inception)]
mod config;
mod paste_config;
mod paths_config;
mod whisper_config;

pub(crate) use {
    audio_config::AudioConfig,
    config::Config,
    paste_config::PasteConfig,
    paths_config::PathsConfig,
    whisper_config::{WhisperConfig, WhisperDevice},
};

use std::{env, path::PathBuf};

use directories::ProjectDirs;

pub(crate) const DEFAULT_SAMPLE_RATE: u32 = 16_000;
pub(crate) const DEFAULT_CHANNELS: u16 = 1;
pub(crate) const DEFAULT_MAX_RECORDING_SECONDS: u64 = 300;
pub(crate) const DEFAULT_LANGUAGE: &str = "en";
pub(crate) const DEFAULT_PASTE_MODIFIER: &str = "ctrl";
pub(crate) const DEFAULT_PASTE_KEY: &str = "v";
pub(crate) const LOCK_FILE_NAME: &str = "koe.lock";

pub(crate) fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "koe", "koe")
}

/// Data directory from the platform conventions, or a temp-dir fallback when
/// no home directory can be determined.
pub(crate) fn default_data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| env::temp_dir().join("koe"))
}
