use crate::config::{LOCK_FILE_NAME, default_data_dir};

use std::{env, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Filesystem locations used by one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Instance lock file.
    pub lock_file: PathBuf,
    /// Directory receiving temporary audio artifacts.
    pub temp_dir: PathBuf,
    /// Persistent directory for usage, transcript and log files.
    pub data_dir: PathBuf,
}

impl PathsConfig {
    /// Per-invocation usage records.
    pub fn usage_log(&self) -> PathBuf {
        self.data_dir.join("usage.jsonl")
    }

    /// Successful transcripts.
    pub fn transcription_log(&self) -> PathBuf {
        self.data_dir.join("transcriptions.jsonl")
    }

    /// Daily rolling diagnostic logs.
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let runtime_dir = env::var_os("XDG_RUNTIME_DIR")
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/tmp"));

        Self {
            lock_file: runtime_dir.join(LOCK_FILE_NAME),
            temp_dir: env::temp_dir(),
            data_dir: default_data_dir(),
        }
    }
}
