//! Append-only JSONL records of invocations and transcripts.

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    os::unix::fs::OpenOptionsExt,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use chrono::{DateTime, Utc};
use koe_core::{PipelineOutcome, TranscriptLog, UsageLogger};
use serde::Serialize;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Creates the data directory and its parents.
///
/// Runs before the log subscriber exists, so the caller reports failures.
pub(crate) fn ensure_data_dir(data_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(data_dir)
}

/// One invocation of koe.
#[derive(Debug, Serialize)]
pub(crate) struct UsageRecord {
    pub(crate) run_id: Uuid,
    pub(crate) invoked_at: DateTime<Utc>,
    pub(crate) outcome: PipelineOutcome,
    pub(crate) duration_ms: u64,
}

/// One successful transcription.
#[derive(Debug, Serialize)]
pub(crate) struct TranscriptRecord<'a> {
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) text: &'a str,
    pub(crate) word_count: usize,
}

/// Usage log at `<data_dir>/usage.jsonl`.
pub struct UsageHistory {
    path: PathBuf,
}

impl UsageHistory {
    /// Usage log appending to `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl UsageLogger for UsageHistory {
    #[instrument(skip(self), fields(path = ?self.path))]
    fn record(&self, outcome: PipelineOutcome, invoked_at: SystemTime, duration: Duration) {
        let record = UsageRecord {
            run_id: Uuid::new_v4(),
            invoked_at: DateTime::<Utc>::from(invoked_at),
            outcome,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        };

        match append_json_line(&self.path, &record) {
            Ok(()) => debug!(run_id = %record.run_id, "Usage recorded"),
            Err(e) => warn!(error = %e, "Failed to record usage"),
        }
    }
}

/// Transcript log at `<data_dir>/transcriptions.jsonl`.
pub struct TranscriptHistory {
    path: PathBuf,
}

impl TranscriptHistory {
    /// Transcript log appending to `path`.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TranscriptLog for TranscriptHistory {
    #[instrument(skip(self, text), fields(path = ?self.path))]
    fn record(&self, text: &str) {
        let record = TranscriptRecord {
            timestamp: Utc::now(),
            text,
            word_count: text.split_whitespace().count(),
        };

        match append_json_line(&self.path, &record) {
            Ok(()) => debug!(word_count = record.word_count, "Transcript recorded"),
            Err(e) => warn!(error = %e, "Failed to record transcript"),
        }
    }
}

/// Appends `record` as one line, creating the file owner-only.
fn append_json_line<T: Serialize>(path: &Path, record: &T) -> io::Result<()> {
    let mut line = serde_json::to_string(record)?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(line.as_bytes())
}
