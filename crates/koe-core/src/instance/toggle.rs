//! Start/stop decision for a hotkey press and the stop notification sent to
//! a recording owner.

use crate::instance::{
    ProcessId, is_process_alive,
    guard::read_lock_owner,
    process::{SignalDelivery, send_signal},
    stop_signal::STOP_SIGNAL,
};

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// What a single hotkey invocation should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HotkeyAction {
    /// No live owner: acquire the lock and record.
    Start,
    /// A live owner is recording: tell it to stop.
    Stop,
}

/// Decides start-vs-stop from the lock file contents.
///
/// A missing or unreadable lock, or one naming a dead process, means `Start`.
/// A live PID means `Stop` together with that PID.
#[instrument]
pub fn determine_action(lock_file: &Path) -> (HotkeyAction, Option<ProcessId>) {
    let owner = match read_lock_owner(lock_file) {
        Ok(owner) => owner,
        Err(e) => {
            warn!(error = %e, "Lock file unreadable, treating as no owner");
            None
        }
    };

    match owner {
        Some(pid) if is_process_alive(pid) => {
            debug!(pid = %pid, "Live recording owner found");
            (HotkeyAction::Stop, Some(pid))
        }
        _ => (HotkeyAction::Start, None),
    }
}

/// Sends the stop notification to a recording owner.
///
/// Returns `false` when the process is gone or belongs to another user; both
/// are ordinary "not delivered" outcomes.
#[instrument]
pub fn signal_running_instance(pid: ProcessId) -> bool {
    match send_signal(pid, STOP_SIGNAL) {
        SignalDelivery::Delivered => {
            info!(pid = %pid, "Stop notification delivered");
            true
        }
        SignalDelivery::NoSuchProcess => {
            debug!(pid = %pid, "Recording owner already exited");
            false
        }
        SignalDelivery::PermissionDenied => {
            warn!(pid = %pid, "Not permitted to signal recording owner");
            false
        }
        SignalDelivery::Failed(errno) => {
            warn!(pid = %pid, errno, "Stop notification failed");
            false
        }
    }
}
