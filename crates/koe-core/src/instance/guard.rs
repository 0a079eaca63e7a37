use crate::{
    KoeError, KoeResult,
    instance::{ProcessId, is_process_alive},
};

use std::{
    fs::{self, OpenOptions},
    io::{self, ErrorKind, Write},
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};

/// Proof of ownership of the instance lock file.
///
/// Released explicitly through [`LockHandle::release`] or, failing that, on drop.
/// Release is best-effort and idempotent.
#[derive(Debug)]
pub struct LockHandle {
    path: PathBuf,
    released: bool,
}

impl LockHandle {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self {
            path,
            released: false,
        }
    }

    /// Path of the held lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether [`release`](Self::release) has already run.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Deletes the lock file. Missing files and OS errors are swallowed.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match fs::remove_file(&self.path) {
            Ok(()) => debug!(lock_file = ?self.path, "Instance lock released"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(lock_file = ?self.path, error = %e, "Failed to remove lock file"),
        }
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Cross-process exclusivity through a PID lock file.
#[derive(Debug, Clone)]
pub struct InstanceGuard {
    lock_file: PathBuf,
}

impl InstanceGuard {
    /// Creates a guard for the given lock path. Nothing touches the filesystem yet.
    pub fn new<P: Into<PathBuf>>(lock_file: P) -> Self {
        Self {
            lock_file: lock_file.into(),
        }
    }

    /// Lock path managed by this guard.
    pub fn lock_file(&self) -> &Path {
        &self.lock_file
    }

    /// Takes the lock, writing the current PID as the file's entire content.
    ///
    /// A lock left by a dead process is deleted and acquisition retried exactly
    /// once. Two processes reclaiming the same stale lock at the same moment can
    /// in rare cases both succeed; the single retry keeps that window small.
    ///
    /// # Errors
    ///
    /// [`KoeError::AlreadyRunning`] with `conflicting_pid = Some(..)` when a live
    /// process owns the lock, or `None` when the lock could not be taken for any
    /// other reason.
    #[track_caller]
    #[instrument(skip(self), fields(lock_file = ?self.lock_file))]
    pub fn acquire(&self) -> KoeResult<LockHandle> {
        let caller = Location::caller();

        match self.try_create() {
            Ok(handle) => return Ok(handle),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(self.acquisition_failed(&e, caller)),
        }

        let owner = read_lock_owner(&self.lock_file)
            .map_err(|e| self.acquisition_failed(&e, caller))?;

        let Some(pid) = owner else {
            return Err(self.unusable_lock(caller));
        };

        if is_process_alive(pid) {
            return Err(self.contended(pid, caller));
        }

        warn!(stale_pid = %pid, "Reclaiming stale instance lock");
        match fs::remove_file(&self.lock_file) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(self.acquisition_failed(&e, caller)),
        }

        // Single retry: whoever owns the path now wins.
        match self.try_create() {
            Ok(handle) => Ok(handle),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                match read_lock_owner(&self.lock_file) {
                    Ok(Some(pid)) if is_process_alive(pid) => Err(self.contended(pid, caller)),
                    _ => Err(self.unusable_lock(caller)),
                }
            }
            Err(e) => Err(self.acquisition_failed(&e, caller)),
        }
    }

    /// Releases a handle obtained from [`acquire`](Self::acquire). Never fails.
    pub fn release(&self, handle: &mut LockHandle) {
        handle.release();
    }

    fn try_create(&self) -> io::Result<LockHandle> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.lock_file)?;

        // From here on the handle owns the file and deletes it if the write fails.
        let handle = LockHandle::new(self.lock_file.clone());
        file.write_all(ProcessId::current().to_string().as_bytes())?;
        file.sync_all()?;

        info!(pid = std::process::id(), "Instance lock acquired");

        Ok(handle)
    }

    fn contended(&self, pid: ProcessId, caller: &'static Location<'static>) -> KoeError {
        KoeError::AlreadyRunning {
            message: format!(
                "another koe instance is active (pid {}); remove stale lock at {} if this is unexpected",
                pid,
                self.lock_file.display()
            ),
            lock_file: self.lock_file.clone(),
            conflicting_pid: Some(pid.as_u32()),
            location: ErrorLocation::from(caller),
        }
    }

    fn unusable_lock(&self, caller: &'static Location<'static>) -> KoeError {
        KoeError::AlreadyRunning {
            message: format!(
                "unable to acquire instance lock: {} exists without a live owner pid",
                self.lock_file.display()
            ),
            lock_file: self.lock_file.clone(),
            conflicting_pid: None,
            location: ErrorLocation::from(caller),
        }
    }

    fn acquisition_failed(&self, error: &io::Error, caller: &'static Location<'static>) -> KoeError {
        KoeError::AlreadyRunning {
            message: format!(
                "unable to acquire instance lock at {}: {}",
                self.lock_file.display(),
                error
            ),
            lock_file: self.lock_file.clone(),
            conflicting_pid: None,
            location: ErrorLocation::from(caller),
        }
    }
}

/// Reads the PID recorded in a lock file.
///
/// `Ok(None)` for a missing file or contents that are not a PID.
pub(crate) fn read_lock_owner(lock_file: &Path) -> io::Result<Option<ProcessId>> {
    match fs::read_to_string(lock_file) {
        Ok(text) => Ok(ProcessId::parse(&text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
