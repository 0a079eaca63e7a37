use crate::{
    InstanceGuard, KoeError,
    instance::guard::read_lock_owner,
    tests::instance::{reaped_pid, spawn_sleeper},
};

use std::fs;

use tempfile::TempDir;

/// WHAT: First acquisition writes our PID as the whole file content
/// WHY: Peers parse the lock contents to find the recording owner
#[test]
fn given_no_lock_when_acquiring_then_file_contains_only_own_pid() {
    // Given: An empty runtime directory
    let dir = TempDir::new().unwrap();
    let guard = InstanceGuard::new(dir.path().join("koe.lock"));

    // When: Acquiring the lock
    let handle = guard.acquire().unwrap();

    // Then: The file holds exactly our PID
    let content = fs::read_to_string(handle.path()).unwrap();
    assert_eq!(content, std::process::id().to_string());
}

/// WHAT: Second acquisition in the same process reports contention with our PID
/// WHY: A live owner must never be displaced
#[test]
fn given_held_lock_when_acquiring_again_then_already_running_with_owner_pid() {
    // Given: A lock already held by this process
    let dir = TempDir::new().unwrap();
    let guard = InstanceGuard::new(dir.path().join("koe.lock"));
    let _handle = guard.acquire().unwrap();

    // When: Acquiring a second time
    let result = guard.acquire();

    // Then: AlreadyRunning names our PID
    match result {
        Err(KoeError::AlreadyRunning {
            conflicting_pid, ..
        }) => assert_eq!(conflicting_pid, Some(std::process::id())),
        other => panic!("expected AlreadyRunning, got {:?}", other),
    }
}

/// WHAT: A lock held by another live process is contended
/// WHY: Liveness comes from the OS, not from who wrote the file
#[test]
fn given_lock_owned_by_live_child_when_acquiring_then_contended() {
    // Given: A lock naming a running child process
    let dir = TempDir::new().unwrap();
    let lock_file = dir.path().join("koe.lock");
    let mut child = spawn_sleeper();
    fs::write(&lock_file, child.id().to_string()).unwrap();

    // When: Acquiring
    let result = InstanceGuard::new(&lock_file).acquire();

    // Then: Contended with the child's PID, file untouched
    let conflicting = match result {
        Err(KoeError::AlreadyRunning {
            conflicting_pid, ..
        }) => conflicting_pid,
        other => panic!("expected AlreadyRunning, got {:?}", other),
    };
    assert_eq!(conflicting, Some(child.id()));
    assert_eq!(fs::read_to_string(&lock_file).unwrap(), child.id().to_string());

    child.kill().unwrap();
    child.wait().unwrap();
}

/// WHAT: A lock naming a dead process is reclaimed
/// WHY: Crashed runs must not block the hotkey forever
#[test]
fn given_stale_lock_when_acquiring_then_reclaimed_with_own_pid() {
    // Given: A lock naming a PID that has exited
    let dir = TempDir::new().unwrap();
    let lock_file = dir.path().join("koe.lock");
    fs::write(&lock_file, reaped_pid().to_string()).unwrap();

    // When: Acquiring
    let handle = InstanceGuard::new(&lock_file).acquire().unwrap();

    // Then: The file now names us
    assert_eq!(
        fs::read_to_string(handle.path()).unwrap(),
        std::process::id().to_string()
    );
}

/// WHAT: Garbage lock contents are treated as a lock without a live owner
/// WHY: Only a parseable, live PID counts as ownership
#[test]
fn given_lock_without_pid_when_acquiring_then_already_running_without_pid() {
    // Given: A lock file containing no PID
    let dir = TempDir::new().unwrap();
    let lock_file = dir.path().join("koe.lock");
    fs::write(&lock_file, "not-a-pid").unwrap();

    // When: Acquiring
    let result = InstanceGuard::new(&lock_file).acquire();

    // Then: AlreadyRunning with no conflicting PID
    assert!(matches!(
        result,
        Err(KoeError::AlreadyRunning {
            conflicting_pid: None,
            ..
        })
    ));
}

/// WHAT: An OS error while creating the lock maps to AlreadyRunning without PID
/// WHY: Acquisition failure and contention share one user-facing category
#[test]
fn given_missing_parent_directory_when_acquiring_then_already_running_without_pid() {
    // Given: A lock path inside a directory that does not exist
    let dir = TempDir::new().unwrap();
    let guard = InstanceGuard::new(dir.path().join("missing").join("koe.lock"));

    // When: Acquiring
    let result = guard.acquire();

    // Then: AlreadyRunning with no PID and a descriptive message
    match result {
        Err(KoeError::AlreadyRunning {
            conflicting_pid,
            message,
            ..
        }) => {
            assert_eq!(conflicting_pid, None);
            assert!(message.starts_with("unable to acquire instance lock"));
        }
        other => panic!("expected AlreadyRunning, got {:?}", other),
    }
}

/// WHAT: Release removes the file and repeated release is harmless
/// WHY: Cleanup runs from several exit paths
#[test]
fn given_held_lock_when_releasing_twice_then_file_gone_and_no_error() {
    // Given: A held lock
    let dir = TempDir::new().unwrap();
    let guard = InstanceGuard::new(dir.path().join("koe.lock"));
    let mut handle = guard.acquire().unwrap();

    // When: Releasing twice
    guard.release(&mut handle);
    guard.release(&mut handle);

    // Then: The file is gone and the handle reports released
    assert!(!guard.lock_file().exists());
    assert!(handle.is_released());
}

/// WHAT: Release tolerates a lock file deleted by someone else
/// WHY: Release never fails
#[test]
fn given_lock_file_already_deleted_when_releasing_then_no_error() {
    // Given: A held lock whose file was removed externally
    let dir = TempDir::new().unwrap();
    let guard = InstanceGuard::new(dir.path().join("koe.lock"));
    let mut handle = guard.acquire().unwrap();
    fs::remove_file(guard.lock_file()).unwrap();

    // When: Releasing
    guard.release(&mut handle);

    // Then: Nothing exists and nothing failed
    assert!(!guard.lock_file().exists());
}

/// WHAT: Dropping the handle releases the lock
/// WHY: Unwinding must not leave a lock naming a live-looking PID
#[test]
fn given_held_lock_when_handle_dropped_then_lock_reacquirable() {
    // Given: A held lock
    let dir = TempDir::new().unwrap();
    let guard = InstanceGuard::new(dir.path().join("koe.lock"));
    let handle = guard.acquire().unwrap();

    // When: The handle goes out of scope
    drop(handle);

    // Then: The lock can be taken again
    assert!(guard.acquire().is_ok());
}

/// WHAT: Reading a missing lock yields no owner
/// WHY: Absence is the common "nothing running" case
#[test]
fn given_missing_lock_when_reading_owner_then_none() {
    // Given: A path with no file
    let dir = TempDir::new().unwrap();

    // When: Reading the owner
    let owner = read_lock_owner(&dir.path().join("koe.lock")).unwrap();

    // Then: No owner
    assert_eq!(owner, None);
}
