use crate::{
    HotkeyAction, ProcessId, determine_action, signal_running_instance,
    tests::instance::{reaped_pid, spawn_sleeper},
};

use std::fs;

use tempfile::TempDir;

/// WHAT: No lock file means start
/// WHY: The first press begins a recording
#[test]
fn given_no_lock_when_determining_action_then_start() {
    // Given: No lock file
    let dir = TempDir::new().unwrap();

    // When: Determining the action
    let (action, pid) = determine_action(&dir.path().join("koe.lock"));

    // Then: Start with no owner
    assert_eq!(action, HotkeyAction::Start);
    assert_eq!(pid, None);
}

/// WHAT: A live owner means stop, with its PID
/// WHY: The second press ends the running recording
#[test]
fn given_live_owner_when_determining_action_then_stop_with_pid() {
    // Given: A lock naming a running process
    let dir = TempDir::new().unwrap();
    let lock_file = dir.path().join("koe.lock");
    let mut child = spawn_sleeper();
    fs::write(&lock_file, format!("{}\n", child.id())).unwrap();

    // When: Determining the action
    let (action, pid) = determine_action(&lock_file);

    // Then: Stop targeting the child
    assert_eq!(action, HotkeyAction::Stop);
    assert_eq!(pid.map(ProcessId::as_u32), Some(child.id()));

    child.kill().unwrap();
    child.wait().unwrap();
}

/// WHAT: A dead owner or garbage contents mean start
/// WHY: Stale locks are reclaimed by the start path
#[test]
fn given_dead_or_garbage_owner_when_determining_action_then_start() {
    // Given: Locks naming a dead PID and no PID at all
    let dir = TempDir::new().unwrap();
    let stale = dir.path().join("stale.lock");
    let garbage = dir.path().join("garbage.lock");
    fs::write(&stale, reaped_pid().to_string()).unwrap();
    fs::write(&garbage, "koe").unwrap();

    // When / Then: Both resolve to start
    assert_eq!(determine_action(&stale), (HotkeyAction::Start, None));
    assert_eq!(determine_action(&garbage), (HotkeyAction::Start, None));
}

/// WHAT: Signalling a process that has exited reports not delivered
/// WHY: The owner may exit between the read and the signal
#[test]
fn given_exited_process_when_signalling_then_not_delivered() {
    // Given: A reaped child PID
    let pid = ProcessId::new(reaped_pid()).unwrap();

    // When: Sending the stop notification
    let delivered = signal_running_instance(pid);

    // Then: Not delivered
    assert!(!delivered);
}
