mod guard;
mod toggle;

use std::process::{Child, Command};

/// Spawns a long-lived child whose PID is guaranteed alive until killed.
pub(super) fn spawn_sleeper() -> Child {
    Command::new("sleep").arg("30").spawn().unwrap()
}

/// PID of a child that has already exited and been reaped.
pub(super) fn reaped_pid() -> u32 {
    let mut child = Command::new("true").spawn().unwrap();
    let pid = child.id();
    child.wait().unwrap();
    pid
}
