pub(crate) mod guard;
pub(crate) mod process;
pub(crate) mod stop_signal;
pub(crate) mod toggle;

pub use {
    guard::{InstanceGuard, LockHandle},
    process::{ProcessId, is_process_alive},
    stop_signal::{STOP_SIGNAL, StopToken, WaitOutcome, install_stop_handler},
    toggle::{HotkeyAction, determine_action, signal_running_instance},
};
