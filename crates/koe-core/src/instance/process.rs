use std::{fmt, io};

/// Opaque OS process identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessId(u32);

impl ProcessId {
    /// Wraps a raw PID. Returns `None` for 0 and values that do not fit a `pid_t`,
    /// which `kill(2)` would interpret as process groups.
    pub fn new(raw: u32) -> Option<Self> {
        if raw == 0 || libc::pid_t::try_from(raw).is_err() {
            return None;
        }
        Some(Self(raw))
    }

    /// PID of the calling process.
    pub fn current() -> Self {
        Self(std::process::id())
    }

    /// Parses lock file contents. Surrounding whitespace is ignored; anything
    /// other than a positive decimal PID yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        text.trim().parse::<u32>().ok().and_then(Self::new)
    }

    /// Raw numeric value.
    pub fn as_u32(self) -> u32 {
        self.0
    }

    fn as_pid_t(self) -> libc::pid_t {
        // Range checked in `new`.
        self.0 as libc::pid_t
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of delivering a signal with `kill(2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SignalDelivery {
    Delivered,
    NoSuchProcess,
    PermissionDenied,
    Failed(i32),
}

pub(crate) fn send_signal(pid: ProcessId, signal: libc::c_int) -> SignalDelivery {
    // SAFETY: kill(2) has no memory-safety preconditions; pid is a positive pid_t.
    let result = unsafe { libc::kill(pid.as_pid_t(), signal) };
    if result == 0 {
        return SignalDelivery::Delivered;
    }

    match io::Error::last_os_error().raw_os_error() {
        Some(libc::ESRCH) => SignalDelivery::NoSuchProcess,
        Some(libc::EPERM) => SignalDelivery::PermissionDenied,
        Some(errno) => SignalDelivery::Failed(errno),
        None => SignalDelivery::Failed(0),
    }
}

/// Presence check with the null signal.
///
/// `ESRCH` means the process is gone. `EPERM` means it exists but belongs to
/// someone else, so it is reported alive and never reclaimed.
pub fn is_process_alive(pid: ProcessId) -> bool {
    match send_signal(pid, 0) {
        SignalDelivery::Delivered | SignalDelivery::PermissionDenied => true,
        SignalDelivery::NoSuchProcess => false,
        SignalDelivery::Failed(_) => true,
    }
}
