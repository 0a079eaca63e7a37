use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use tracing::{debug, instrument};

/// Signal a second hotkey invocation sends to the recording owner.
pub const STOP_SIGNAL: libc::c_int = libc::SIGUSR1;

/// Granularity at which [`StopToken::wait`] re-checks the flag.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

static STOP_REQUESTED: AtomicBool = AtomicBool::new(false);

// Async-signal context: one atomic store, nothing else.
extern "C" fn handle_stop_signal(_: libc::c_int) {
    STOP_REQUESTED.store(true, Ordering::SeqCst);
}

/// Installs the [`STOP_SIGNAL`] handler and returns a token observing it.
///
/// A stop notification arriving before this call hits the default
/// disposition of [`STOP_SIGNAL`], which terminates the process. The lock
/// file is then left behind with a dead PID and the next invocation reclaims
/// it as stale.
#[instrument]
pub fn install_stop_handler() -> io::Result<StopToken> {
    // SAFETY: the handler only touches a static atomic, which is async-signal-safe,
    // and `action` is fully initialised before it is passed to sigaction.
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = handle_stop_signal as *const () as libc::sighandler_t;
        action.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&mut action.sa_mask);

        if libc::sigaction(STOP_SIGNAL, &action, std::ptr::null_mut()) != 0 {
            return Err(io::Error::last_os_error());
        }
    }

    debug!(signal = STOP_SIGNAL, "Stop handler installed");

    Ok(StopToken {
        flag: Flag::Process,
    })
}

/// How a [`StopToken::wait`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// A stop was requested.
    Stopped,
    /// The ceiling elapsed first.
    TimedOut,
}

#[derive(Debug, Clone)]
enum Flag {
    Process,
    Local(Arc<AtomicBool>),
}

/// Cooperative cancellation flag shared between a stop source and a waiter.
///
/// Tokens from [`install_stop_handler`] observe the process-wide signal flag;
/// [`StopToken::new`] creates an independent flag.
#[derive(Debug, Clone)]
pub struct StopToken {
    flag: Flag,
}

impl StopToken {
    /// Independent token, not connected to any OS signal.
    pub fn new() -> Self {
        Self {
            flag: Flag::Local(Arc::new(AtomicBool::new(false))),
        }
    }

    fn flag(&self) -> &AtomicBool {
        match &self.flag {
            Flag::Process => &STOP_REQUESTED,
            Flag::Local(flag) => flag,
        }
    }

    /// Requests a stop.
    pub fn request_stop(&self) {
        self.flag().store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        self.flag().load(Ordering::SeqCst)
    }

    /// Blocks until a stop is requested or `ceiling` elapses, whichever is first.
    pub fn wait(&self, ceiling: Duration) -> WaitOutcome {
        wait_any(&[self], ceiling)
    }
}

/// Blocks until any of `tokens` is stopped or `ceiling` elapses.
pub(crate) fn wait_any(tokens: &[&StopToken], ceiling: Duration) -> WaitOutcome {
    let deadline = Instant::now() + ceiling;
    loop {
        if tokens.iter().any(|token| token.is_stopped()) {
            return WaitOutcome::Stopped;
        }
        let now = Instant::now();
        if now >= deadline {
            return WaitOutcome::TimedOut;
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

impl Default for StopToken {
    fn default() -> Self {
        Self::new()
    }
}
