//! External command helpers.

use std::{
    env,
    ffi::OsStr,
    io::{self, Write},
    os::unix::fs::PermissionsExt,
    path::PathBuf,
    process::{Command, ExitStatus, Output, Stdio},
};

use tracing::debug;

/// Locates an executable on `PATH`.
pub(crate) fn find_on_path(tool: &str) -> Option<PathBuf> {
    env::var_os("PATH").and_then(|path| find_in(tool, &path))
}

/// Locates an executable in a `PATH`-style list of directories.
pub(crate) fn find_in(tool: &str, path: &OsStr) -> Option<PathBuf> {
    env::split_paths(path)
        .map(|dir| dir.join(tool))
        .find(|candidate| {
            candidate
                .metadata()
                .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        })
}

/// Runs a command to completion, capturing its output.
pub(crate) fn run(program: &str, args: &[&str]) -> io::Result<Output> {
    debug!(program, ?args, "Running tool");
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
}

/// Runs a command with `input` on stdin and waits for its exit status.
///
/// Output is discarded: `wl-copy` leaves a background server holding any
/// inherited pipes open, so reading them would block until it exits.
pub(crate) fn run_with_input(program: &str, args: &[&str], input: &str) -> io::Result<ExitStatus> {
    debug!(program, ?args, input_len = input.len(), "Running tool with input");
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input.as_bytes())?;
    }

    child.wait()
}

/// Trimmed stderr, or "`program` exited with `code`" when stderr is empty.
pub(crate) fn failure_detail(program: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if !stderr.is_empty() {
        return stderr;
    }
    status_detail(program, output.status)
}

/// "`program` exited with `code`".
pub(crate) fn status_detail(program: &str, status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("{} exited with {}", program, code),
        None => format!("{} was terminated by a signal", program),
    }
}
