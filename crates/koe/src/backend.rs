use std::{env, fmt};

use serde::Serialize;

/// Environment variable forcing the display backend.
pub(crate) const BACKEND_OVERRIDE_VAR: &str = "KOE_BACKEND";

/// Display server integration, probed once per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// X11 session: `xdotool` for focus, `arboard`/`enigo` for insertion.
    X11,
    /// Hyprland Wayland session: `hyprctl` for focus, `wl-clipboard` and
    /// `wtype` or `hyprctl` for insertion.
    Wayland,
}

impl Backend {
    /// Reads the process environment.
    pub fn detect() -> Self {
        let display_set = env::var_os("DISPLAY").is_some_and(|display| !display.is_empty());
        Self::from_env(
            env::var(BACKEND_OVERRIDE_VAR).ok().as_deref(),
            env::var("XDG_SESSION_TYPE").ok().as_deref(),
            display_set,
        )
    }

    /// `KOE_BACKEND=x11|wayland` wins. Otherwise Wayland only for a Wayland
    /// session without an X display; XWayland sessions stay on X11.
    pub fn from_env(override_value: Option<&str>, session_type: Option<&str>, display_set: bool) -> Self {
        match override_value.map(str::trim) {
            Some("wayland") => return Backend::Wayland,
            Some("x11") => return Backend::X11,
            _ => {}
        }

        if session_type == Some("wayland") && !display_set {
            Backend::Wayland
        } else {
            Backend::X11
        }
    }

    /// Executables that must all be on `PATH`.
    pub fn required_tools(self) -> &'static [&'static str] {
        match self {
            Backend::X11 => &["xdotool"],
            Backend::Wayland => &["hyprctl", "wl-copy", "wl-paste"],
        }
    }

    /// Executables of which at least one must be on `PATH` to paste.
    pub fn paste_tools(self) -> &'static [&'static str] {
        match self {
            Backend::X11 => &[],
            Backend::Wayland => &["wtype", "hyprctl"],
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::X11 => f.write_str("x11"),
            Backend::Wayland => f.write_str("wayland"),
        }
    }
}
