use crate::{Backend, tool};

use std::{env, io, panic::Location};

use error_location::ErrorLocation;
use koe_core::{FocusProbe, FocusedWindow, KoeError, KoeResult};
use serde::Deserialize;
use tracing::{debug, instrument};

/// Display context and focused window through `xdotool` or `hyprctl`.
pub struct DesktopFocus {
    backend: Backend,
}

impl DesktopFocus {
    /// Probe for the given backend.
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    #[track_caller]
    fn x11_window(&self) -> KoeResult<FocusedWindow> {
        let output = tool::run("xdotool", &["getwindowfocus"])
            .map_err(|e| query_failed("xdotool", &e))?;
        if !output.status.success() {
            return Err(focus_error("no focused window"));
        }

        let id_text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let id = parse_x11_window_id(&id_text)?;

        // A missing title is not a focus failure.
        let title = match tool::run("xdotool", &["getwindowname", id_text.as_str()]) {
            Ok(output) if output.status.success() => {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            }
            _ => String::new(),
        };

        Ok(FocusedWindow { id, title })
    }

    #[track_caller]
    fn wayland_window(&self) -> KoeResult<FocusedWindow> {
        let output = tool::run("hyprctl", &["activewindow", "-j"])
            .map_err(|e| query_failed("hyprctl", &e))?;
        if !output.status.success() {
            return Err(focus_error("no focused window"));
        }

        parse_hyprland_window(&String::from_utf8_lossy(&output.stdout))
    }
}

impl FocusProbe for DesktopFocus {
    #[track_caller]
    #[instrument(skip(self), fields(backend = %self.backend))]
    fn check_display_context(&self) -> KoeResult<()> {
        match self.backend {
            Backend::Wayland => {
                if tool::find_on_path("hyprctl").is_none() {
                    return Err(dependency_error(
                        "hyprctl is required on Wayland sessions",
                        "hyprctl",
                    ));
                }
            }
            Backend::X11 => {
                if env::var_os("DISPLAY").is_none_or(|display| display.is_empty()) {
                    return Err(dependency_error("DISPLAY is not set", "DISPLAY"));
                }
                if tool::find_on_path("xdotool").is_none() {
                    return Err(dependency_error("xdotool is required", "xdotool"));
                }
            }
        }
        Ok(())
    }

    #[track_caller]
    #[instrument(skip(self), fields(backend = %self.backend))]
    fn focused_window(&self) -> KoeResult<FocusedWindow> {
        let window = match self.backend {
            Backend::X11 => self.x11_window()?,
            Backend::Wayland => self.wayland_window()?,
        };
        debug!(window_id = window.id, title = %window.title, "Focused window found");
        Ok(window)
    }
}

#[derive(Debug, Deserialize)]
struct HyprlandWindow {
    address: Option<String>,
    title: Option<String>,
}

/// Parses `xdotool getwindowfocus` output as a decimal window id.
#[track_caller]
pub(crate) fn parse_x11_window_id(text: &str) -> KoeResult<u64> {
    let text = text.trim();
    if text.is_empty() {
        return Err(focus_error("no focused window"));
    }
    text.parse::<u64>()
        .map_err(|_| focus_error("invalid focused window id"))
}

/// Parses `hyprctl activewindow -j`; the `address` must be a `0x` hex id.
#[track_caller]
pub(crate) fn parse_hyprland_window(json: &str) -> KoeResult<FocusedWindow> {
    let window: HyprlandWindow = serde_json::from_str(json)
        .map_err(|_| focus_error("invalid focused window payload"))?;

    let Some(hex) = window.address.as_deref().and_then(|a| a.strip_prefix("0x")) else {
        return Err(focus_error("no focused window"));
    };

    let id = u64::from_str_radix(hex, 16).map_err(|_| focus_error("invalid focused window id"))?;

    Ok(FocusedWindow {
        id,
        title: window.title.unwrap_or_default(),
    })
}

/// Focus error for a query tool that could not be run.
#[track_caller]
pub(crate) fn query_failed(program: &str, e: &io::Error) -> KoeError {
    KoeError::Focus {
        message: format!("failed to query focused window: {}: {}", program, e),
        location: ErrorLocation::from(Location::caller()),
    }
}

#[track_caller]
fn focus_error(message: &str) -> KoeError {
    KoeError::Focus {
        message: message.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}

#[track_caller]
fn dependency_error(message: &str, missing_tool: &str) -> KoeError {
    KoeError::Dependency {
        message: message.to_string(),
        missing_tool: missing_tool.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}
