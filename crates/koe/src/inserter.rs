//! Clipboard-based text insertion.
//!
//! The transcript is placed on the clipboard and pasted into the focused
//! window with the configured chord. Whatever text the clipboard held
//! before is put back afterwards.

use crate::{Backend, PasteKeyGuard, config::PasteConfig, paste_key_guard, tool};

use std::{panic::Location, thread, time::Duration};

use arboard::Clipboard;
use error_location::ErrorLocation;
use koe_core::{KoeError, KoeResult, TextInserter};
use tracing::{debug, info, instrument, warn};

/// Delay between clipboard write and paste simulation.
///
/// Gives the clipboard owner time to publish the new selection before the
/// focused application asks for it.
const CLIPBOARD_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Delay before restoring the previous clipboard, so the paste reads the transcript.
const PASTE_SETTLE_DELAY: Duration = Duration::from_millis(150);

/// Steps of an insertion, used as error message prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InsertStep {
    Backup,
    Write,
    Paste,
    Restore,
}

impl InsertStep {
    fn prefix(self) -> &'static str {
        match self {
            InsertStep::Backup => "clipboard backup failed",
            InsertStep::Write => "clipboard write failed",
            InsertStep::Paste => "paste simulation failed",
            InsertStep::Restore => "clipboard restore failed",
        }
    }
}

/// Inserts text through the clipboard and a simulated paste chord.
pub struct ClipboardInserter {
    backend: Backend,
    paste: PasteConfig,
}

impl ClipboardInserter {
    /// Inserter for `backend` using the configured paste chord.
    pub fn new(backend: Backend, paste: PasteConfig) -> Self {
        Self { backend, paste }
    }

    #[track_caller]
    fn insert_x11(&self, text: &str) -> KoeResult<()> {
        let mut clipboard = Clipboard::new()
            .map_err(|e| insertion_error(InsertStep::Backup, e.to_string(), text))?;

        // Images and other non-text contents are not restored.
        let backup = clipboard.get_text().ok().filter(|previous| !previous.is_empty());

        clipboard
            .set_text(text)
            .map_err(|e| insertion_error(InsertStep::Write, e.to_string(), text))?;
        debug!(text_len = text.len(), "Text copied to clipboard");

        thread::sleep(CLIPBOARD_SETTLE_DELAY);
        self.paste_with_enigo(text)?;

        if let Some(previous) = backup {
            thread::sleep(PASTE_SETTLE_DELAY);
            clipboard
                .set_text(previous)
                .map_err(|e| insertion_error(InsertStep::Restore, e.to_string(), text))?;
            debug!("Clipboard restored");
        }

        Ok(())
    }

    #[track_caller]
    fn paste_with_enigo(&self, text: &str) -> KoeResult<()> {
        let modifiers = self
            .paste
            .modifiers()
            .iter()
            .map(|name| {
                paste_key_guard::modifier_key(name).ok_or_else(|| {
                    insertion_error(
                        InsertStep::Paste,
                        format!("unknown paste modifier: {}", name),
                        text,
                    )
                })
            })
            .collect::<KoeResult<Vec<_>>>()?;

        let key = paste_key_guard::paste_key(&self.paste.key).ok_or_else(|| {
            insertion_error(
                InsertStep::Paste,
                format!("unknown paste key: {}", self.paste.key),
                text,
            )
        })?;

        // The guard releases the modifiers even if the click fails.
        let mut guard = PasteKeyGuard::press(&modifiers, text)?;
        guard.click(key, text)?;
        drop(guard);

        debug!("Paste chord simulated");
        Ok(())
    }

    #[track_caller]
    fn insert_wayland(&self, text: &str) -> KoeResult<()> {
        let backup = wayland_backup(text)?;

        let status = tool::run_with_input("wl-copy", &[], text)
            .map_err(|e| insertion_error(InsertStep::Write, e.to_string(), text))?;
        if !status.success() {
            return Err(insertion_error(
                InsertStep::Write,
                tool::status_detail("wl-copy", status),
                text,
            ));
        }
        debug!(text_len = text.len(), "Text copied to clipboard");

        thread::sleep(CLIPBOARD_SETTLE_DELAY);
        self.paste_wayland(text)?;

        if let Some(previous) = backup {
            thread::sleep(PASTE_SETTLE_DELAY);
            let status = tool::run_with_input("wl-copy", &[], &previous)
                .map_err(|e| insertion_error(InsertStep::Restore, e.to_string(), text))?;
            if !status.success() {
                return Err(insertion_error(
                    InsertStep::Restore,
                    tool::status_detail("wl-copy", status),
                    text,
                ));
            }
            debug!("Clipboard restored");
        }

        Ok(())
    }

    #[track_caller]
    fn paste_wayland(&self, text: &str) -> KoeResult<()> {
        let modifiers = self.paste.modifiers();

        let (program, args) = if tool::find_on_path("wtype").is_some() {
            ("wtype", wtype_args(&modifiers, &self.paste.key))
        } else {
            (
                "hyprctl",
                vec![
                    "dispatch".to_string(),
                    "sendshortcut".to_string(),
                    hyprland_shortcut(&modifiers, &self.paste.key),
                ],
            )
        };

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = tool::run(program, &args)
            .map_err(|e| insertion_error(InsertStep::Paste, e.to_string(), text))?;
        if !output.status.success() {
            return Err(insertion_error(
                InsertStep::Paste,
                tool::failure_detail(program, &output),
                text,
            ));
        }

        debug!(program, "Paste chord simulated");
        Ok(())
    }
}

impl TextInserter for ClipboardInserter {
    #[track_caller]
    #[instrument(skip(self, text), fields(backend = %self.backend, text_len = text.len()))]
    fn insert(&self, text: &str) -> KoeResult<()> {
        if text.trim().is_empty() {
            return Err(KoeError::Insertion {
                message: "insertion rejected: transcript text is empty".to_string(),
                transcript_text: text.to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let result = match self.backend {
            Backend::X11 => self.insert_x11(text),
            Backend::Wayland => self.insert_wayland(text),
        };

        match &result {
            Ok(()) => info!("Text inserted"),
            Err(e) => warn!(error = %e, "Text insertion failed"),
        }
        result
    }
}

/// Reads the current clipboard text with `wl-paste`.
///
/// An empty or non-text clipboard makes `wl-paste` fail; that means there
/// is nothing to restore rather than an error.
#[track_caller]
fn wayland_backup(text: &str) -> KoeResult<Option<String>> {
    let output = tool::run("wl-paste", &["--no-newline"])
        .map_err(|e| insertion_error(InsertStep::Backup, e.to_string(), text))?;

    if output.status.success() {
        let previous = String::from_utf8_lossy(&output.stdout).into_owned();
        return Ok((!previous.is_empty()).then_some(previous));
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if is_empty_clipboard_message(&stderr) {
        debug!("Clipboard empty, nothing to restore");
        return Ok(None);
    }

    Err(insertion_error(
        InsertStep::Backup,
        tool::failure_detail("wl-paste", &output),
        text,
    ))
}

/// Whether `wl-paste` stderr reports an empty or non-text clipboard.
pub(crate) fn is_empty_clipboard_message(stderr: &str) -> bool {
    let stderr = stderr.trim().to_lowercase();
    stderr.is_empty()
        || stderr.contains("nothing is copied")
        || stderr.contains("no selection")
        || stderr.contains("no suitable type")
}

/// `wtype` arguments pressing the modifiers, clicking `key`, then releasing
/// the modifiers in reverse.
pub(crate) fn wtype_args(modifiers: &[String], key: &str) -> Vec<String> {
    let mut args = Vec::with_capacity(modifiers.len() * 4 + 4);
    for modifier in modifiers {
        args.push("-M".to_string());
        args.push(wtype_modifier(modifier).to_string());
    }
    args.extend(["-P".to_string(), key.to_string(), "-p".to_string(), key.to_string()]);
    for modifier in modifiers.iter().rev() {
        args.push("-m".to_string());
        args.push(wtype_modifier(modifier).to_string());
    }
    args
}

fn wtype_modifier(name: &str) -> &str {
    match name {
        "control" => "ctrl",
        "super" | "meta" => "logo",
        other => other,
    }
}

/// Hyprland `sendshortcut` argument, e.g. `CTRL SHIFT, V,`.
pub(crate) fn hyprland_shortcut(modifiers: &[String], key: &str) -> String {
    let modifiers = modifiers
        .iter()
        .map(|m| m.to_uppercase())
        .collect::<Vec<_>>()
        .join(" ");
    format!("{}, {},", modifiers, key.to_uppercase())
}

#[track_caller]
fn insertion_error(step: InsertStep, detail: String, transcript: &str) -> KoeError {
    KoeError::Insertion {
        message: format!("{}: {}", step.prefix(), detail),
        transcript_text: transcript.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}
