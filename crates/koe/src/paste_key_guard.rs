use std::{panic::Location, thread, time::Duration};

use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use error_location::ErrorLocation;
use koe_core::{KoeError, KoeResult};

/// Delay between key events of the paste chord.
const KEY_EVENT_DELAY: Duration = Duration::from_millis(10);

/// Maps a configured modifier name to its key.
pub(crate) fn modifier_key(name: &str) -> Option<Key> {
    match name {
        "ctrl" | "control" => Some(Key::Control),
        "shift" => Some(Key::Shift),
        "alt" => Some(Key::Alt),
        "super" | "meta" => Some(Key::Meta),
        _ => None,
    }
}

/// Maps a configured key name to its key. Single characters are typed as themselves.
pub(crate) fn paste_key(name: &str) -> Option<Key> {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(Key::Unicode(c.to_ascii_lowercase())),
        _ => None,
    }
}

/// RAII guard that holds the paste modifiers down and releases them on drop.
///
/// Owns the `Enigo` instance so all keyboard operations go through it.
/// Modifiers are released in reverse press order, best effort: a failed
/// release is cleared by the next physical key event.
pub struct PasteKeyGuard {
    enigo: Enigo,
    pressed: Vec<Key>,
}

impl PasteKeyGuard {
    /// Press `modifiers` in order and return a guard that releases them.
    #[track_caller]
    pub(crate) fn press(modifiers: &[Key], transcript: &str) -> KoeResult<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| paste_error(format!("failed to create keyboard: {}", e), transcript))?;

        let mut guard = Self {
            enigo,
            pressed: Vec::with_capacity(modifiers.len()),
        };

        for &modifier in modifiers {
            guard
                .enigo
                .key(modifier, Direction::Press)
                .map_err(|e| paste_error(format!("failed to press modifier: {}", e), transcript))?;
            guard.pressed.push(modifier);
        }

        Ok(guard)
    }

    /// Click `key` while the modifiers are held.
    #[track_caller]
    pub(crate) fn click(&mut self, key: Key, transcript: &str) -> KoeResult<()> {
        thread::sleep(KEY_EVENT_DELAY);
        self.enigo
            .key(key, Direction::Click)
            .map_err(|e| paste_error(format!("failed to press paste key: {}", e), transcript))?;
        thread::sleep(KEY_EVENT_DELAY);
        Ok(())
    }
}

impl Drop for PasteKeyGuard {
    fn drop(&mut self) {
        for &modifier in self.pressed.iter().rev() {
            let _ = self.enigo.key(modifier, Direction::Release);
        }
    }
}

#[track_caller]
fn paste_error(detail: String, transcript: &str) -> KoeError {
    KoeError::Insertion {
        message: format!("paste simulation failed: {}", detail),
        transcript_text: transcript.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}
