use crate::config::{DEFAULT_PASTE_KEY, DEFAULT_PASTE_MODIFIER};

use serde::{Deserialize, Serialize};

/// Paste chord used to insert the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasteConfig {
    /// Modifier part of the chord, `+`-separated (e.g. `ctrl`, `ctrl+shift`).
    pub modifier: String,
    /// Key pressed while the modifiers are held.
    pub key: String,
}

impl PasteConfig {
    /// Lower-cased modifier names in press order.
    pub fn modifiers(&self) -> Vec<String> {
        self.modifier
            .split('+')
            .map(|part| part.trim().to_lowercase())
            .filter(|part| !part.is_empty())
            .collect()
    }
}

impl Default for PasteConfig {
    fn default() -> Self {
        Self {
            modifier: DEFAULT_PASTE_MODIFIER.to_string(),
            key: DEFAULT_PASTE_KEY.to_string(),
        }
    }
}
