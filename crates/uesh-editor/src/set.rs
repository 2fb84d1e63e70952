//! The three editor buffers owned by a shell environment.

use uesh_types::config::EditorConfigs;
use uesh_types::error::Result;
use uesh_types::kind::EditorKind;

use crate::buffer::{AutosaveSettings, BufferState};
use crate::hex::HexBuffer;
use crate::json::{JsonBuffer, JsonFormat};
use crate::text::TextBuffer;

/// One buffer per editor kind.
pub struct EditorSet {
    pub text: TextBuffer,
    pub json: JsonBuffer,
    pub hex: HexBuffer,
}

impl EditorSet {
    /// Closed buffers configured from the editor settings.
    pub fn from_config(config: &EditorConfigs) -> Self {
        let json_format = if config.json.indented {
            JsonFormat::Indented
        } else {
            JsonFormat::Compact
        };
        Self {
            text: TextBuffer::new(AutosaveSettings::from(&config.text)),
            json: JsonBuffer::with_format(AutosaveSettings::from(&config.json), json_format),
            hex: HexBuffer::new(AutosaveSettings::from(&config.hex)),
        }
    }

    pub fn is_open(&self, kind: EditorKind) -> bool {
        self.state(kind) != BufferState::Closed
    }

    pub fn state(&self, kind: EditorKind) -> BufferState {
        match kind {
            EditorKind::Text => self.text.state(),
            EditorKind::Json => self.json.state(),
            EditorKind::Hex => self.hex.state(),
        }
    }

    /// Close the buffer of `kind`.
    pub fn close(&mut self, kind: EditorKind) -> Result<()> {
        match kind {
            EditorKind::Text => self.text.close(),
            EditorKind::Json => self.json.close(),
            EditorKind::Hex => self.hex.close(),
        }
    }

    /// Save the buffer of `kind`.
    pub fn save(&self, kind: EditorKind, clear_after: bool) -> Result<()> {
        match kind {
            EditorKind::Text => self.text.save(clear_after),
            EditorKind::Json => self.json.save(clear_after),
            EditorKind::Hex => self.hex.save(clear_after),
        }
    }

    /// Close every open buffer, discarding unsaved edits.
    pub fn close_all(&mut self) {
        for kind in [EditorKind::Text, EditorKind::Json, EditorKind::Hex] {
            if self.is_open(kind)
                && let Err(e) = self.close(kind)
            {
                log::warn!("closing {kind} buffer failed: {e}");
            }
        }
    }
}

impl Default for EditorSet {
    fn default() -> Self {
        Self::from_config(&EditorConfigs::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_json_follows_config() {
        let mut config = EditorConfigs::default();
        config.json.indented = false;
        config.json.autosave = false;
        let set = EditorSet::from_config(&config);
        assert_eq!(set.json.format(), JsonFormat::Compact);
        assert!(!set.json.autosave().enabled);
        assert!(set.text.autosave().enabled);
    }

    #[test]
    fn open_and_close_by_kind() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut set = EditorSet::default();
        assert!(!set.is_open(EditorKind::Hex));
        set.hex.open(file.path()).unwrap();
        assert!(set.is_open(EditorKind::Hex));
        assert!(!set.is_open(EditorKind::Text));
        set.close(EditorKind::Hex).unwrap();
        assert!(!set.is_open(EditorKind::Hex));
        assert!(set.close(EditorKind::Hex).is_err());
    }

    #[test]
    fn close_all_closes_everything() {
        let a = tempfile::NamedTempFile::new().unwrap();
        let b = tempfile::NamedTempFile::new().unwrap();
        let mut set = EditorSet::default();
        set.text.open(a.path()).unwrap();
        set.hex.open(b.path()).unwrap();
        set.close_all();
        assert_eq!(set.state(EditorKind::Text), BufferState::Closed);
        assert_eq!(set.state(EditorKind::Hex), BufferState::Closed);
    }
}
