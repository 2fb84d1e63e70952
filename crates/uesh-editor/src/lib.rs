//! Editor buffers for UESH.
//!
//! Text, JSON and hex editors share one lifecycle, implemented once in
//! [`buffer::EditorBuffer`]: open a file, mutate the live content, query
//! it, save it back over the same stream, close it. Content-specific
//! operations live in [`text`], [`json`] and [`hex`].

mod autosave;
pub mod buffer;
pub mod hex;
pub mod json;
pub mod position;
pub mod query;
pub mod set;
pub mod text;

pub use buffer::{AutosaveSettings, BufferContent, BufferState, EditorBuffer};
pub use hex::{BytePattern, HexBuffer};
pub use json::{JsonBuffer, JsonFormat};
pub use position::Scope;
pub use query::{MatchMode, Pattern};
pub use set::EditorSet;
pub use text::{LineEnding, TextBuffer, TextLayout};

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;
    use std::io::Write;

    use super::*;

    fn open_text(lines: &[String]) -> (tempfile::NamedTempFile, TextBuffer) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(lines.join("\n").as_bytes()).unwrap();
        file.flush().unwrap();
        let mut buf = TextBuffer::new(AutosaveSettings::default());
        buf.open(file.path()).unwrap();
        (file, buf)
    }

    proptest! {
        #[test]
        fn text_dirty_round_trip(
            lines in prop::collection::vec("[a-z ]{1,12}", 0..8),
            added in "[a-z]{1,8}",
        ) {
            let (_file, buf) = open_text(&lines);
            prop_assert!(!buf.is_dirty());
            buf.add_line(&added).unwrap();
            prop_assert!(buf.is_dirty());
            buf.save(false).unwrap();
            prop_assert!(!buf.is_dirty());
        }

        #[test]
        fn text_save_is_idempotent(
            lines in prop::collection::vec("[a-z ]{1,12}", 1..8),
            added in "[a-z]{1,8}",
        ) {
            let (file, buf) = open_text(&lines);
            buf.add_line(&added).unwrap();
            buf.save(false).unwrap();
            let first = std::fs::read(file.path()).unwrap();
            buf.save(false).unwrap();
            prop_assert_eq!(first, std::fs::read(file.path()).unwrap());
        }

        #[test]
        fn hex_dirty_round_trip_and_idempotent_save(
            bytes in prop::collection::vec(any::<u8>(), 0..64),
            added in any::<u8>(),
        ) {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            file.write_all(&bytes).unwrap();
            file.flush().unwrap();
            let mut buf = HexBuffer::new(AutosaveSettings::default());
            buf.open(file.path()).unwrap();
            prop_assert!(!buf.is_dirty());
            buf.add_byte(added).unwrap();
            prop_assert!(buf.is_dirty());
            buf.save(false).unwrap();
            prop_assert!(!buf.is_dirty());
            let first = std::fs::read(file.path()).unwrap();
            buf.save(false).unwrap();
            prop_assert_eq!(&first, &std::fs::read(file.path()).unwrap());
            prop_assert_eq!(first.len(), bytes.len() + 1);
        }

        #[test]
        fn json_save_is_idempotent(key in "[a-z]{1,8}", value in any::<i64>()) {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            file.write_all(b"{}").unwrap();
            file.flush().unwrap();
            let mut buf = JsonBuffer::new(AutosaveSettings::default());
            buf.open(file.path()).unwrap();
            buf.add_property("", &key, serde_json::json!(value)).unwrap();
            prop_assert!(buf.is_dirty());
            buf.save(false).unwrap();
            prop_assert!(!buf.is_dirty());
            let first = std::fs::read(file.path()).unwrap();
            buf.save(false).unwrap();
            prop_assert_eq!(first, std::fs::read(file.path()).unwrap());
        }
    }
}
