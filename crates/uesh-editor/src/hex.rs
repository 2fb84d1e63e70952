//! Hex editor buffer: raw bytes.

use std::fmt::Write as _;

use regex::bytes::{NoExpand, Regex};
use uesh_types::error::{Result, UeshError};
use uesh_types::kind::EditorKind;

use crate::buffer::{BufferContent, EditorBuffer};
use crate::position::{self, Scope};
use crate::query::compile_bytes;

/// Buffer holding the bytes of a binary file.
pub type HexBuffer = EditorBuffer<Vec<u8>>;

/// Bytes shown per row by [`dump`].
pub const BYTES_PER_ROW: usize = 16;

impl BufferContent for Vec<u8> {
    type Format = ();
    const KIND: EditorKind = EditorKind::Hex;

    fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bytes.to_vec())
    }

    fn encode(&self, _format: &()) -> Result<Vec<u8>> {
        Ok(self.clone())
    }

    fn empty() -> Self {
        Vec::new()
    }
}

/// Parse hex digits (whitespace and `0x` prefixes allowed) into bytes.
pub fn parse_bytes(text: &str) -> Result<Vec<u8>> {
    let digits: String = text
        .split_whitespace()
        .map(|t| {
            t.strip_prefix("0x")
                .or_else(|| t.strip_prefix("0X"))
                .unwrap_or(t)
        })
        .collect();
    if digits.is_empty() {
        return Err(UeshError::Parse("no hex bytes given".to_string()));
    }
    hex::decode(&digits).map_err(|e| UeshError::Parse(format!("'{text}': {e}")))
}

/// Parse exactly one byte, e.g. `0F` or `0x0f`.
pub fn parse_byte(text: &str) -> Result<u8> {
    match parse_bytes(text)?.as_slice() {
        [b] => Ok(*b),
        _ => Err(UeshError::Parse(format!("'{text}' is not a single byte"))),
    }
}

/// Render bytes as rows of [`BYTES_PER_ROW`], prefixed with the storage
/// offset of the row's first byte.
pub fn dump(bytes: &[u8], first_index: usize) -> Vec<String> {
    bytes
        .chunks(BYTES_PER_ROW)
        .enumerate()
        .map(|(row, chunk)| {
            let mut line = format!("0x{:08X} ", first_index + row * BYTES_PER_ROW);
            for b in chunk {
                let _ = write!(line, " {b:02X}");
            }
            line
        })
        .collect()
}

/// What a hex query searches for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BytePattern {
    /// An exact byte sequence.
    Bytes(Vec<u8>),
    /// A `regex::bytes` expression, matched with Unicode mode off so that
    /// `\xFF` means the byte 0xFF.
    Regex(String),
}

impl BytePattern {
    fn compile(&self) -> Result<Regex> {
        match self {
            Self::Bytes(bytes) if bytes.is_empty() => {
                Err(UeshError::InvalidPattern("empty byte pattern".to_string()))
            },
            Self::Bytes(bytes) => {
                let mut source = String::from("(?s-u:");
                for b in bytes {
                    let _ = write!(source, "\\x{b:02X}");
                }
                source.push(')');
                compile_bytes(&source)
            },
            Self::Regex(source) => compile_bytes(&format!("(?-u:{source})")),
        }
    }
}

/// One match found by a [`HexQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexMatch<'a> {
    /// 0-based storage index of the first matched byte.
    pub index: usize,
    pub bytes: &'a [u8],
}

impl HexMatch<'_> {
    /// 1-based position of the first matched byte.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

/// Read-only result of a hex query over a snapshot of the scoped bytes.
#[derive(Debug, Clone)]
pub struct HexQuery {
    bytes: Vec<u8>,
    first: usize,
    matcher: Regex,
}

impl HexQuery {
    pub fn iter(&self) -> impl Iterator<Item = HexMatch<'_>> + '_ {
        self.matcher.find_iter(&self.bytes).map(|m| HexMatch {
            index: self.first + m.start(),
            bytes: m.as_bytes(),
        })
    }

    pub fn indices(&self) -> Vec<usize> {
        self.iter().map(|m| m.index).collect()
    }
}

impl EditorBuffer<Vec<u8>> {
    pub fn byte_count(&self) -> Result<usize> {
        self.read(|bytes| bytes.len())
    }

    /// Bytes in `scope` together with the storage index of the first one.
    pub fn slice(&self, scope: Scope) -> Result<(usize, Vec<u8>)> {
        self.read(|bytes| {
            let range = position::resolve(scope, bytes.len(), "byte")?;
            Ok((range.start, bytes[range].to_vec()))
        })?
    }

    /// Append a byte, returning its 1-based position.
    pub fn add_byte(&self, byte: u8) -> Result<usize> {
        self.mutate(|bytes| {
            bytes.push(byte);
            Ok(bytes.len())
        })
    }

    /// Append several bytes, returning how many were added.
    pub fn add_bytes(&self, new_bytes: &[u8]) -> Result<usize> {
        self.mutate(|bytes| {
            bytes.extend_from_slice(new_bytes);
            Ok(new_bytes.len())
        })
    }

    /// Remove the byte at a 1-based position, returning it.
    pub fn delete_byte(&self, pos: usize) -> Result<u8> {
        self.mutate(|bytes| {
            let i = position::index_of(pos, bytes.len(), "byte")?;
            Ok(bytes.remove(i))
        })
    }

    /// Remove an inclusive range of bytes, returning how many were removed.
    pub fn delete_bytes(&self, start: usize, end: usize) -> Result<usize> {
        self.mutate(|bytes| {
            let range = position::range_of(start, end, bytes.len(), "byte")?;
            Ok(bytes.drain(range).count())
        })
    }

    /// Replace every match of `pattern` within `scope` with `with`,
    /// returning the number of matches. Replacement bytes are inserted
    /// verbatim and may differ in length from what they replace.
    pub fn replace(&self, pattern: &BytePattern, with: &[u8], scope: Scope) -> Result<usize> {
        let matcher = pattern.compile()?;
        self.mutate(|bytes| {
            let range = position::resolve(scope, bytes.len(), "byte")?;
            let count = matcher.find_iter(&bytes[range.clone()]).count();
            if count == 0 {
                return Ok(0);
            }
            let replaced = matcher
                .replace_all(&bytes[range.clone()], NoExpand(with))
                .into_owned();
            let _ = bytes.splice(range, replaced);
            Ok(count)
        })
    }

    /// Search the bytes in `scope`.
    pub fn query(&self, pattern: &BytePattern, scope: Scope) -> Result<HexQuery> {
        let matcher = pattern.compile()?;
        self.read(|bytes| {
            let range = position::resolve(scope, bytes.len(), "byte")?;
            Ok(HexQuery {
                first: range.start,
                bytes: bytes[range].to_vec(),
                matcher,
            })
        })?
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::buffer::AutosaveSettings;

    fn open_with(content: &[u8]) -> (tempfile::NamedTempFile, HexBuffer) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        let mut buf = HexBuffer::new(AutosaveSettings::default());
        buf.open(file.path()).unwrap();
        (file, buf)
    }

    #[test]
    fn parse_single_and_multiple_bytes() {
        assert_eq!(parse_byte("0F").unwrap(), 0x0F);
        assert_eq!(parse_byte("0xff").unwrap(), 0xFF);
        assert_eq!(parse_bytes("0A 0B0C").unwrap(), vec![0x0A, 0x0B, 0x0C]);
        assert!(parse_byte("0A0B").is_err());
        assert!(parse_byte("zz").is_err());
        assert!(parse_bytes("   ").is_err());
    }

    #[test]
    fn dump_rows() {
        let bytes: Vec<u8> = (0u8..20).collect();
        let rows = dump(&bytes, 0);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("0x00000000  00 01"));
        assert_eq!(rows[1], "0x00000010  10 11 12 13");
    }

    #[test]
    fn add_delete_and_save_raw_bytes() {
        let (file, buf) = open_with(&[0x00, 0xFF]);
        assert_eq!(buf.add_byte(0x7F).unwrap(), 3);
        assert_eq!(buf.delete_byte(1).unwrap(), 0x00);
        assert!(buf.is_dirty());
        buf.save(false).unwrap();
        assert!(!buf.is_dirty());
        assert_eq!(std::fs::read(file.path()).unwrap(), vec![0xFF, 0x7F]);
    }

    #[test]
    fn delete_past_end_is_out_of_range() {
        let (_file, buf) = open_with(&[1, 2, 3]);
        assert!(matches!(buf.delete_byte(4), Err(UeshError::OutOfRange(_))));
        assert_eq!(buf.delete_byte(3).unwrap(), 3);
        assert!(matches!(
            buf.delete_bytes(1, 3),
            Err(UeshError::OutOfRange(_))
        ));
        assert_eq!(buf.content().unwrap(), vec![1, 2]);
    }

    #[test]
    fn replace_byte_in_range() {
        let (_file, buf) = open_with(&[1, 1, 1, 1]);
        let count = buf
            .replace(&BytePattern::Bytes(vec![1]), &[9], Scope::Range(2, 3))
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(buf.content().unwrap(), vec![1, 9, 9, 1]);
    }

    #[test]
    fn replace_sequence_changes_length() {
        let (file, buf) = open_with(&[0xDE, 0xAD, 0x00, 0xDE, 0xAD]);
        let count = buf
            .replace(&BytePattern::Bytes(vec![0xDE, 0xAD]), &[0xBE, 0xEF, 0x01], Scope::All)
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            buf.content().unwrap(),
            vec![0xBE, 0xEF, 0x01, 0x00, 0xBE, 0xEF, 0x01]
        );
        buf.save(false).unwrap();
        assert_eq!(std::fs::read(file.path()).unwrap().len(), 7);
    }

    #[test]
    fn replace_regex_on_high_bytes() {
        let (_file, buf) = open_with(&[0x10, 0xF0, 0xF1, 0x20, 0xFF]);
        let pattern = BytePattern::Regex(r"[\xF0-\xFF]+".to_string());
        assert_eq!(buf.replace(&pattern, &[0x00], Scope::All).unwrap(), 2);
        assert_eq!(buf.content().unwrap(), vec![0x10, 0x00, 0x20, 0x00]);
    }

    #[test]
    fn replace_without_match_stays_clean() {
        let (_file, buf) = open_with(&[1, 2, 3]);
        assert_eq!(
            buf.replace(&BytePattern::Bytes(vec![9]), &[8], Scope::All)
                .unwrap(),
            0
        );
        assert!(!buf.is_dirty());
        assert!(matches!(
            buf.replace(&BytePattern::Regex("(".to_string()), &[8], Scope::All),
            Err(UeshError::InvalidPattern(_))
        ));
    }

    #[test]
    fn query_byte_sequence_including_high_bytes() {
        let (_file, buf) = open_with(&[0xFF, 0x00, 0xFF, 0x00, 0x01]);
        let query = buf
            .query(&BytePattern::Bytes(vec![0xFF, 0x00]), Scope::All)
            .unwrap();
        assert_eq!(query.indices(), vec![0, 2]);
        let ranged = buf
            .query(&BytePattern::Bytes(vec![0xFF]), Scope::Range(2, 5))
            .unwrap();
        let matches: Vec<_> = ranged.iter().collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].number(), 3);
        assert_eq!(matches[0].bytes, &[0xFF]);
    }

    #[test]
    fn query_bytes_regex() {
        let (_file, buf) = open_with(b"ab12cd3");
        let query = buf
            .query(&BytePattern::Regex("[0-9]+".to_string()), Scope::All)
            .unwrap();
        let found: Vec<&[u8]> = query.iter().map(|m| m.bytes).collect();
        assert_eq!(found, vec![&b"12"[..], &b"3"[..]]);
    }

    #[test]
    fn slice_reports_first_index() {
        let (_file, buf) = open_with(&[5, 6, 7]);
        assert_eq!(buf.slice(Scope::Range(2, 3)).unwrap(), (1, vec![6, 7]));
    }
}
