//! Text editor buffer: a list of lines.

use std::ops::Range;

use regex::{NoExpand, Regex};
use uesh_types::error::{Result, UeshError};
use uesh_types::kind::EditorKind;

use crate::buffer::{BufferContent, EditorBuffer};
use crate::position::{self, Scope};
use crate::query::{MatchMode, Pattern};

/// Buffer holding the lines of a text file.
pub type TextBuffer = EditorBuffer<Vec<String>>;

/// Line terminator written between lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// How a text file lays out its lines. Detected on open and reused on
/// save, so an unedited file is written back byte for byte.
///
/// The first line break decides the ending for the whole file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextLayout {
    pub line_ending: LineEnding,
    pub trailing_newline: bool,
}

impl TextLayout {
    pub fn detect(bytes: &[u8]) -> Self {
        let line_ending = match bytes.iter().position(|&b| b == b'\n') {
            Some(i) if i > 0 && bytes[i - 1] == b'\r' => LineEnding::CrLf,
            _ => LineEnding::Lf,
        };
        Self {
            line_ending,
            trailing_newline: bytes.ends_with(b"\n"),
        }
    }
}

impl BufferContent for Vec<String> {
    type Format = TextLayout;
    const KIND: EditorKind = EditorKind::Text;

    fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        let layout = TextLayout::detect(bytes);
        let text = String::from_utf8_lossy(bytes);
        let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        if layout.trailing_newline {
            lines.pop();
        }
        if layout.line_ending == LineEnding::CrLf {
            for line in &mut lines {
                if line.ends_with('\r') {
                    line.pop();
                }
            }
        }
        Ok(lines)
    }

    fn encode(&self, layout: &TextLayout) -> Result<Vec<u8>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        let eol = layout.line_ending.as_str();
        let mut text = self.join(eol);
        if layout.trailing_newline {
            text.push_str(eol);
        }
        Ok(text.into_bytes())
    }

    fn empty() -> Self {
        Vec::new()
    }

    fn detect_format(bytes: &[u8]) -> Option<TextLayout> {
        Some(TextLayout::detect(bytes))
    }
}

/// One line matched by a [`TextQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatch<'a> {
    /// 0-based storage index of the line.
    pub index: usize,
    pub line: &'a str,
    /// Byte ranges of every match within the line.
    pub spans: Vec<Range<usize>>,
}

impl TextMatch<'_> {
    /// 1-based line number, as shown to the user.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    /// 1-based character columns where each match starts.
    pub fn columns(&self) -> Vec<usize> {
        self.spans
            .iter()
            .map(|s| self.line[..s.start].chars().count() + 1)
            .collect()
    }
}

/// Read-only result of a text query over a snapshot of the scoped lines.
///
/// Matching happens lazily in [`TextQuery::iter`], which can be called any
/// number of times.
#[derive(Debug, Clone)]
pub struct TextQuery {
    lines: Vec<String>,
    first: usize,
    matcher: Regex,
}

impl TextQuery {
    pub fn iter(&self) -> impl Iterator<Item = TextMatch<'_>> + '_ {
        self.lines.iter().enumerate().filter_map(move |(i, line)| {
            let spans: Vec<Range<usize>> =
                self.matcher.find_iter(line).map(|m| m.range()).collect();
            (!spans.is_empty()).then(|| TextMatch {
                index: self.first + i,
                line,
                spans,
            })
        })
    }

    /// 0-based indices of the matching lines.
    pub fn indices(&self) -> Vec<usize> {
        self.iter().map(|m| m.index).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl EditorBuffer<Vec<String>> {
    pub fn line_count(&self) -> Result<usize> {
        self.read(|lines| lines.len())
    }

    /// The text of a 1-based line.
    pub fn line(&self, line: usize) -> Result<String> {
        self.read(|lines| position::index_of(line, lines.len(), "line").map(|i| lines[i].clone()))?
    }

    /// Lines in `scope`, paired with their 1-based numbers.
    pub fn lines(&self, scope: Scope) -> Result<Vec<(usize, String)>> {
        self.read(|lines| {
            let range = position::resolve(scope, lines.len(), "line")?;
            Ok(range.map(|i| (i + 1, lines[i].clone())).collect())
        })?
    }

    /// Append a line, returning its 1-based number.
    pub fn add_line(&self, text: &str) -> Result<usize> {
        self.mutate(|lines| {
            lines.push(text.to_string());
            Ok(lines.len())
        })
    }

    /// Append several lines, returning how many were added.
    pub fn add_lines<I, S>(&self, new_lines: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let new_lines: Vec<String> = new_lines.into_iter().map(Into::into).collect();
        self.mutate(|lines| {
            let added = new_lines.len();
            lines.extend(new_lines);
            Ok(added)
        })
    }

    /// Replace the whole text of a line.
    pub fn edit_line(&self, line: usize, text: &str) -> Result<()> {
        self.mutate(|lines| {
            let i = position::index_of(line, lines.len(), "line")?;
            lines[i] = text.to_string();
            Ok(())
        })
    }

    /// Remove a line, returning its text.
    pub fn delete_line(&self, line: usize) -> Result<String> {
        self.mutate(|lines| {
            let i = position::index_of(line, lines.len(), "line")?;
            Ok(lines.remove(i))
        })
    }

    /// Remove an inclusive range of lines, returning how many were removed.
    pub fn delete_lines(&self, start: usize, end: usize) -> Result<usize> {
        self.mutate(|lines| {
            let range = position::range_of(start, end, lines.len(), "line")?;
            Ok(lines.drain(range).count())
        })
    }

    /// Remove every occurrence of `word` from a line, returning the count.
    pub fn delete_word(&self, word: &str, line: usize) -> Result<usize> {
        let matcher = Pattern::literal(word).compile(false)?;
        self.mutate(|lines| {
            let i = position::index_of(line, lines.len(), "line")?;
            let count = matcher.find_iter(&lines[i]).count();
            if count > 0 {
                lines[i] = matcher.replace_all(&lines[i], "").into_owned();
            }
            Ok(count)
        })
    }

    /// Remove the character at a 1-based column of a line.
    pub fn delete_char(&self, column: usize, line: usize) -> Result<char> {
        self.mutate(|lines| {
            let i = position::index_of(line, lines.len(), "line")?;
            let text = &mut lines[i];
            let c = position::index_of(column, text.chars().count(), "character")?;
            let (offset, ch) = text.char_indices().nth(c).ok_or_else(|| {
                UeshError::OutOfRange(format!("character {column} of line {line}"))
            })?;
            text.remove(offset);
            Ok(ch)
        })
    }

    /// Replace matches of `pattern` within `scope`, returning how many were
    /// replaced. Literal patterns are case-sensitive and `with` is inserted
    /// verbatim; regex replacements may use `$1`-style group references.
    pub fn replace(&self, pattern: &Pattern, with: &str, scope: Scope) -> Result<usize> {
        let matcher = pattern.compile(false)?;
        self.mutate(|lines| {
            let range = position::resolve(scope, lines.len(), "line")?;
            let mut total = 0;
            for line in &mut lines[range] {
                let count = matcher.find_iter(line.as_str()).count();
                if count == 0 {
                    continue;
                }
                total += count;
                *line = match pattern.mode {
                    MatchMode::Literal => matcher
                        .replace_all(line.as_str(), NoExpand(with))
                        .into_owned(),
                    MatchMode::Regex => matcher.replace_all(line.as_str(), with).into_owned(),
                };
            }
            Ok(total)
        })
    }

    /// Search the lines in `scope`. Literal patterns ignore case.
    pub fn query(&self, pattern: &Pattern, scope: Scope) -> Result<TextQuery> {
        let matcher = pattern.compile(true)?;
        self.read(|lines| {
            let range = position::resolve(scope, lines.len(), "line")?;
            Ok(TextQuery {
                first: range.start,
                lines: lines[range].to_vec(),
                matcher,
            })
        })?
    }
}
