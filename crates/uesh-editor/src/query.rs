//! Search patterns shared by the editor query and replace operations.

use regex::{Regex, RegexBuilder};

use uesh_types::error::{Result, UeshError};

/// How a pattern is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Plain substring.
    Literal,
    /// Regular expression (`regex` syntax).
    Regex,
}

/// A search pattern as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub text: String,
    pub mode: MatchMode,
}

impl Pattern {
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: MatchMode::Literal,
        }
    }

    pub fn regex(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: MatchMode::Regex,
        }
    }

    /// Compile into a matcher. Literal patterns are escaped and, when
    /// `ignore_case` is set, matched case-insensitively.
    pub fn compile(&self, ignore_case: bool) -> Result<Regex> {
        if self.text.is_empty() {
            return Err(UeshError::InvalidPattern("empty pattern".to_string()));
        }
        let source = match self.mode {
            MatchMode::Literal => regex::escape(&self.text),
            MatchMode::Regex => self.text.clone(),
        };
        RegexBuilder::new(&source)
            .case_insensitive(ignore_case && self.mode == MatchMode::Literal)
            .build()
            .map_err(|e| UeshError::InvalidPattern(e.to_string()))
    }
}

/// Compile a user-supplied bytes regex.
pub(crate) fn compile_bytes(source: &str) -> Result<regex::bytes::Regex> {
    regex::bytes::Regex::new(source).map_err(|e| UeshError::InvalidPattern(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_is_escaped() {
        let re = Pattern::literal("a.b").compile(false).unwrap();
        assert!(re.is_match("xa.by"));
        assert!(!re.is_match("axb"));
    }

    #[test]
    fn literal_ignore_case() {
        let re = Pattern::literal("FOO").compile(true).unwrap();
        assert!(re.is_match("a foo b"));
    }

    #[test]
    fn regex_keeps_case() {
        let re = Pattern::regex("^F.o$").compile(true).unwrap();
        assert!(re.is_match("Foo"));
        assert!(!re.is_match("foo"));
    }

    #[test]
    fn bad_regex_is_invalid_pattern() {
        let err = Pattern::regex("(unclosed").compile(false).unwrap_err();
        assert!(matches!(err, UeshError::InvalidPattern(_)));
    }

    #[test]
    fn empty_pattern_rejected() {
        assert!(Pattern::literal("").compile(false).is_err());
    }
}
