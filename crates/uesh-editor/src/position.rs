//! User-facing 1-based positions and their conversion to storage indices.
//!
//! Every editor command addresses lines and bytes starting at 1, with the
//! upper bound inclusive of the last unit. This module is the only place that
//! subtracts one.

use std::ops::Range;

use uesh_types::error::{Result, UeshError};

/// Which units of a buffer an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The whole buffer.
    All,
    /// A single 1-based unit.
    Unit(usize),
    /// An inclusive 1-based range.
    Range(usize, usize),
}

impl Scope {
    /// Build a scope from an optional start and end position.
    pub fn from_bounds(start: Option<usize>, end: Option<usize>) -> Self {
        match (start, end) {
            (None, _) => Self::All,
            (Some(s), None) => Self::Unit(s),
            (Some(s), Some(e)) => Self::Range(s, e),
        }
    }
}

/// Convert a 1-based `position` into a 0-based index into `len` units.
pub fn index_of(position: usize, len: usize, unit: &str) -> Result<usize> {
    if position == 0 || position > len {
        return Err(out_of_range(position, len, unit));
    }
    Ok(position - 1)
}

/// Convert an inclusive 1-based range into a 0-based half-open range.
pub fn range_of(start: usize, end: usize, len: usize, unit: &str) -> Result<Range<usize>> {
    let first = index_of(start, len, unit)?;
    let last = index_of(end, len, unit)?;
    if first > last {
        return Err(UeshError::OutOfRange(format!(
            "{unit} range {start}..{end} is reversed"
        )));
    }
    Ok(first..last + 1)
}

/// Resolve a scope against `len` units.
pub fn resolve(scope: Scope, len: usize, unit: &str) -> Result<Range<usize>> {
    match scope {
        Scope::All => Ok(0..len),
        Scope::Unit(p) => index_of(p, len, unit).map(|i| i..i + 1),
        Scope::Range(s, e) => range_of(s, e, len, unit),
    }
}

/// Parse a user-typed position. Non-numbers are parse errors; zero and
/// negative numbers are out of range.
pub fn parse_position(text: &str, unit: &str) -> Result<usize> {
    let value: i64 = text
        .trim()
        .parse()
        .map_err(|_| UeshError::Parse(format!("{unit} number expected, got '{text}'")))?;
    if value < 1 {
        return Err(UeshError::OutOfRange(format!(
            "{unit} {value}: positions start at 1"
        )));
    }
    usize::try_from(value)
        .map_err(|_| UeshError::OutOfRange(format!("{unit} {value} is too large")))
}

fn out_of_range(position: usize, len: usize, unit: &str) -> UeshError {
    if len == 0 {
        UeshError::OutOfRange(format!("{unit} {position}: buffer is empty"))
    } else {
        UeshError::OutOfRange(format!("{unit} {position} (valid: 1..={len})"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_position_is_inclusive() {
        assert_eq!(index_of(3, 3, "line").unwrap(), 2);
    }

    #[test]
    fn zero_is_rejected() {
        assert!(matches!(
            index_of(0, 3, "line"),
            Err(UeshError::OutOfRange(_))
        ));
    }

    #[test]
    fn past_end_is_rejected() {
        let err = index_of(5, 3, "line").unwrap_err();
        assert_eq!(err.to_string(), "out of range: line 5 (valid: 1..=3)");
    }

    #[test]
    fn empty_buffer_rejects_everything() {
        let err = index_of(1, 0, "byte").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn range_conversion() {
        assert_eq!(range_of(2, 4, 5, "line").unwrap(), 1..4);
        assert_eq!(range_of(5, 5, 5, "line").unwrap(), 4..5);
        assert!(range_of(4, 2, 5, "line").is_err());
        assert!(range_of(1, 6, 5, "line").is_err());
    }

    #[test]
    fn resolve_scopes() {
        assert_eq!(resolve(Scope::All, 3, "line").unwrap(), 0..3);
        assert_eq!(resolve(Scope::All, 0, "line").unwrap(), 0..0);
        assert_eq!(resolve(Scope::Unit(2), 3, "line").unwrap(), 1..2);
        assert_eq!(resolve(Scope::Range(1, 3), 3, "line").unwrap(), 0..3);
    }

    #[test]
    fn scope_from_bounds() {
        assert_eq!(Scope::from_bounds(None, None), Scope::All);
        assert_eq!(Scope::from_bounds(Some(2), None), Scope::Unit(2));
        assert_eq!(Scope::from_bounds(Some(2), Some(4)), Scope::Range(2, 4));
    }

    #[test]
    fn parse_positions() {
        assert_eq!(parse_position("7", "line").unwrap(), 7);
        assert!(matches!(
            parse_position("0", "line"),
            Err(UeshError::OutOfRange(_))
        ));
        assert!(matches!(
            parse_position("-2", "line"),
            Err(UeshError::OutOfRange(_))
        ));
        assert!(matches!(
            parse_position("two", "line"),
            Err(UeshError::Parse(_))
        ));
    }
}
