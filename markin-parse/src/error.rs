use std::fmt;

use serde::{Deserialize, Serialize};

/// Position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// 0-based byte offset.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
}

impl Location {
    /// Resolve a byte offset within `source` to a line/column location.
    ///
    /// Offsets past the end of `source` resolve to the position just after
    /// the last character.
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        Location {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Errors that can occur during parsing.
///
/// Parsing is all-or-nothing: any of these aborts the whole parse call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Unterminated inline delimiter '{delimiter}' at {location}")]
    UnterminatedInlineDelimiter { delimiter: String, location: Location },

    #[error("Malformed paragraph: unexpected character at {location}")]
    MalformedParagraph { location: Location },

    #[error("Could not parse block at {location}")]
    UnparsableBlock { location: Location },

    #[error("List nesting exceeds the maximum depth of {max_depth} at {location}")]
    NestingTooDeep { max_depth: usize, location: Location },
}

impl ParseError {
    /// Where in the source the failure was detected.
    pub fn location(&self) -> Location {
        match self {
            ParseError::UnterminatedInlineDelimiter { location, .. }
            | ParseError::MalformedParagraph { location }
            | ParseError::UnparsableBlock { location }
            | ParseError::NestingTooDeep { location, .. } => *location,
        }
    }
}

/// Errors that can occur while decoding the JSON wire form.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected {expected} but found {found}")]
    UnexpectedElement { expected: &'static str, found: String },

    #[error("Header level {0} is outside 1..=6")]
    InvalidHeaderLevel(u64),

    #[error("{0} must not be empty")]
    EmptyContainer(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn location_first_character() {
        let loc = Location::from_offset("abc", 0);
        assert_eq!(loc, Location { offset: 0, line: 1, column: 1 });
    }

    #[test]
    fn location_counts_lines_and_chars() {
        let source = "first\nsé*cond\n";
        let offset = source.find('*').unwrap();
        let loc = Location::from_offset(source, offset);
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 3);
    }

    #[test]
    fn location_clamps_past_end() {
        let loc = Location::from_offset("ab\n", 99);
        assert_eq!(loc.offset, 3);
        assert_eq!(loc.line, 2);
        assert_eq!(loc.column, 1);
    }

    #[test]
    fn parse_error_display_includes_location() {
        let err = ParseError::UnterminatedInlineDelimiter {
            delimiter: "*".into(),
            location: Location { offset: 4, line: 1, column: 5 },
        };
        assert_eq!(
            err.to_string(),
            "Unterminated inline delimiter '*' at line 1, column 5"
        );
        assert_eq!(err.location().column, 5);
    }
}
