use packrat_cst_diagnostics::codes;

use crate::source::SourceLocation;

/// Fatal result of the strict [`Parser::parse`](crate::Parser::parse) entry
/// point.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The root rule did not match.
    #[error("syntax error at {location}: expected {expected}, found {found}")]
    Unexpected {
        /// Furthest point any alternative reached.
        location: SourceLocation,
        /// What would have let parsing continue there.
        expected: String,
        /// What was there instead.
        found: String,
    },
    /// The root rule matched, but input remained after it.
    #[error("unparsed input at {location}: expected {expected}, found {found}")]
    TrailingInput {
        /// Furthest failure at or after the remainder, or the remainder itself.
        location: SourceLocation,
        /// What would have let parsing continue there.
        expected: String,
        /// What was there instead.
        found: String,
    },
    /// The input was rejected before parsing.
    #[error("input is {size} bytes, over the {limit}-byte limit")]
    InputTooLarge {
        /// Input length in bytes.
        size: usize,
        /// Configured limit in bytes.
        limit: usize,
    },
}

impl ParseError {
    /// Where parsing stopped, when the error has a location.
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            ParseError::Unexpected { location, .. } | ParseError::TrailingInput { location, .. } => {
                Some(*location)
            }
            ParseError::InputTooLarge { .. } => None,
        }
    }

    /// The diagnostic code the lenient API reports for the same condition.
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::Unexpected { .. } => codes::UNEXPECTED_INPUT,
            ParseError::TrailingInput { .. } => codes::TRAILING_INPUT,
            ParseError::InputTooLarge { .. } => codes::INPUT_TOO_LARGE,
        }
    }
}
