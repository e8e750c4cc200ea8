use crate::char_class::CharClassError;

/// Reasons a grammar table is rejected.
///
/// These are programmer errors in the grammar itself. Ordinary input
/// mismatches never produce a `GrammarError`.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GrammarError {
    /// The grammar defines no rules.
    #[error("grammar defines no rules")]
    EmptyGrammar,
    /// Two rules share a name.
    #[error("rule `{0}` is defined more than once")]
    DuplicateRule(String),
    /// A rule body references a rule that does not exist.
    #[error("rule `{rule}` references undefined rule `{reference}`")]
    UnknownRule {
        /// Rule whose body contains the reference.
        rule: String,
        /// The missing rule name.
        reference: String,
    },
    /// The configured root rule does not exist.
    #[error("root rule `{0}` is not defined")]
    UnknownRoot(String),
    /// A character class in a rule body failed to compile.
    #[error("rule `{rule}`: invalid character class `[{pattern}]`: {source}")]
    InvalidCharClass {
        /// Rule containing the class.
        rule: String,
        /// The pattern as written.
        pattern: String,
        /// Underlying compile error.
        source: CharClassError,
    },
    /// The document's format major version is not supported.
    #[error("unsupported grammar format version {found} (expected {expected})")]
    UnsupportedFormat {
        /// Version found in the document.
        found: String,
        /// Version this build understands.
        expected: &'static str,
    },
    /// The document is not valid grammar JSON.
    #[error("invalid grammar document: {0}")]
    Json(#[from] serde_json::Error),
}
