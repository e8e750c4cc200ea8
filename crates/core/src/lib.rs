//! Packrat PEG engine producing lossless concrete syntax trees.
//!
//! A [`Grammar`] (built in code or loaded from JSON) is run over an input
//! string by a [`Parser`]. Every byte of the input ends up in the tree, either
//! as matched text or as whitespace/comment trivia, so a successful parse
//! reassembles exactly via [`CstNode::to_source`]. The main entry points are
//! [`parse`] for strict parsing and [`parse_with_diagnostics`] for parsing
//! with error recovery.

#![warn(missing_docs)]

/// Parser configuration.
pub mod config;
/// Concrete syntax tree nodes and trivia.
pub mod cst;
/// Serialization helpers.
pub mod dump;
pub mod engine;
/// Fatal errors of the strict parse entry point.
pub mod error;
/// Furthest-failure tracking.
pub mod failure;
/// Primitive matchers: literals, character classes, wildcard.
pub mod matchers;
/// Packrat cache and parse statistics.
pub mod memo;
/// Parse drivers and the public parse API.
pub mod parser;
/// Panic-mode error recovery.
pub mod recovery;
/// Result of a parse with diagnostics.
pub mod result;
/// Source positions, spans and the input cursor.
pub mod source;
/// Whitespace and comment scanning.
pub mod trivia;

// ── Convenience re-exports ──────────────────────────────────────────────────
// Flat imports for the most common entry points. The full module paths
// remain available for less common types.

// Parser
pub use parser::{Parser, parse, parse_with_diagnostics};
pub use config::ParserConfig;
pub use error::ParseError;
pub use result::ParseResult;
pub use memo::ParseStats;

// Tree
pub use cst::{CstNode, NodeRef, Trivia, TriviaKind};
pub use source::{SourceLocation, SourceSpan};

// Diagnostics (re-exported from the diagnostics crate)
pub use packrat_cst_diagnostics::{Diagnostic, Severity, Span, codes};

// Grammar (re-exported from the grammar crate)
pub use packrat_cst_grammar::{Grammar, GrammarBuilder, GrammarError, RuleId};

// Serialization helpers
pub use dump::to_pretty_json;
