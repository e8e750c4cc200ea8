use packrat_cst_diagnostics::{Diagnostic, Severity, render_all};
use serde::Serialize;

use crate::cst::NodeRef;
use crate::memo::ParseStats;

/// Outcome of [`Parser::parse_with_diagnostics`](crate::Parser::parse_with_diagnostics).
///
/// `node` is the best-effort tree: the full CST on success, the valid prefix
/// with an `Error` node appended when input was left over, a lone `Error`
/// node when the root rule failed, and `None` only when the input was
/// rejected before parsing.
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    /// Root of the tree, if one was built.
    pub node: Option<NodeRef>,
    /// Diagnostics in the order they were produced.
    pub diagnostics: Vec<Diagnostic>,
    /// The parsed input.
    #[serde(skip)]
    pub source: String,
    /// Cache and evaluation counters.
    pub stats: ParseStats,
}

impl ParseResult {
    /// A tree was built and nothing went wrong.
    pub fn is_success(&self) -> bool {
        self.node.is_some() && !self.has_errors()
    }

    /// At least one error diagnostic was produced.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Number of error diagnostics.
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Number of warning diagnostics.
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warn)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Render every diagnostic against the source, reporting `filename`.
    pub fn format_diagnostics(&self, filename: &str) -> String {
        render_all(&self.diagnostics, &self.source, filename)
    }
}
