//! Diagnostics for packrat-cst.
//!
//! Provides [`Diagnostic`], [`Severity`], [`Span`], [`Label`], and
//! [`LineIndex`] types used to report parse failures with source context, and
//! the plain-text formatter in [`render`]. Diagnostic codes are defined in the
//! [`codes`] module.

#![warn(missing_docs)]

/// Diagnostic ID constants.
pub mod codes;
/// Plain-text rendering of diagnostics with source excerpts.
pub mod render;

pub use render::{render, render_all};

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

// ── LineIndex ────────────────────────────────────────────────────────────

/// Maps byte offsets in a source string to line and column positions.
///
/// Lines and columns are **0-indexed** internally. Use [`LineIndex::line_col`]
/// to get a `(line, col)` pair and add 1 when displaying to users.
///
/// The index is built in O(n) time and each lookup is O(log n) via binary
/// search.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset of the start of each line.
    /// `line_starts[0]` is always 0.
    line_starts: Vec<usize>,
    /// Total length of the indexed text in bytes.
    len: usize,
}

impl LineIndex {
    /// Build a `LineIndex` from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0usize];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// Convert a byte offset to a 0-indexed `(line, byte column)` pair.
    ///
    /// If `offset` is past the end of the source, the last line is returned
    /// with the column measured from that line's start.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next.saturating_sub(1),
        };
        let col = offset.saturating_sub(self.line_starts[line]);
        (line, col)
    }

    /// Byte offset of the start of the given 0-indexed line.
    ///
    /// Returns `None` if `line` is out of bounds.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Byte offset one past the last content byte of the given line,
    /// excluding its `\n` (and a preceding `\r`).
    pub fn line_end(&self, text: &str, line: usize) -> Option<usize> {
        let start = self.line_start(line)?;
        let mut end = self
            .line_starts
            .get(line + 1)
            .map_or(self.len, |next| next - 1);
        if end > start && text.as_bytes().get(end - 1) == Some(&b'\r') {
            end -= 1;
        }
        Some(end)
    }

    /// Total number of lines (at least 1, even for empty input).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// Severity level for a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Severity {
    /// Hard error; the input is invalid.
    Error,
    /// Warning; the input parsed, but something looks wrong.
    Warn,
    /// Informational note.
    Info,
}

/// Byte span in the source input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Span {
    /// Byte offset of the first character (0-based).
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl Span {
    /// Create a span covering `[start, end)`.
    ///
    /// Panics if `end < start`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(end >= start, "Span end ({end}) < start ({start})");
        Self { start, end }
    }

    /// Create a zero-width span at the given position.
    pub fn empty(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// How a label is drawn under the source excerpt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelStyle {
    /// The main location of the problem, underlined with `^`.
    Primary,
    /// Supporting context, underlined with `-`.
    Secondary,
}

/// An annotated region of source attached to a [`Diagnostic`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// The annotated byte span.
    pub span: Span,
    /// Inline message printed after the underline; may be empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    /// Primary or secondary marker.
    pub style: LabelStyle,
}

impl Label {
    /// A primary (`^`) label.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Primary,
        }
    }

    /// A secondary (`-`) label.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Secondary,
        }
    }
}

/// A diagnostic message produced by the parser.
///
/// Labels and notes keep their insertion order so rendering is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Optional diagnostic code (e.g., `"PEG0001"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Cow<'static, str>>,
    /// Severity level.
    pub severity: Severity,
    /// Human-readable diagnostic message.
    pub message: String,
    /// Primary byte span in the source input.
    pub span: Span,
    /// Annotated regions, in insertion order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
    /// Trailing notes, in insertion order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    /// Machine-readable context for tooling. Keys and values are free-form strings.
    ///
    /// Uses `BTreeMap` for deterministic key ordering in serialized output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<BTreeMap<String, String>>,
}

impl Diagnostic {
    /// Create an uncoded diagnostic.
    pub fn new(severity: Severity, message: impl Into<String>, span: Span) -> Self {
        Self {
            code: None,
            severity,
            message: message.into(),
            span,
            labels: Vec::new(),
            notes: Vec::new(),
            context: None,
        }
    }

    /// Shorthand for an `Error` diagnostic with a code.
    pub fn error(code: impl Into<Cow<'static, str>>, message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Error, message, span).with_code(code)
    }

    /// Shorthand for a `Warn` diagnostic with a code.
    pub fn warn(code: impl Into<Cow<'static, str>>, message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Warn, message, span).with_code(code)
    }

    /// Shorthand for an `Info` diagnostic with a code.
    pub fn info(code: impl Into<Cow<'static, str>>, message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Info, message, span).with_code(code)
    }

    /// Set the diagnostic code (builder pattern).
    pub fn with_code(mut self, code: impl Into<Cow<'static, str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Append a label (builder pattern).
    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    /// Append a note (builder pattern).
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Attach machine-readable context metadata (builder pattern).
    ///
    /// Keys are short descriptors like `"expected"` or `"found"`.
    pub fn with_context(mut self, ctx: BTreeMap<String, String>) -> Self {
        self.context = Some(ctx);
        self
    }

    /// Returns the human-readable explanation for this diagnostic's code, if available.
    pub fn explain(&self) -> Option<&'static str> {
        self.code.as_deref().and_then(explain)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warn => write!(f, "warn"),
            Severity::Info => write!(f, "info"),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}[{}]: {}", self.severity, code, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Returns the human-readable explanation for a diagnostic code, if known.
pub fn explain(id: &str) -> Option<&'static str> {
    match id {
        codes::UNEXPECTED_INPUT => Some(
            "The grammar's root rule could not match the input. The reported location is \
             the rightmost point any alternative reached; the expectation names what \
             would have allowed parsing to continue there.",
        ),
        codes::TRAILING_INPUT => Some(
            "The root rule matched a prefix of the input, but unparsed text remained after \
             it. Everything from the reported location up to the next synchronizing \
             character is kept in an error node.",
        ),
        codes::INPUT_TOO_LARGE => Some(
            "The input was larger than the parser's configured maximum and was rejected \
             before parsing started.",
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── LineIndex ────────────────────────────────────────────────────────

    #[test]
    fn line_index_single_line() {
        let idx = LineIndex::new("hello");
        assert_eq!(idx.line_count(), 1);
        assert_eq!(idx.line_col(0), (0, 0));
        assert_eq!(idx.line_col(4), (0, 4));
    }

    #[test]
    fn line_index_two_lines() {
        let idx = LineIndex::new("ab\ncd");
        assert_eq!(idx.line_count(), 2);
        assert_eq!(idx.line_col(2), (0, 2)); // '\n'
        assert_eq!(idx.line_col(3), (1, 0)); // 'c'
        assert_eq!(idx.line_col(4), (1, 1)); // 'd'
    }

    #[test]
    fn line_index_empty_input() {
        let idx = LineIndex::new("");
        assert_eq!(idx.line_count(), 1);
        assert_eq!(idx.line_col(0), (0, 0));
        assert_eq!(idx.line_end("", 0), Some(0));
    }

    #[test]
    fn line_index_line_end_excludes_newline_and_cr() {
        let text = "ab\r\ncd\n";
        let idx = LineIndex::new(text);
        assert_eq!(idx.line_end(text, 0), Some(2));
        assert_eq!(idx.line_end(text, 1), Some(6));
        assert_eq!(idx.line_end(text, 2), Some(7));
        assert_eq!(idx.line_end(text, 3), None);
    }

    #[test]
    fn line_index_offset_past_end() {
        let idx = LineIndex::new("hi");
        assert_eq!(idx.line_col(100), (0, 100));
    }

    // ── Span ────────────────────────────────────────────────────────────

    #[test]
    fn span_len_and_empty() {
        assert_eq!(Span::new(5, 10).len(), 5);
        assert!(Span::empty(7).is_empty());
    }

    #[test]
    #[should_panic(expected = "Span end (3) < start (5)")]
    fn span_new_inverted_panics() {
        Span::new(5, 3);
    }

    // ── Diagnostic ──────────────────────────────────────────────────────

    #[test]
    fn diagnostic_display_with_and_without_code() {
        let d = Diagnostic::error(codes::UNEXPECTED_INPUT, "expected ';'", Span::empty(0));
        assert_eq!(d.to_string(), "error[PEG0001]: expected ';'");
        let d = Diagnostic::new(Severity::Warn, "odd spacing", Span::empty(0));
        assert_eq!(d.to_string(), "warn: odd spacing");
    }

    #[test]
    fn labels_and_notes_keep_insertion_order() {
        let d = Diagnostic::error(codes::UNEXPECTED_INPUT, "m", Span::new(0, 1))
            .with_label(Label::secondary(Span::new(4, 5), "second"))
            .with_label(Label::primary(Span::new(0, 1), "first"))
            .with_note("n1")
            .with_note("n2");
        assert_eq!(d.labels[0].message, "second");
        assert_eq!(d.labels[1].style, LabelStyle::Primary);
        assert_eq!(d.notes, vec!["n1", "n2"]);
    }

    #[test]
    fn every_code_has_an_explanation() {
        for code in [
            codes::UNEXPECTED_INPUT,
            codes::TRAILING_INPUT,
            codes::INPUT_TOO_LARGE,
        ] {
            assert!(explain(code).is_some(), "code {code} has no explain() entry");
        }
        assert!(explain("PEG9999").is_none());
        assert!(Diagnostic::new(Severity::Info, "x", Span::empty(0)).explain().is_none());
    }

    #[test]
    fn diagnostic_serde_roundtrip_and_omissions() {
        let d = Diagnostic::error(codes::TRAILING_INPUT, "expected end of input", Span::new(3, 4))
            .with_context(BTreeMap::from([("found".into(), "x".into())]));
        let json = serde_json::to_string(&d).unwrap();
        assert!(!json.contains("labels"), "empty labels should be omitted: {json}");
        assert!(!json.contains("notes"), "empty notes should be omitted: {json}");
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(d, back);
    }
}
