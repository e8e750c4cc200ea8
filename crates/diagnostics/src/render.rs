//! Plain-text diagnostic rendering.
//!
//! Produces compiler-style reports: a `severity[code]: message` header, a
//! `--> file:line:col` location line, an excerpt of every source line touched
//! by the primary span or a label (each followed by an underline line), and
//! trailing `= note:` lines. Output is plain text with no colour so it can be
//! compared verbatim in tests and written to any sink.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use unicode_width::UnicodeWidthChar;

use crate::{Diagnostic, Label, LabelStyle, LineIndex};

/// Columns a tab advances in excerpts and underlines.
const TAB_WIDTH: usize = 4;

/// The part of one label that falls on one source line.
struct Segment<'a> {
    /// Display column where the underline starts (0-based).
    col: usize,
    /// Underline width in display columns, at least 1.
    width: usize,
    style: LabelStyle,
    /// Set only on the label's last line so each message prints once.
    message: Option<&'a str>,
}

// ── Public entry points ─────────────────────────────────────────────────

/// Render one diagnostic against `source`, reporting locations in `filename`.
pub fn render(diagnostic: &Diagnostic, source: &str, filename: &str) -> String {
    let index = LineIndex::new(source);
    render_indexed(diagnostic, source, filename, &index)
}

/// Render several diagnostics, separated by blank lines.
///
/// The line index is built once and shared across all reports.
pub fn render_all(diagnostics: &[Diagnostic], source: &str, filename: &str) -> String {
    let index = LineIndex::new(source);
    diagnostics
        .iter()
        .map(|d| render_indexed(d, source, filename, &index))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Report assembly ─────────────────────────────────────────────────────

fn render_indexed(diag: &Diagnostic, source: &str, filename: &str, index: &LineIndex) -> String {
    let mut out = String::new();
    push_line(&mut out, &diag.to_string());

    let start = clamp(source, diag.span.start);
    let (line, _) = index.line_col(start);
    let line_start = index.line_start(line).unwrap_or(0).min(start);
    let col = source[line_start..start].chars().count() + 1;

    // A diagnostic without a primary label still underlines its own span.
    let fallback;
    let labels: Vec<&Label> = if diag.labels.iter().any(|l| l.style == LabelStyle::Primary) {
        diag.labels.iter().collect()
    } else {
        fallback = Label::primary(diag.span, "");
        std::iter::once(&fallback).chain(diag.labels.iter()).collect()
    };

    let mut lines: BTreeMap<usize, Vec<Segment<'_>>> = BTreeMap::new();
    for label in &labels {
        collect_segments(label, source, index, &mut lines);
    }

    let last_line = lines.keys().next_back().copied().unwrap_or(line);
    let gutter = (last_line + 1).to_string().len();
    let pad = " ".repeat(gutter);

    push_line(&mut out, &format!("{pad}--> {filename}:{}:{col}", line + 1));
    push_line(&mut out, &format!("{pad} |"));

    let mut previous: Option<usize> = None;
    for (line, mut segments) in lines {
        if let Some(prev) = previous
            && line > prev + 1
        {
            push_line(&mut out, "...");
        }
        previous = Some(line);

        let ls = index.line_start(line).unwrap_or(0);
        let le = index.line_end(source, line).unwrap_or(ls);
        let text = source[ls..le].replace('\t', &" ".repeat(TAB_WIDTH));
        push_line(&mut out, &format!("{:>gutter$} | {text}", line + 1));

        segments.sort_by_key(|s| s.col);
        push_line(&mut out, &format!("{pad} | {}", underline(&segments)));
    }

    if !diag.notes.is_empty() {
        push_line(&mut out, &format!("{pad} |"));
        for note in &diag.notes {
            push_line(&mut out, &format!("{pad} = note: {note}"));
        }
    }
    out
}

/// Merge all segments on one line into a single marker row, messages last.
fn underline(segments: &[Segment<'_>]) -> String {
    let mut marks: Vec<char> = Vec::new();
    for seg in segments {
        let end = seg.col + seg.width;
        if marks.len() < end {
            marks.resize(end, ' ');
        }
        let ch = match seg.style {
            LabelStyle::Primary => '^',
            LabelStyle::Secondary => '-',
        };
        for slot in &mut marks[seg.col..end] {
            // Primary markers win where labels overlap.
            if *slot != '^' {
                *slot = ch;
            }
        }
    }

    let mut row: String = marks.into_iter().collect();
    let messages: Vec<&str> = segments
        .iter()
        .filter_map(|s| s.message)
        .filter(|m| !m.is_empty())
        .collect();
    if !messages.is_empty() {
        row.push(' ');
        row.push_str(&messages.join("; "));
    }
    row
}

/// Split a label into per-line segments keyed by 0-based line number.
fn collect_segments<'a>(
    label: &'a Label,
    source: &str,
    index: &LineIndex,
    lines: &mut BTreeMap<usize, Vec<Segment<'a>>>,
) {
    let start = clamp(source, label.span.start);
    let end = clamp(source, label.span.end).max(start);
    let (first, _) = index.line_col(start);
    // A span ending right after a newline does not touch the following line.
    let (last, _) = index.line_col(if end > start { end - 1 } else { end });

    for line in first..=last {
        let (Some(ls), Some(le)) = (index.line_start(line), index.line_end(source, line)) else {
            continue;
        };
        let seg_start = if line == first { start } else { ls };
        let seg_end = if line == last {
            end.min(le).max(seg_start)
        } else {
            le.max(seg_start)
        };
        lines.entry(line).or_default().push(Segment {
            col: display_width(&source[ls..seg_start]),
            width: display_width(&source[seg_start..seg_end]).max(1),
            style: label.style,
            message: (line == last).then_some(label.message.as_str()),
        });
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn display_width(text: &str) -> usize {
    text.chars()
        .map(|c| match c {
            '\t' => TAB_WIDTH,
            _ => c.width().unwrap_or(0),
        })
        .sum()
}

/// Clamp an offset into `source` and snap it back to a char boundary.
fn clamp(source: &str, offset: usize) -> usize {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

fn push_line(out: &mut String, line: &str) {
    let _ = writeln!(out, "{}", line.trim_end());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Severity, Span, codes};

    #[test]
    fn renders_header_location_excerpt_and_caret() {
        let src = "package demo; class";
        let d = Diagnostic::error(codes::UNEXPECTED_INPUT, "expected Identifier", Span::empty(19))
            .with_label(Label::primary(Span::empty(19), "found end of input"));
        let expected = "\
error[PEG0001]: expected Identifier
 --> demo.java:1:20
  |
1 | package demo; class
  |                    ^ found end of input
";
        assert_eq!(render(&d, src, "demo.java"), expected);
    }

    #[test]
    fn header_without_code() {
        let d = Diagnostic::new(Severity::Warn, "suspicious", Span::new(0, 3));
        let out = render(&d, "abc", "f");
        assert!(out.starts_with("warn: suspicious\n"), "{out}");
        assert!(out.contains("  | ^^^\n"), "{out}");
    }

    #[test]
    fn merges_labels_on_one_line_in_column_order() {
        let src = "let x = foo(1, 2);";
        let d = Diagnostic::error(codes::UNEXPECTED_INPUT, "bad call", Span::new(8, 11))
            .with_label(Label::secondary(Span::new(12, 16), "arguments"))
            .with_label(Label::primary(Span::new(8, 11), "callee"));
        let out = render(&d, src, "f.rs");
        assert!(
            out.contains("  |         ^^^ ---- callee; arguments\n"),
            "{out}"
        );
        assert_eq!(out.matches(" | ").count(), 2, "one excerpt + one underline: {out}");
    }

    #[test]
    fn renders_every_touched_line_with_gap_marker_and_notes() {
        let src = "a\nb\nc\nd\ne\n";
        let d = Diagnostic::error(codes::TRAILING_INPUT, "m", Span::new(0, 1))
            .with_label(Label::primary(Span::new(0, 1), "here"))
            .with_label(Label::secondary(Span::new(8, 9), "and here"))
            .with_note("first note")
            .with_note("second note");
        let expected = "\
error[PEG0002]: m
 --> input:1:1
  |
1 | a
  | ^ here
...
5 | e
  | - and here
  |
  = note: first note
  = note: second note
";
        assert_eq!(render(&d, src, "input"), expected);
    }

    #[test]
    fn multi_line_label_underlines_each_line_and_messages_last() {
        let src = "ab\ncd\n";
        let d = Diagnostic::error(codes::UNEXPECTED_INPUT, "m", Span::new(1, 5))
            .with_label(Label::primary(Span::new(1, 5), "spans lines"));
        let out = render(&d, src, "f");
        assert!(out.contains("1 | ab\n  |  ^\n"), "{out}");
        assert!(out.contains("2 | cd\n  | ^^ spans lines\n"), "{out}");
    }

    #[test]
    fn span_ending_after_newline_stays_on_its_line() {
        let src = "ab\ncd";
        let d = Diagnostic::error(codes::UNEXPECTED_INPUT, "m", Span::new(0, 3));
        let out = render(&d, src, "f");
        assert!(!out.contains("2 | cd"), "{out}");
    }

    #[test]
    fn columns_count_characters_and_widths_use_display_width() {
        let src = "é漢x";
        // 'x' starts at byte 5 (é = 2 bytes, 漢 = 3 bytes).
        let d = Diagnostic::error(codes::UNEXPECTED_INPUT, "m", Span::new(5, 6));
        let out = render(&d, src, "f");
        assert!(out.contains("--> f:1:3\n"), "{out}");
        assert!(out.contains("  |    ^\n"), "{out}");
    }

    #[test]
    fn out_of_range_spans_are_clamped() {
        let d = Diagnostic::error(codes::UNEXPECTED_INPUT, "m", Span::new(50, 60));
        let out = render(&d, "abc", "f");
        assert!(out.contains("--> f:1:4\n"), "{out}");
        assert!(out.contains("  |    ^\n"), "{out}");
    }

    #[test]
    fn render_all_separates_reports_with_blank_line() {
        let a = Diagnostic::error(codes::UNEXPECTED_INPUT, "first", Span::empty(0));
        let b = Diagnostic::warn(codes::TRAILING_INPUT, "second", Span::empty(1));
        let out = render_all(&[a, b], "xy", "f");
        assert!(out.contains("^\n\nwarn[PEG0002]: second\n"), "{out}");
    }
}
