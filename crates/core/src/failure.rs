use packrat_cst_grammar::CharClass;

use crate::source::SourceLocation;

/// What the parser wanted to see at a failure point.
///
/// Borrowed from the grammar and formatted only when a diagnostic or error is
/// actually produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected<'g> {
    /// A literal string.
    Literal(&'g str),
    /// A character from a class.
    Class(&'g CharClass),
    /// Any character (the input ended).
    AnyChar,
    /// A rule's failure label, e.g. `Identifier` or `<Expr>`.
    Label(&'g str),
    /// The end of the input.
    EndOfInput,
    /// None of an ordered choice's alternatives matched.
    Alternatives,
    /// A not-predicate saw input it must not be followed by.
    Lookahead,
}

impl std::fmt::Display for Expected<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expected::Literal(text) => write!(f, "'{text}'"),
            Expected::Class(class) => write!(f, "{class}"),
            Expected::AnyChar => f.write_str("any character"),
            Expected::Label(label) => f.write_str(label),
            Expected::EndOfInput => f.write_str("end of input"),
            Expected::Alternatives => f.write_str("one of several alternatives"),
            Expected::Lookahead => f.write_str("something else"),
        }
    }
}

/// A failure position and what was expected there.
pub type Furthest<'g> = Option<(SourceLocation, Expected<'g>)>;

/// The rightmost failure seen so far.
///
/// `record` only ever moves the position forward; ties keep the earlier
/// expectation. `relabel` lets a rule with a failure label take over the
/// expectation at its own start position, so `<Expr>` is reported instead of
/// whichever primitive inside it failed first.
#[derive(Debug, Clone, Default)]
pub struct FailureTracker<'g> {
    furthest: Furthest<'g>,
}

impl<'g> FailureTracker<'g> {
    /// An empty tracker.
    pub fn new() -> Self {
        Self { furthest: None }
    }

    /// Record a failure at `at`. Kept only if strictly right of the current one.
    pub fn record(&mut self, at: SourceLocation, expected: Expected<'g>) {
        if self.furthest.is_none_or(|(loc, _)| at.offset > loc.offset) {
            self.furthest = Some((at, expected));
        }
    }

    /// Fold in another tracker's result with [`record`](Self::record) rules.
    pub fn merge(&mut self, other: Furthest<'g>) {
        if let Some((at, expected)) = other {
            self.record(at, expected);
        }
    }

    /// Replace the expectation with `label` if nothing failed right of `at`.
    pub fn relabel(&mut self, at: SourceLocation, label: Expected<'g>) {
        if self.furthest.is_none_or(|(loc, _)| loc.offset <= at.offset) {
            self.furthest = Some((at, label));
        }
    }

    /// Current furthest failure.
    pub fn furthest(&self) -> Furthest<'g> {
        self.furthest
    }

    /// Offset of the furthest failure, if any.
    pub fn offset(&self) -> Option<usize> {
        self.furthest.map(|(loc, _)| loc.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(offset: usize) -> SourceLocation {
        SourceLocation {
            line: 1,
            column: offset as u32 + 1,
            offset,
        }
    }

    #[test]
    fn keeps_only_strictly_further_failures() {
        let mut t = FailureTracker::new();
        t.record(at(3), Expected::Literal("a"));
        t.record(at(3), Expected::Literal("b"));
        t.record(at(1), Expected::Literal("c"));
        assert_eq!(t.furthest(), Some((at(3), Expected::Literal("a"))));
        t.record(at(5), Expected::EndOfInput);
        assert_eq!(t.offset(), Some(5));
    }

    #[test]
    fn relabel_takes_over_at_same_offset_only() {
        let mut t = FailureTracker::new();
        t.record(at(4), Expected::Literal("("));
        t.relabel(at(4), Expected::Label("<Expr>"));
        assert_eq!(t.furthest().map(|(_, e)| e.to_string()), Some("<Expr>".into()));

        t.record(at(9), Expected::Literal(";"));
        t.relabel(at(4), Expected::Label("<Stmt>"));
        assert_eq!(t.furthest(), Some((at(9), Expected::Literal(";"))));
    }

    #[test]
    fn relabel_on_empty_tracker_sets_label() {
        let mut t = FailureTracker::new();
        t.relabel(at(2), Expected::Label("Identifier"));
        assert_eq!(t.offset(), Some(2));
    }

    #[test]
    fn merge_follows_record_rules() {
        let mut outer = FailureTracker::new();
        outer.record(at(6), Expected::Literal("x"));
        outer.merge(Some((at(6), Expected::Literal("y"))));
        outer.merge(None);
        assert_eq!(outer.furthest(), Some((at(6), Expected::Literal("x"))));
        outer.merge(Some((at(7), Expected::Literal("z"))));
        assert_eq!(outer.offset(), Some(7));
    }

    #[test]
    fn display_forms() {
        assert_eq!(Expected::Literal("class").to_string(), "'class'");
        assert_eq!(Expected::AnyChar.to_string(), "any character");
        assert_eq!(Expected::EndOfInput.to_string(), "end of input");
        let class = CharClass::parse("0-9", false, false).unwrap();
        assert_eq!(Expected::Class(&class).to_string(), "[0-9]");
    }
}
