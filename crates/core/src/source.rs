use packrat_cst_diagnostics::Span;
use serde::Serialize;

/// A position in the input.
///
/// `line` and `column` are 1-based; `column` counts Unicode scalar values.
/// `offset` is the 0-based byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column, in characters.
    pub column: u32,
    /// Byte offset from the start of the input.
    pub offset: usize,
}

impl SourceLocation {
    /// The location of the first character.
    pub const START: SourceLocation = SourceLocation {
        line: 1,
        column: 1,
        offset: 0,
    };
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self::START
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open range `[start, end)` of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceSpan {
    /// First location covered.
    pub start: SourceLocation,
    /// Location just past the last covered character.
    pub end: SourceLocation,
}

impl SourceSpan {
    /// Create a span. Panics if `end` precedes `start`.
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        assert!(
            end.offset >= start.offset,
            "span end ({}) precedes start ({})",
            end.offset,
            start.offset
        );
        Self { start, end }
    }

    /// A zero-width span at `at`.
    pub fn empty(at: SourceLocation) -> Self {
        Self { start: at, end: at }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end.offset - self.start.offset
    }

    /// Whether the span covers nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The exact text this span covers in `source`.
    pub fn slice<'s>(&self, source: &'s str) -> &'s str {
        &source[self.start.offset..self.end.offset]
    }

    /// The byte span used by diagnostics.
    pub fn to_span(&self) -> Span {
        Span::new(self.start.offset, self.end.offset)
    }
}

/// Character cursor over the input with line/column tracking.
///
/// `restore` is the only way to move backwards; every failing matcher and
/// combinator uses it to undo partial consumption.
#[derive(Debug, Clone)]
pub struct Cursor<'src> {
    input: &'src str,
    loc: SourceLocation,
}

impl<'src> Cursor<'src> {
    /// A cursor at the start of `input`.
    pub fn new(input: &'src str) -> Self {
        Self {
            input,
            loc: SourceLocation::START,
        }
    }

    /// The whole input.
    pub fn input(&self) -> &'src str {
        self.input
    }

    /// Current position.
    pub fn location(&self) -> SourceLocation {
        self.loc
    }

    /// Current byte offset.
    pub fn offset(&self) -> usize {
        self.loc.offset
    }

    /// Input from the current position on.
    pub fn rest(&self) -> &'src str {
        &self.input[self.loc.offset..]
    }

    /// Whether every character has been consumed.
    pub fn at_end(&self) -> bool {
        self.loc.offset >= self.input.len()
    }

    /// The character `k` positions ahead (0 = next) without consuming.
    pub fn peek(&self, k: usize) -> Option<char> {
        self.rest().chars().nth(k)
    }

    /// Consume one character. A newline moves to column 1 of the next line.
    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek(0)?;
        self.loc.offset += c.len_utf8();
        if c == '\n' {
            self.loc.line += 1;
            self.loc.column = 1;
        } else {
            self.loc.column += 1;
        }
        Some(c)
    }

    /// Jump back (or forward) to a location previously taken from this cursor.
    pub fn restore(&mut self, loc: SourceLocation) {
        debug_assert!(loc.offset <= self.input.len());
        self.loc = loc;
    }

    /// Span from `start` to the current position.
    pub fn span_from(&self, start: SourceLocation) -> SourceSpan {
        SourceSpan::new(start, self.loc)
    }
}
