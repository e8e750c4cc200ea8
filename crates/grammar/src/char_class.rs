//! Compact character-class syntax.
//!
//! A pattern is the body of a bracket expression without the brackets:
//! single characters, ranges (`a-z`), and escapes (`\n \t \r \0 \\ \] \[ \-
//! \^ \' \"`, `\xHH`, `\uHHHH`, `\u{H..}`). A `-` at either end of the pattern
//! is literal. An unescaped `]` is rejected.

use std::iter::Peekable;
use std::str::Chars;

/// Why a character-class pattern failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum CharClassError {
    /// The pattern contains no characters.
    #[error("empty character class")]
    Empty,
    /// The pattern ends with a lone backslash.
    #[error("dangling `\\` at end of pattern")]
    DanglingEscape,
    /// A backslash is followed by a character that is not a known escape.
    #[error("unknown escape `\\{0}`")]
    UnknownEscape(char),
    /// A `\x`/`\u` escape is not followed by valid hex digits.
    #[error("malformed hex escape `{0}`")]
    InvalidHex(String),
    /// A hex escape names a value that is not a Unicode scalar value.
    #[error("U+{0:X} is not a valid character")]
    InvalidCodepoint(u32),
    /// A range whose start is after its end.
    #[error("range `{0}-{1}` is out of order")]
    ReversedRange(char, char),
    /// A `]` that is not escaped.
    #[error("unescaped `]` (write `\\]`)")]
    UnescapedBracket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassItem {
    Single(char),
    Range(char, char),
}

impl ClassItem {
    fn contains(self, c: char) -> bool {
        match self {
            ClassItem::Single(s) => s == c,
            ClassItem::Range(lo, hi) => (lo..=hi).contains(&c),
        }
    }
}

/// A compiled character class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    pattern: String,
    items: Vec<ClassItem>,
    negated: bool,
    case_insensitive: bool,
}

impl CharClass {
    /// Compile `pattern` into a class.
    pub fn parse(
        pattern: &str,
        negated: bool,
        case_insensitive: bool,
    ) -> Result<Self, CharClassError> {
        let mut chars = pattern.chars().peekable();
        let mut items = Vec::new();

        while let Some(lo) = next_atom(&mut chars)? {
            let is_range = chars.peek() == Some(&'-') && {
                let mut ahead = chars.clone();
                ahead.next();
                ahead.peek().is_some()
            };
            if !is_range {
                items.push(ClassItem::Single(lo));
                continue;
            }
            chars.next(); // '-'
            let Some(hi) = next_atom(&mut chars)? else {
                items.push(ClassItem::Single(lo));
                items.push(ClassItem::Single('-'));
                break;
            };
            if lo > hi {
                return Err(CharClassError::ReversedRange(lo, hi));
            }
            items.push(ClassItem::Range(lo, hi));
        }

        if items.is_empty() {
            return Err(CharClassError::Empty);
        }
        Ok(Self {
            pattern: pattern.to_string(),
            items,
            negated,
            case_insensitive,
        })
    }

    /// Test one character against the class.
    pub fn matches(&self, c: char) -> bool {
        let hit = self.contains(c)
            || (self.case_insensitive
                && (c.to_lowercase().any(|l| self.contains(l))
                    || c.to_uppercase().any(|u| self.contains(u))));
        hit != self.negated
    }

    fn contains(&self, c: char) -> bool {
        self.items.iter().any(|item| item.contains(c))
    }

    /// The pattern as written.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the class matches characters *outside* the pattern.
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Whether matching ignores case.
    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }
}

impl std::fmt::Display for CharClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let caret = if self.negated { "^" } else { "" };
        let suffix = if self.case_insensitive { "i" } else { "" };
        write!(f, "[{caret}{}]{suffix}", self.pattern)
    }
}

/// Read one literal or escaped character. `Ok(None)` at end of pattern.
fn next_atom(chars: &mut Peekable<Chars<'_>>) -> Result<Option<char>, CharClassError> {
    let Some(c) = chars.next() else {
        return Ok(None);
    };
    match c {
        ']' => Err(CharClassError::UnescapedBracket),
        '\\' => {
            let esc = chars.next().ok_or(CharClassError::DanglingEscape)?;
            let decoded = match esc {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                '0' => '\0',
                '\\' | ']' | '[' | '-' | '^' | '\'' | '"' => esc,
                'x' => hex_escape(chars, 'x', Some(2))?,
                'u' if chars.peek() == Some(&'{') => {
                    chars.next();
                    hex_escape(chars, 'u', None)?
                }
                'u' => hex_escape(chars, 'u', Some(4))?,
                other => return Err(CharClassError::UnknownEscape(other)),
            };
            Ok(Some(decoded))
        }
        _ => Ok(Some(c)),
    }
}

/// Decode the digits of `\xHH`, `\uHHHH` (fixed width) or `\u{H..}` (braced).
fn hex_escape(
    chars: &mut Peekable<Chars<'_>>,
    kind: char,
    width: Option<usize>,
) -> Result<char, CharClassError> {
    let mut digits = String::new();
    match width {
        Some(n) => {
            for _ in 0..n {
                match chars.next() {
                    Some(d) => digits.push(d),
                    None => break,
                }
            }
        }
        None => loop {
            match chars.next() {
                Some('}') => break,
                Some(d) => digits.push(d),
                None => return Err(CharClassError::InvalidHex(format!("\\{kind}{{{digits}"))),
            }
        },
    }

    let written = match width {
        Some(_) => format!("\\{kind}{digits}"),
        None => format!("\\{kind}{{{digits}}}"),
    };
    let valid_len = width.map_or((1..=6).contains(&digits.len()), |n| digits.len() == n);
    if !valid_len || !digits.chars().all(|d| d.is_ascii_hexdigit()) {
        return Err(CharClassError::InvalidHex(written));
    }
    let value = u32::from_str_radix(&digits, 16).map_err(|_| CharClassError::InvalidHex(written))?;
    char::from_u32(value).ok_or(CharClassError::InvalidCodepoint(value))
}
