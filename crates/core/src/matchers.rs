//! Primitive matchers: the only code besides the trivia scanner that looks at
//! raw characters. Each one either consumes its match and returns the span,
//! or leaves the cursor untouched and returns what it expected.

use packrat_cst_grammar::CharClass;

use crate::failure::Expected;
use crate::source::{Cursor, SourceSpan};

/// Match `text` exactly, or with simple case folding.
pub fn match_literal<'g>(
    cursor: &mut Cursor<'_>,
    text: &'g str,
    case_insensitive: bool,
) -> Result<SourceSpan, Expected<'g>> {
    let start = cursor.location();
    for want in text.chars() {
        let same = match cursor.peek(0) {
            Some(got) if case_insensitive => got.to_lowercase().eq(want.to_lowercase()),
            Some(got) => got == want,
            None => false,
        };
        if !same {
            cursor.restore(start);
            return Err(Expected::Literal(text));
        }
        cursor.advance();
    }
    Ok(cursor.span_from(start))
}

/// Match one character in `class`.
pub fn match_char_class<'g>(
    cursor: &mut Cursor<'_>,
    class: &'g CharClass,
) -> Result<SourceSpan, Expected<'g>> {
    let start = cursor.location();
    match cursor.peek(0) {
        Some(c) if class.matches(c) => {
            cursor.advance();
            Ok(cursor.span_from(start))
        }
        _ => Err(Expected::Class(class)),
    }
}

/// Match any single character.
pub fn match_any<'g>(cursor: &mut Cursor<'_>) -> Result<SourceSpan, Expected<'g>> {
    let start = cursor.location();
    match cursor.advance() {
        Some(_) => Ok(cursor.span_from(start)),
        None => Err(Expected::AnyChar),
    }
}
