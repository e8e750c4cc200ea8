use crate::config::ParserConfig;
use crate::source::{Cursor, SourceSpan};

/// Panic-mode skip: advance until a synchronizing character (not consumed) or
/// the end of input, returning the skipped range.
pub fn skip_to_sync(cursor: &mut Cursor<'_>, config: &ParserConfig) -> SourceSpan {
    let start = cursor.location();
    while let Some(c) = cursor.peek(0) {
        if config.is_sync(c) {
            break;
        }
        cursor.advance();
    }
    cursor.span_from(start)
}
