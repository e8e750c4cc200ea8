use crate::cst::{Trivia, TriviaKind};
use crate::source::Cursor;

/// Consume a maximal run of whitespace and comments, one [`Trivia`] per run.
///
/// An unterminated `/*` is not trivia: the cursor stays in front of it so the
/// grammar sees the `/`.
pub fn scan_trivia(cursor: &mut Cursor<'_>) -> Vec<Trivia> {
    let mut out = Vec::new();
    while let Some(trivia) = scan_one(cursor) {
        out.push(trivia);
    }
    out
}

fn scan_one(cursor: &mut Cursor<'_>) -> Option<Trivia> {
    let start = cursor.location();
    let kind = match (cursor.peek(0)?, cursor.peek(1)) {
        (c, _) if c.is_whitespace() => {
            while cursor.peek(0).is_some_and(char::is_whitespace) {
                cursor.advance();
            }
            TriviaKind::Whitespace
        }
        ('/', Some('/')) => {
            while cursor.peek(0).is_some_and(|c| c != '\n') {
                cursor.advance();
            }
            TriviaKind::LineComment
        }
        ('/', Some('*')) => {
            cursor.advance();
            cursor.advance();
            // Anything that is not the closing delimiter belongs to the comment.
            loop {
                match (cursor.peek(0), cursor.peek(1)) {
                    (Some('*'), Some('/')) => {
                        cursor.advance();
                        cursor.advance();
                        break;
                    }
                    (Some(_), _) => {
                        cursor.advance();
                    }
                    (None, _) => {
                        cursor.restore(start);
                        return None;
                    }
                }
            }
            TriviaKind::BlockComment
        }
        _ => return None,
    };

    let span = cursor.span_from(start);
    Some(Trivia {
        kind,
        span,
        text: span.slice(cursor.input()).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_texts(src: &str) -> (Vec<(TriviaKind, String)>, usize) {
        let mut c = Cursor::new(src);
        let trivia = scan_trivia(&mut c);
        (
            trivia.into_iter().map(|t| (t.kind, t.text)).collect(),
            c.offset(),
        )
    }

    #[test]
    fn classifies_runs_in_order() {
        let (runs, end) = kinds_and_texts("  \n// note\n/* a\n b */x");
        assert_eq!(
            runs,
            vec![
                (TriviaKind::Whitespace, "  \n".to_string()),
                (TriviaKind::LineComment, "// note".to_string()),
                (TriviaKind::Whitespace, "\n".to_string()),
                (TriviaKind::BlockComment, "/* a\n b */".to_string()),
            ]
        );
        assert_eq!(end, 21);
    }

    #[test]
    fn stops_at_first_significant_character() {
        let (runs, end) = kinds_and_texts("x  ");
        assert!(runs.is_empty());
        assert_eq!(end, 0);
        let (runs, end) = kinds_and_texts("/x");
        assert!(runs.is_empty());
        assert_eq!(end, 0);
    }

    #[test]
    fn line_comment_at_end_of_input() {
        let (runs, end) = kinds_and_texts("// tail");
        assert_eq!(runs, vec![(TriviaKind::LineComment, "// tail".to_string())]);
        assert_eq!(end, 7);
    }

    #[test]
    fn unterminated_block_comment_is_not_trivia() {
        let (runs, end) = kinds_and_texts(" /* never closed");
        assert_eq!(runs, vec![(TriviaKind::Whitespace, " ".to_string())]);
        assert_eq!(end, 1);
    }

    #[test]
    fn block_comment_does_not_nest() {
        let (runs, _) = kinds_and_texts("/* /* */ */");
        assert_eq!(runs[0].1, "/* /* */");
        assert_eq!(runs[1].1, " ");
    }

    #[test]
    fn spans_line_up_with_text() {
        let src = "\t/*é*/ ";
        let mut c = Cursor::new(src);
        for t in scan_trivia(&mut c) {
            assert_eq!(t.span.slice(src), t.text);
        }
        assert!(c.at_end());
    }
}
