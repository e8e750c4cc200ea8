//! JSONC comment blanking for grammar files.
//!
//! Supports:
//! - `//` line comments
//! - `/* ... */` block comments
//! - string literal preservation (including escapes)
//!
//! Comments are overwritten with spaces rather than removed, so every byte
//! offset, line, and column of the output matches the input. Errors reported
//! by `serde_json` against the blanked text therefore point straight into the
//! original file.

/// Replace `//` and `/* */` comments in JSONC input with spaces.
///
/// Newlines inside comments are kept so line numbers do not shift. An
/// unterminated block comment is blanked to the end of the input.
#[must_use]
pub fn blank_jsonc(input: &str) -> String {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut out = Vec::with_capacity(len);
    let mut i = 0usize;
    let mut in_str = false;

    while i < len {
        let b = bytes[i];

        if in_str {
            out.push(b);
            if b == b'\\' && i + 1 < len {
                i += 1;
                out.push(bytes[i]);
            } else if b == b'"' {
                in_str = false;
            }
            i += 1;
            continue;
        }

        if b == b'"' {
            in_str = true;
            out.push(b);
            i += 1;
            continue;
        }

        if b == b'/' && i + 1 < len && bytes[i + 1] == b'/' {
            while i < len && bytes[i] != b'\n' {
                out.push(blank(bytes[i]));
                i += 1;
            }
            continue;
        }

        if b == b'/' && i + 1 < len && bytes[i + 1] == b'*' {
            out.extend_from_slice(b"  ");
            i += 2;
            while i < len {
                if bytes[i] == b'*' && i + 1 < len && bytes[i + 1] == b'/' {
                    out.extend_from_slice(b"  ");
                    i += 2;
                    break;
                }
                out.push(blank(bytes[i]));
                i += 1;
            }
            continue;
        }

        out.push(b);
        i += 1;
    }

    // Comment regions start and end on ASCII delimiters, so multi-byte
    // sequences are either copied whole or blanked whole.
    match String::from_utf8(out) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

fn blank(b: u8) -> u8 {
    match b {
        b'\n' | b'\r' => b,
        _ => b' ',
    }
}

#[cfg(test)]
mod tests {
    use super::blank_jsonc;

    #[test]
    fn blanks_line_and_block_comments() {
        let input = r#"
{
  // comment
  "a": 1, /* inline */ "b": 2
}
"#;
        let blanked = blank_jsonc(input);
        assert!(!blanked.contains("comment"));
        assert!(!blanked.contains("inline"));
        assert!(blanked.contains("\"a\": 1"));
        assert!(blanked.contains("\"b\": 2"));
    }

    #[test]
    fn preserves_length_and_line_structure() {
        let input = "{ /* a\nmulti-line € comment */ \"k\": 1 } // tail";
        let blanked = blank_jsonc(input);
        assert_eq!(blanked.len(), input.len());
        assert_eq!(blanked.lines().count(), input.lines().count());
        assert_eq!(blanked.find("\"k\""), input.find("\"k\""));
    }

    #[test]
    fn preserves_comment_like_text_in_strings() {
        let input = r#"{ "url": "http://example.com/*x*/", "note":"//keep", "q": "a\"//b" }"#;
        let blanked = blank_jsonc(input);
        assert_eq!(blanked, input);
    }

    #[test]
    fn unterminated_block_comment_blanks_to_end() {
        let blanked = blank_jsonc("[1] /* never closed");
        assert_eq!(blanked.trim_end(), "[1]");
        assert_eq!(blanked.len(), "[1] /* never closed".len());
    }

    #[test]
    fn blanked_output_parses_as_json() {
        let input = "{\n  // rules\n  \"root\": \"A\" /* entry */\n}";
        let value: serde_json::Value = serde_json::from_str(&blank_jsonc(input)).unwrap();
        assert_eq!(value["root"], "A");
    }
}
