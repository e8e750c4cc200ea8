use crate::result::ParseResult;

/// Serialize a parse result (tree, diagnostics, stats) to pretty-printed JSON.
pub fn to_pretty_json(result: &ParseResult) -> String {
    serde_json::to_string_pretty(result).expect("ParseResult serialization cannot fail")
}
