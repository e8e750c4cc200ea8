//! Shared test helpers for `packrat_cst_core` integration tests.

#![allow(unreachable_pub)]

use std::sync::LazyLock;

use packrat_cst_core::{CstNode, Grammar, ParseResult, Parser, ParserConfig};

/// The demo grammar, compiled once per test binary.
pub static MINI_JAVA: LazyLock<Grammar> = LazyLock::new(|| {
    Grammar::from_jsonc(include_str!("../../../../grammars/mini_java.jsonc"))
        .unwrap_or_else(|e| panic!("failed to load mini_java.jsonc: {e}"))
});

/// Lenient parse with the default configuration.
#[allow(dead_code)]
pub fn lenient(input: &str) -> ParseResult {
    Parser::new(&MINI_JAVA).parse_with_diagnostics(input)
}

/// Lenient parse with memoization switched on or off.
#[allow(dead_code)]
pub fn lenient_memo(input: &str, memoize: bool) -> ParseResult {
    let config = ParserConfig::default().with_memoize(memoize);
    Parser::with_config(&MINI_JAVA, config).parse_with_diagnostics(input)
}

/// Rule names of every rule-tagged node, in preorder.
#[allow(dead_code)]
pub fn rule_names(node: &CstNode) -> Vec<String> {
    node.preorder()
        .filter_map(|n| n.rule())
        .filter(|r| !r.is_builtin())
        .map(|r| r.name().to_string())
        .collect()
}

/// Diagnostic codes, in order.
#[allow(dead_code)]
pub fn diag_codes(result: &ParseResult) -> Vec<String> {
    result
        .diagnostics
        .iter()
        .filter_map(|d| d.code.as_deref())
        .map(str::to_string)
        .collect()
}

/// Assert structural invariants that hold for every result, whatever the input.
#[allow(dead_code)]
pub fn assert_invariants(result: &ParseResult, input: &str) {
    if let Some(root) = &result.node {
        for node in root.preorder() {
            let span = node.span();
            assert!(
                span.start.offset <= span.end.offset && span.end.offset <= input.len(),
                "bad node span {span:?} for input {input:?}"
            );
            if let Some(text) = node.text() {
                assert_eq!(text, span.slice(input), "leaf text does not match its span");
            }
        }
        if !result.has_errors() {
            assert_eq!(root.to_source(), input, "successful parse must round-trip");
        }
    }
    for diag in &result.diagnostics {
        assert!(
            diag.span.start <= diag.span.end && diag.span.end <= input.len(),
            "bad diagnostic span {:?} for input {input:?}",
            diag.span
        );
    }
}
