use std::rc::Rc;

use log::debug;
use packrat_cst_diagnostics::{Diagnostic, Label, Span, codes};
use packrat_cst_grammar::Grammar;

use crate::config::ParserConfig;
use crate::cst::{CstNode, ErrorNode, NodeRef, NonTerminal};
use crate::engine::Session;
use crate::error::ParseError;
use crate::failure::Expected;
use crate::memo::ParseStats;
use crate::recovery::skip_to_sync;
use crate::result::ParseResult;
use crate::source::{SourceLocation, SourceSpan};

/// Shorthand for building a `BTreeMap<String, String>` context from key-value pairs.
macro_rules! ctx {
    ($($k:expr => $v:expr),+ $(,)?) => {
        std::collections::BTreeMap::from([$(($k.into(), $v.into())),+])
    };
}

// ─── Public API ─────────────────────────────────────────────────────────────

/// Parse `input` with `grammar`, failing on the first error.
pub fn parse(grammar: &Grammar, input: &str) -> Result<NodeRef, ParseError> {
    Parser::new(grammar).parse(input)
}

/// Parse `input` with `grammar`, recovering into a partial tree plus
/// diagnostics.
pub fn parse_with_diagnostics(grammar: &Grammar, input: &str) -> ParseResult {
    Parser::new(grammar).parse_with_diagnostics(input)
}

/// A grammar plus configuration. Immutable; every call gets a fresh session,
/// so one parser can serve any number of parses.
#[derive(Debug, Clone)]
pub struct Parser<'g> {
    grammar: &'g Grammar,
    config: ParserConfig,
}

/// How the root rule ended.
enum Outcome {
    /// Matched the whole input.
    Complete(NodeRef),
    /// Matched a prefix; significant input starts at `remainder`.
    Trailing {
        root: NodeRef,
        remainder: SourceLocation,
    },
    /// Did not match.
    Failed,
}

/// Where and why parsing stopped.
struct Stop<'g> {
    at: SourceLocation,
    expected: Expected<'g>,
    code: &'static str,
}

impl<'g> Parser<'g> {
    /// A parser with the default configuration.
    pub fn new(grammar: &'g Grammar) -> Self {
        Self::with_config(grammar, ParserConfig::default())
    }

    /// A parser with an explicit configuration.
    pub fn with_config(grammar: &'g Grammar, config: ParserConfig) -> Self {
        Self { grammar, config }
    }

    /// The grammar this parser runs.
    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    /// The active configuration.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Strict parse: the complete tree, or the furthest failure as an error.
    pub fn parse(&self, input: &str) -> Result<NodeRef, ParseError> {
        self.check_size(input)?;
        let mut session = self.session(input);
        let outcome = self.run(&mut session);
        self.finish_log(&session, 0);

        match outcome {
            Outcome::Complete(root) => Ok(root),
            Outcome::Trailing { remainder, .. } => {
                let stop = self.stop(&session, Some(remainder));
                Err(ParseError::TrailingInput {
                    location: stop.at,
                    expected: stop.expected.to_string(),
                    found: describe_found(input, stop.at.offset),
                })
            }
            Outcome::Failed => {
                let stop = self.stop(&session, None);
                Err(ParseError::Unexpected {
                    location: stop.at,
                    expected: stop.expected.to_string(),
                    found: describe_found(input, stop.at.offset),
                })
            }
        }
    }

    /// Lenient parse: always returns a result; errors become diagnostics and
    /// the unparseable region becomes an `Error` node.
    ///
    /// At most one recovery happens per call.
    pub fn parse_with_diagnostics(&self, input: &str) -> ParseResult {
        if let Err(err) = self.check_size(input) {
            return ParseResult {
                node: None,
                diagnostics: vec![Diagnostic::error(err.code(), err.to_string(), Span::empty(0))],
                source: input.to_string(),
                stats: ParseStats::default(),
            };
        }

        let mut session = self.session(input);
        let (node, diagnostics) = match self.run(&mut session) {
            Outcome::Complete(root) => (root, Vec::new()),
            Outcome::Trailing { root, remainder } => {
                let stop = self.stop(&session, Some(remainder));
                let (error, diagnostic) = self.recover(&mut session, &stop);
                (self.fold_error(&root, error), vec![diagnostic])
            }
            Outcome::Failed => {
                let stop = self.stop(&session, None);
                let (error, diagnostic) = self.recover(&mut session, &stop);
                (error, vec![diagnostic])
            }
        };
        self.finish_log(&session, diagnostics.len());

        ParseResult {
            node: Some(node),
            diagnostics,
            source: input.to_string(),
            stats: session.stats(),
        }
    }

    // ── Driver ──────────────────────────────────────────────────────────

    fn check_size(&self, input: &str) -> Result<(), ParseError> {
        match self.config.max_input_size {
            Some(limit) if input.len() > limit => Err(ParseError::InputTooLarge {
                size: input.len(),
                limit,
            }),
            _ => Ok(()),
        }
    }

    fn session<'s>(&self, input: &'s str) -> Session<'g, 's> {
        debug!(
            "parsing {} bytes from root rule `{}` (memoize: {})",
            input.len(),
            self.grammar.root().id,
            self.config.memoize
        );
        Session::new(self.grammar, input, self.config.memoize)
    }

    fn finish_log(&self, session: &Session<'g, '_>, diagnostics: usize) {
        let stats = session.stats();
        debug!(
            "parse finished: {} diagnostic(s), {} rule calls, {} evaluations, {} cache hits, {} cache entries",
            diagnostics, stats.rule_calls, stats.evaluations, stats.cache_hits, stats.cache_entries
        );
    }

    /// Run the root rule and attach trailing trivia when it reaches the end.
    fn run(&self, session: &mut Session<'g, '_>) -> Outcome {
        let Ok(root) = session.call_rule(self.grammar.root().ordinal()) else {
            return Outcome::Failed;
        };
        let trailing = session.skip_trivia();
        if !session.cursor().at_end() {
            return Outcome::Trailing {
                root,
                remainder: session.cursor().location(),
            };
        }
        let root = if trailing.is_empty() {
            root
        } else {
            Rc::new(root.with_trailing_trivia(trailing))
        };
        Outcome::Complete(root)
    }

    /// Pick the reported failure. With trailing input, a recorded failure at
    /// or after the remainder explains why the root stopped there; otherwise
    /// the root simply did not want more input.
    fn stop(&self, session: &Session<'g, '_>, remainder: Option<SourceLocation>) -> Stop<'g> {
        match (remainder, session.furthest()) {
            (None, Some((at, expected))) => Stop {
                at,
                expected,
                code: codes::UNEXPECTED_INPUT,
            },
            (None, None) => Stop {
                at: SourceLocation::START,
                expected: Expected::Label(self.grammar.root().id.name()),
                code: codes::UNEXPECTED_INPUT,
            },
            (Some(rest), Some((at, expected))) if at.offset >= rest.offset => Stop {
                at,
                expected,
                code: codes::TRAILING_INPUT,
            },
            (Some(rest), _) => Stop {
                at: rest,
                expected: Expected::EndOfInput,
                code: codes::TRAILING_INPUT,
            },
        }
    }

    // ── Recovery ────────────────────────────────────────────────────────

    /// Panic-mode recovery from the stop point: skip to the next sync
    /// character and describe what happened.
    fn recover(&self, session: &mut Session<'g, '_>, stop: &Stop<'g>) -> (NodeRef, Diagnostic) {
        session.cursor_mut().restore(stop.at);
        let skipped = skip_to_sync(session.cursor_mut(), &self.config);
        let input = session.cursor().input();
        debug!(
            "recovery at {}: skipped {} byte(s) up to {}",
            stop.at,
            skipped.len(),
            skipped.end
        );

        let expected = stop.expected.to_string();
        let found = describe_found(input, stop.at.offset);
        let found_len = input[stop.at.offset..].chars().next().map_or(0, char::len_utf8);
        let primary = Span::new(stop.at.offset, stop.at.offset + found_len);

        let mut diagnostic = Diagnostic::error(stop.code, format!("expected {expected}"), primary)
            .with_label(Label::primary(primary, format!("found {found}")));
        if !skipped.is_empty() {
            diagnostic =
                diagnostic.with_label(Label::secondary(skipped.to_span(), "skipped during recovery"));
        }
        if skipped.end.offset < input.len() {
            diagnostic = diagnostic.with_note(format!(
                "parsing stopped at {}; the rest of the input was not checked",
                skipped.end
            ));
        }
        let diagnostic = diagnostic.with_context(ctx!("expected" => expected.clone(), "found" => found));

        let error = Rc::new(CstNode::Error(ErrorNode {
            span: skipped,
            skipped: skipped.slice(input).to_string(),
            expected,
            leading_trivia: Vec::new(),
            trailing_trivia: Vec::new(),
        }));
        (error, diagnostic)
    }

    /// The root's children followed by the error node, under a new root.
    fn fold_error(&self, root: &NodeRef, error: NodeRef) -> NodeRef {
        let span = SourceSpan::new(root.span().start, error.span().end);
        let folded = match &**root {
            CstNode::NonTerminal(nt) => {
                let mut children = nt.children.clone();
                children.push(error);
                NonTerminal {
                    span,
                    rule: nt.rule.clone(),
                    children,
                    leading_trivia: nt.leading_trivia.clone(),
                    trailing_trivia: Vec::new(),
                }
            }
            _ => NonTerminal {
                span,
                rule: self.grammar.root().id.clone(),
                children: vec![Rc::clone(root), error],
                leading_trivia: Vec::new(),
                trailing_trivia: Vec::new(),
            },
        };
        Rc::new(CstNode::NonTerminal(folded))
    }
}

/// `'c'` for the character at `offset`, or `end of input`.
fn describe_found(input: &str, offset: usize) -> String {
    match input.get(offset..).and_then(|rest| rest.chars().next()) {
        Some(c) => format!("'{}'", c.escape_debug()),
        None => "end of input".to_string(),
    }
}
