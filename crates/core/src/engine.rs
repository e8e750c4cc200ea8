//! The evaluation engine: combinators, the memoized rule driver and
//! token-boundary mode, all operating on one [`Session`].

use std::collections::HashSet;
use std::rc::Rc;

use log::{trace, warn};
use packrat_cst_grammar::{Expr, Grammar, Rule, RuleId};

use crate::cst::{CstNode, NodeRef, NonTerminal, Terminal, Token, Trivia};
use crate::failure::{Expected, FailureTracker, Furthest};
use crate::matchers::{match_any, match_char_class, match_literal};
use crate::memo::{MemoEntry, MemoKey, MemoTable, ParseStats};
use crate::source::{Cursor, SourceLocation, SourceSpan};
use crate::trivia::scan_trivia;

/// Why an expression did not match. Purely control flow: it is always
/// handled by backtracking and never escapes the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Failure<'g> {
    /// What the failing expression wanted.
    pub expected: Expected<'g>,
}

impl<'g> Failure<'g> {
    fn new(expected: Expected<'g>) -> Self {
        Self { expected }
    }
}

/// Outcome of evaluating one expression: the nodes it produced, in order.
pub type Step<'g> = Result<Vec<NodeRef>, Failure<'g>>;

/// All mutable state of one parse call.
///
/// A session is created for every parse and dropped when it returns; nothing
/// in it is shared between parses.
#[derive(Debug)]
pub struct Session<'g, 'src> {
    grammar: &'g Grammar,
    cursor: Cursor<'src>,
    memoize: bool,
    memo: MemoTable<'g>,
    failures: FailureTracker<'g>,
    /// Rule invocations currently on the stack, for left-recursion detection.
    active: HashSet<MemoKey>,
    /// Trivia skipping is suspended inside lexical tokens.
    lexical: bool,
    stats: ParseStats,
}

impl<'g, 'src> Session<'g, 'src> {
    /// A fresh session over `input`.
    pub fn new(grammar: &'g Grammar, input: &'src str, memoize: bool) -> Self {
        Self {
            grammar,
            cursor: Cursor::new(input),
            memoize,
            memo: MemoTable::new(),
            failures: FailureTracker::new(),
            active: HashSet::new(),
            lexical: false,
            stats: ParseStats::default(),
        }
    }

    /// The input cursor.
    pub fn cursor(&self) -> &Cursor<'src> {
        &self.cursor
    }

    /// Mutable access to the input cursor.
    pub fn cursor_mut(&mut self) -> &mut Cursor<'src> {
        &mut self.cursor
    }

    /// The furthest failure recorded so far.
    pub fn furthest(&self) -> Furthest<'g> {
        self.failures.furthest()
    }

    /// Counters for this session.
    pub fn stats(&self) -> ParseStats {
        ParseStats {
            cache_entries: self.memo.len() as u64,
            ..self.stats
        }
    }

    /// Consume trivia at the cursor unless inside a lexical token.
    pub fn skip_trivia(&mut self) -> Vec<Trivia> {
        if self.lexical {
            Vec::new()
        } else {
            scan_trivia(&mut self.cursor)
        }
    }

    // ── Expressions ─────────────────────────────────────────────────────

    /// Evaluate `expr` at the cursor. On failure the cursor is left exactly
    /// where it was.
    pub fn eval(&mut self, expr: &'g Expr) -> Step<'g> {
        match expr {
            Expr::Literal {
                text,
                case_insensitive,
            } => self.primitive(RuleId::Literal, |c| {
                match_literal(c, text.as_str(), *case_insensitive)
            }),
            Expr::Class(class) => self.primitive(RuleId::CharClass, |c| match_char_class(c, class)),
            Expr::Any => self.primitive(RuleId::Any, |c| match_any(c)),
            Expr::Rule(ordinal) => self.call_rule(*ordinal).map(|node| vec![node]),
            Expr::Seq(items) => self.sequence(items),
            Expr::Choice(alternatives) => self.choice(alternatives),
            Expr::Optional(inner) => {
                let start = self.cursor.location();
                self.eval(inner).or_else(|_| {
                    self.cursor.restore(start);
                    Ok(Vec::new())
                })
            }
            Expr::ZeroOrMore(inner) => self.repeat(inner, false),
            Expr::OneOrMore(inner) => self.repeat(inner, true),
            Expr::And(inner) => self.predicate(inner, true),
            Expr::Not(inner) => self.predicate(inner, false),
            Expr::Token(inner) => self.anonymous_token(inner).map(|node| vec![node]),
        }
    }

    fn primitive<F>(&mut self, kind: RuleId, matcher: F) -> Step<'g>
    where
        F: FnOnce(&mut Cursor<'src>) -> Result<SourceSpan, Expected<'g>>,
    {
        let before = self.cursor.location();
        let leading = self.skip_trivia();
        let at = self.cursor.location();
        match matcher(&mut self.cursor) {
            Ok(span) => Ok(vec![Rc::new(CstNode::Terminal(Terminal {
                span,
                rule: kind,
                text: span.slice(self.cursor.input()).to_string(),
                leading_trivia: leading,
                trailing_trivia: Vec::new(),
            }))]),
            Err(expected) => {
                self.cursor.restore(before);
                self.failures.record(at, expected);
                Err(Failure::new(expected))
            }
        }
    }

    fn sequence(&mut self, items: &'g [Expr]) -> Step<'g> {
        let start = self.cursor.location();
        let mut nodes = Vec::new();
        for item in items {
            match self.eval(item) {
                Ok(mut produced) => nodes.append(&mut produced),
                Err(failure) => {
                    self.cursor.restore(start);
                    return Err(failure);
                }
            }
        }
        Ok(nodes)
    }

    fn choice(&mut self, alternatives: &'g [Expr]) -> Step<'g> {
        let start = self.cursor.location();
        for alternative in alternatives {
            if let Ok(nodes) = self.eval(alternative) {
                return Ok(nodes);
            }
            self.cursor.restore(start);
        }
        Err(Failure::new(Expected::Alternatives))
    }

    /// Shared loop for `*` and `+`. An iteration that succeeds without
    /// consuming input ends the loop.
    fn repeat(&mut self, inner: &'g Expr, at_least_one: bool) -> Step<'g> {
        let start = self.cursor.location();
        let mut nodes = Vec::new();
        let mut matched = 0usize;
        loop {
            let before = self.cursor.offset();
            match self.eval(inner) {
                Ok(mut produced) => {
                    nodes.append(&mut produced);
                    matched += 1;
                    if self.cursor.offset() == before {
                        break;
                    }
                }
                Err(failure) if at_least_one && matched == 0 => {
                    self.cursor.restore(start);
                    return Err(failure);
                }
                Err(_) => break,
            }
        }
        Ok(nodes)
    }

    /// And/not lookahead. Failures inside are control flow, not expectations,
    /// so the inner evaluation runs against a scratch tracker.
    fn predicate(&mut self, inner: &'g Expr, positive: bool) -> Step<'g> {
        let start = self.cursor.location();
        let outer = std::mem::take(&mut self.failures);
        let outcome = self.eval(inner);
        self.failures = outer;
        self.cursor.restore(start);
        match (outcome, positive) {
            (Ok(_), true) | (Err(_), false) => Ok(Vec::new()),
            (Err(failure), true) => Err(failure),
            (Ok(_), false) => Err(Failure::new(Expected::Lookahead)),
        }
    }

    fn anonymous_token(&mut self, inner: &'g Expr) -> Result<NodeRef, Failure<'g>> {
        let start = self.cursor.location();
        let leading = self.skip_trivia();
        let body_start = self.cursor.location();
        let was_lexical = std::mem::replace(&mut self.lexical, true);
        let outcome = self.eval(inner);
        self.lexical = was_lexical;
        match outcome {
            Ok(_) => Ok(self.token_node(RuleId::LexicalToken, body_start, leading)),
            Err(failure) => {
                self.cursor.restore(start);
                Err(failure)
            }
        }
    }

    fn token_node(&self, rule: RuleId, body_start: SourceLocation, leading: Vec<Trivia>) -> NodeRef {
        let span = self.cursor.span_from(body_start);
        Rc::new(CstNode::Token(Token {
            span,
            rule,
            text: span.slice(self.cursor.input()).to_string(),
            leading_trivia: leading,
            trailing_trivia: Vec::new(),
        }))
    }

    // ── Rule driver ─────────────────────────────────────────────────────

    /// Apply rule `ordinal` at the cursor, consulting the packrat cache.
    ///
    /// The key is taken before leading trivia, so a cached success restores
    /// the cursor to the end of the match and a cached failure leaves it at
    /// the invocation point.
    pub fn call_rule(&mut self, ordinal: u32) -> Result<NodeRef, Failure<'g>> {
        let grammar = self.grammar;
        // Ordinals come from the compiled grammar, which validated every reference.
        let rule = &grammar.rules()[ordinal as usize];
        self.stats.rule_calls += 1;

        let start = self.cursor.location();
        let key = MemoKey {
            rule: ordinal,
            offset: start.offset,
            lexical: self.lexical,
        };

        if self.memoize {
            if let Some(entry) = self.memo.get(&key).cloned() {
                self.stats.cache_hits += 1;
                trace!("memo hit: {} at {}", rule.id, start);
                return match entry {
                    MemoEntry::Success {
                        node,
                        end,
                        furthest,
                    } => {
                        self.failures.merge(furthest);
                        self.cursor.restore(end);
                        Ok(node)
                    }
                    MemoEntry::Failure { expected, furthest } => {
                        self.failures.merge(furthest);
                        Err(Failure::new(expected))
                    }
                };
            }
            self.stats.cache_misses += 1;
        }

        if !self.active.insert(key) {
            warn!(
                "left recursion: rule `{}` re-entered at {} without consuming input",
                rule.id, start
            );
            return Err(Failure::new(Expected::Label(rule.id.name())));
        }

        self.stats.evaluations += 1;
        let outer = std::mem::take(&mut self.failures);
        let outcome = self.evaluate_rule(rule);
        let local = std::mem::replace(&mut self.failures, outer).furthest();
        self.failures.merge(local);
        self.active.remove(&key);

        if self.memoize {
            let entry = match &outcome {
                Ok(node) => MemoEntry::Success {
                    node: Rc::clone(node),
                    end: self.cursor.location(),
                    furthest: local,
                },
                Err(failure) => MemoEntry::Failure {
                    expected: failure.expected,
                    furthest: local,
                },
            };
            self.memo.insert(key, entry);
        }
        outcome
    }

    /// Run a rule body against the (empty) local failure tracker.
    fn evaluate_rule(&mut self, rule: &'g Rule) -> Result<NodeRef, Failure<'g>> {
        let start = self.cursor.location();
        let leading = self.skip_trivia();
        let body_start = self.cursor.location();

        let outcome = if rule.token {
            let was_lexical = std::mem::replace(&mut self.lexical, true);
            let outcome = self.eval(&rule.expr);
            self.lexical = was_lexical;
            // A token fails as a unit; its inner failures are not reported.
            self.failures = FailureTracker::new();
            outcome
        } else {
            self.eval(&rule.expr)
        };

        match outcome {
            Ok(_) if rule.token => Ok(self.token_node(rule.id.clone(), body_start, leading)),
            Ok(children) => {
                let span = self.cursor.span_from(body_start);
                Ok(Rc::new(CstNode::NonTerminal(NonTerminal {
                    span,
                    rule: rule.id.clone(),
                    children,
                    leading_trivia: leading,
                    trailing_trivia: Vec::new(),
                })))
            }
            Err(failure) => {
                self.cursor.restore(start);
                match rule.expected_label() {
                    Some(label) => {
                        self.failures.relabel(body_start, Expected::Label(label));
                        Err(Failure::new(Expected::Label(label)))
                    }
                    None => Err(failure),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packrat_cst_grammar::GrammarBuilder;
    use packrat_cst_grammar::expr::{
        and, any, choice, class, lit, not, opt, plus, rule, seq, star, token,
    };

    fn run(g: &Grammar, input: &str) -> (Result<NodeRef, ()>, usize, Option<String>) {
        let mut s = Session::new(g, input, true);
        let out = s.call_rule(g.root().ordinal()).map_err(|_| ());
        let offset = s.cursor().offset();
        let furthest = s.furthest().map(|(loc, e)| format!("{}@{}", e, loc.offset));
        (out, offset, furthest)
    }

    #[test]
    fn sequence_resets_on_failure() {
        let g = GrammarBuilder::new()
            .rule("S", choice([seq([lit("a"), lit("b")]), seq([lit("a"), lit("c")])]))
            .build("S")
            .unwrap();
        let (out, offset, _) = run(&g, "ac");
        assert!(out.is_ok());
        assert_eq!(offset, 2);
    }

    #[test]
    fn failing_rule_leaves_cursor_at_start() {
        let g = GrammarBuilder::new()
            .rule("S", seq([lit("a"), lit("b"), lit("c")]))
            .build("S")
            .unwrap();
        let (out, offset, furthest) = run(&g, "ab!");
        assert!(out.is_err());
        assert_eq!(offset, 0);
        assert_eq!(furthest.as_deref(), Some("'c'@2"));
    }

    #[test]
    fn trivia_between_symbols_lands_in_leading_trivia() {
        let g = GrammarBuilder::new()
            .rule("S", seq([lit("a"), lit("b")]))
            .build("S")
            .unwrap();
        let (out, offset, _) = run(&g, "a /* c */ b");
        let root = out.unwrap();
        assert_eq!(offset, 11);
        let b = &root.children()[1];
        assert_eq!(b.text(), Some("b"));
        let trivia: Vec<&str> = b.leading_trivia().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(trivia, vec![" ", "/* c */", " "]);
        assert_eq!(root.to_source(), "a /* c */ b");
    }

    #[test]
    fn repetition_over_nullable_expression_terminates() {
        let g = GrammarBuilder::new()
            .rule("S", seq([star(opt(lit("x"))), plus(star(lit("y")))]))
            .build("S")
            .unwrap();
        let (out, offset, _) = run(&g, "xxyy");
        assert!(out.is_ok());
        assert_eq!(offset, 4);
        let (out, offset, _) = run(&g, "");
        assert!(out.is_ok());
        assert_eq!(offset, 0);
    }

    #[test]
    fn one_or_more_requires_first_match() {
        let g = GrammarBuilder::new()
            .rule("S", plus(lit("x")))
            .build("S")
            .unwrap();
        assert!(run(&g, "y").0.is_err());
        let (out, _, _) = run(&g, "x x x");
        assert_eq!(out.unwrap().children().len(), 3);
    }

    #[test]
    fn predicates_never_consume_and_stay_quiet() {
        let g = GrammarBuilder::new()
            .rule("S", seq([not(lit("no")), and(lit("n")), any(), any()]))
            .build("S")
            .unwrap();
        let (out, offset, furthest) = run(&g, "nx");
        let root = out.unwrap();
        assert_eq!(offset, 2);
        assert_eq!(root.children().len(), 2);
        assert_eq!(furthest, None, "the not-predicate's failure is not an expectation");

        assert!(run(&g, "no").0.is_err());
    }

    #[test]
    fn token_rule_suspends_trivia_and_reports_label() {
        let g = GrammarBuilder::new()
            .rule("S", seq([rule("Word"), rule("Word")]))
            .token_rule("Word", plus(class("a-z")))
            .build("S")
            .unwrap();
        let (out, _, _) = run(&g, "ab  cd");
        let root = out.unwrap();
        let second = &root.children()[1];
        assert!(matches!(**second, CstNode::Token(_)));
        assert_eq!(second.text(), Some("cd"));
        assert_eq!(second.leading_trivia()[0].text, "  ");

        let (out, _, furthest) = run(&g, "ab 12");
        assert!(out.is_err());
        assert_eq!(furthest.as_deref(), Some("Word@3"));
    }

    #[test]
    fn anonymous_token_is_tagged_lexical() {
        let g = GrammarBuilder::new()
            .rule("S", token(seq([lit("0x"), plus(class("0-9a-f"))])))
            .build("S")
            .unwrap();
        let (out, _, _) = run(&g, " 0xff");
        let root = out.unwrap();
        let tok = &root.children()[0];
        assert_eq!(tok.rule(), Some(&RuleId::LexicalToken));
        assert_eq!(tok.text(), Some("0xff"));
        assert!(run(&g, "0x ff").0.is_err(), "no trivia inside a token");
    }

    #[test]
    fn labeled_rule_replaces_expectation_at_its_start() {
        let g = GrammarBuilder::new()
            .rule("S", seq([lit("="), rule("Expr")]))
            .labeled("Expr", "<Expr>", choice([class("0-9"), lit("(")]))
            .build("S")
            .unwrap();
        let (_, _, furthest) = run(&g, "= ;");
        assert_eq!(furthest.as_deref(), Some("<Expr>@2"));
    }

    #[test]
    fn memo_hits_reuse_nodes_and_count() {
        let g = GrammarBuilder::new()
            .rule("S", choice([seq([rule("A"), lit("!")]), seq([rule("A"), lit("?")])]))
            .rule("A", lit("a"))
            .build("S")
            .unwrap();
        let mut s = Session::new(&g, "a?", true);
        assert!(s.call_rule(0).is_ok());
        let stats = s.stats();
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.evaluations, 2);
        assert_eq!(stats.cache_entries, 2);

        let mut s = Session::new(&g, "a?", false);
        assert!(s.call_rule(0).is_ok());
        assert_eq!(s.stats().cache_hits, 0);
        assert_eq!(s.stats().evaluations, 3);
    }

    #[test]
    fn left_recursion_fails_instead_of_looping() {
        let g = GrammarBuilder::new()
            .rule("E", choice([seq([rule("E"), lit("+"), lit("1")]), lit("1")]))
            .build("E")
            .unwrap();
        let (out, offset, _) = run(&g, "1+1");
        assert!(out.is_ok());
        assert_eq!(offset, 1);
    }
}
