use std::rc::Rc;

use packrat_cst_grammar::RuleId;
use serde::Serialize;

use crate::source::SourceSpan;

/// Shared handle to an immutable CST node.
///
/// Memoized results and the finished tree point at the same nodes, so a
/// subtree reused from the cache is never copied.
pub type NodeRef = Rc<CstNode>;

/// Kind of a trivia run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriviaKind {
    /// Spaces, tabs, newlines and other whitespace.
    Whitespace,
    /// `// ...` up to (not including) the newline.
    LineComment,
    /// `/* ... */`.
    BlockComment,
}

/// A run of whitespace or a comment, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trivia {
    /// What kind of run this is.
    pub kind: TriviaKind,
    /// Where it sits in the input.
    pub span: SourceSpan,
    /// The exact text.
    pub text: String,
}

/// Leaf produced by a literal, character-class or wildcard match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Terminal {
    /// Matched range.
    pub span: SourceSpan,
    /// Built-in kind of the primitive that matched.
    pub rule: RuleId,
    /// Matched text.
    pub text: String,
    /// Trivia consumed right before the match.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub leading_trivia: Vec<Trivia>,
    /// Trivia attached after the match.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trailing_trivia: Vec<Trivia>,
}

/// Interior node produced by a grammar rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NonTerminal {
    /// Range from the first character of the rule body to its end.
    pub span: SourceSpan,
    /// Rule that produced the node.
    pub rule: RuleId,
    /// Child nodes in document order.
    pub children: Vec<NodeRef>,
    /// Trivia consumed before the rule body.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub leading_trivia: Vec<Trivia>,
    /// Trivia after the node (only the root carries any).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trailing_trivia: Vec<Trivia>,
}

/// Leaf produced by a lexical token rule; its inner structure is opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Matched range.
    pub span: SourceSpan,
    /// Token rule, or [`RuleId::LexicalToken`] for anonymous tokens.
    pub rule: RuleId,
    /// Matched text.
    pub text: String,
    /// Trivia consumed right before the token.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub leading_trivia: Vec<Trivia>,
    /// Trivia attached after the token.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trailing_trivia: Vec<Trivia>,
}

/// Placeholder for input skipped during error recovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorNode {
    /// Skipped range; may be empty.
    pub span: SourceSpan,
    /// The skipped text.
    pub skipped: String,
    /// What the parser expected at the start of the range.
    pub expected: String,
    /// Trivia before the skipped range.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub leading_trivia: Vec<Trivia>,
    /// Trivia after the skipped range.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub trailing_trivia: Vec<Trivia>,
}

/// A node in the concrete syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum CstNode {
    /// Primitive match.
    Terminal(Terminal),
    /// Rule application.
    NonTerminal(NonTerminal),
    /// Lexical token.
    Token(Token),
    /// Recovery placeholder.
    Error(ErrorNode),
}

impl CstNode {
    /// Range covered by the node itself, excluding its own trivia.
    pub fn span(&self) -> SourceSpan {
        match self {
            CstNode::Terminal(n) => n.span,
            CstNode::NonTerminal(n) => n.span,
            CstNode::Token(n) => n.span,
            CstNode::Error(n) => n.span,
        }
    }

    /// Rule tag. Error nodes have none.
    pub fn rule(&self) -> Option<&RuleId> {
        match self {
            CstNode::Terminal(n) => Some(&n.rule),
            CstNode::NonTerminal(n) => Some(&n.rule),
            CstNode::Token(n) => Some(&n.rule),
            CstNode::Error(_) => None,
        }
    }

    /// Trivia immediately before the node.
    pub fn leading_trivia(&self) -> &[Trivia] {
        match self {
            CstNode::Terminal(n) => &n.leading_trivia,
            CstNode::NonTerminal(n) => &n.leading_trivia,
            CstNode::Token(n) => &n.leading_trivia,
            CstNode::Error(n) => &n.leading_trivia,
        }
    }

    /// Trivia immediately after the node.
    pub fn trailing_trivia(&self) -> &[Trivia] {
        match self {
            CstNode::Terminal(n) => &n.trailing_trivia,
            CstNode::NonTerminal(n) => &n.trailing_trivia,
            CstNode::Token(n) => &n.trailing_trivia,
            CstNode::Error(n) => &n.trailing_trivia,
        }
    }

    /// Children of a non-terminal; empty for leaves.
    pub fn children(&self) -> &[NodeRef] {
        match self {
            CstNode::NonTerminal(n) => &n.children,
            _ => &[],
        }
    }

    /// Leaf text (skipped text for error nodes); `None` for non-terminals.
    pub fn text(&self) -> Option<&str> {
        match self {
            CstNode::Terminal(n) => Some(&n.text),
            CstNode::Token(n) => Some(&n.text),
            CstNode::Error(n) => Some(&n.skipped),
            CstNode::NonTerminal(_) => None,
        }
    }

    /// Whether this is a recovery placeholder.
    pub fn is_error(&self) -> bool {
        matches!(self, CstNode::Error(_))
    }

    /// Reassemble the text this subtree was parsed from, trivia included.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        self.write_source(&mut out);
        out
    }

    fn write_source(&self, out: &mut String) {
        for t in self.leading_trivia() {
            out.push_str(&t.text);
        }
        match self.text() {
            Some(text) => out.push_str(text),
            None => {
                for child in self.children() {
                    child.write_source(out);
                }
            }
        }
        for t in self.trailing_trivia() {
            out.push_str(&t.text);
        }
    }

    /// A copy of this node with `trailing` as its trailing trivia.
    ///
    /// Children are shared, not copied.
    pub fn with_trailing_trivia(&self, trailing: Vec<Trivia>) -> CstNode {
        match self {
            CstNode::Terminal(n) => CstNode::Terminal(Terminal {
                trailing_trivia: trailing,
                ..n.clone()
            }),
            CstNode::NonTerminal(n) => CstNode::NonTerminal(NonTerminal {
                trailing_trivia: trailing,
                ..n.clone()
            }),
            CstNode::Token(n) => CstNode::Token(Token {
                trailing_trivia: trailing,
                ..n.clone()
            }),
            CstNode::Error(n) => CstNode::Error(ErrorNode {
                trailing_trivia: trailing,
                ..n.clone()
            }),
        }
    }

    /// Depth-first, parent-before-children traversal starting at this node.
    pub fn preorder(&self) -> Preorder<'_> {
        Preorder { stack: vec![self] }
    }
}

/// Iterator returned by [`CstNode::preorder`].
#[derive(Debug)]
pub struct Preorder<'a> {
    stack: Vec<&'a CstNode>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a CstNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack
            .extend(node.children().iter().rev().map(|c| c.as_ref()));
        Some(node)
    }
}
