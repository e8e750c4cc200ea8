use serde::{Deserialize, Serialize};

use crate::char_class::CharClass;

// ── Serializable form ───────────────────────────────────────────────────

/// A parsing expression as written in a grammar document.
///
/// Rule references are by name. [`Grammar::compile`](crate::Grammar::compile)
/// resolves them to ordinals and turns each spec into an [`Expr`].
///
/// In JSON every variant is a single-key object, e.g.
/// `{"seq": [{"rule": "Type"}, {"lit": ";"}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprSpec {
    /// Exact text.
    Lit(String),
    /// Text compared case-insensitively.
    LitNocase(String),
    /// One character from a class.
    Class(ClassSpec),
    /// Any single character.
    Any,
    /// Reference to another rule by name.
    Rule(String),
    /// All elements in order.
    Seq(Vec<ExprSpec>),
    /// First alternative that succeeds.
    Choice(Vec<ExprSpec>),
    /// Zero or one.
    Opt(Box<ExprSpec>),
    /// Zero or more.
    Star(Box<ExprSpec>),
    /// One or more.
    Plus(Box<ExprSpec>),
    /// Succeeds iff the inner expression matches; consumes nothing.
    And(Box<ExprSpec>),
    /// Succeeds iff the inner expression fails; consumes nothing.
    Not(Box<ExprSpec>),
    /// Match the inner expression as one lexical token, without trivia.
    Token(Box<ExprSpec>),
}

/// A character class as written: a bare pattern or a pattern with flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassSpec {
    /// `"a-z_"`
    Pattern(String),
    /// `{"pattern": "a-z", "negated": true}`
    #[serde(rename_all = "camelCase")]
    Detailed {
        /// Class body without brackets.
        pattern: String,
        /// Match characters outside the pattern.
        #[serde(default)]
        negated: bool,
        /// Ignore case when matching.
        #[serde(default)]
        case_insensitive: bool,
    },
}

impl ClassSpec {
    /// Compile into a [`CharClass`].
    pub fn compile(&self) -> Result<CharClass, crate::CharClassError> {
        match self {
            ClassSpec::Pattern(p) => CharClass::parse(p, false, false),
            ClassSpec::Detailed {
                pattern,
                negated,
                case_insensitive,
            } => CharClass::parse(pattern, *negated, *case_insensitive),
        }
    }

    /// The pattern as written.
    pub fn pattern(&self) -> &str {
        match self {
            ClassSpec::Pattern(p) | ClassSpec::Detailed { pattern: p, .. } => p,
        }
    }
}

// ── Builder helpers ─────────────────────────────────────────────────────

/// Exact text.
pub fn lit(text: impl Into<String>) -> ExprSpec {
    ExprSpec::Lit(text.into())
}

/// Case-insensitive text.
pub fn lit_nocase(text: impl Into<String>) -> ExprSpec {
    ExprSpec::LitNocase(text.into())
}

/// One character from `pattern`.
pub fn class(pattern: impl Into<String>) -> ExprSpec {
    ExprSpec::Class(ClassSpec::Pattern(pattern.into()))
}

/// One character *not* in `pattern`.
pub fn not_class(pattern: impl Into<String>) -> ExprSpec {
    ExprSpec::Class(ClassSpec::Detailed {
        pattern: pattern.into(),
        negated: true,
        case_insensitive: false,
    })
}

/// Any single character.
pub fn any() -> ExprSpec {
    ExprSpec::Any
}

/// Reference to the rule called `name`.
pub fn rule(name: impl Into<String>) -> ExprSpec {
    ExprSpec::Rule(name.into())
}

/// Sequence.
pub fn seq(items: impl IntoIterator<Item = ExprSpec>) -> ExprSpec {
    ExprSpec::Seq(items.into_iter().collect())
}

/// Ordered choice.
pub fn choice(items: impl IntoIterator<Item = ExprSpec>) -> ExprSpec {
    ExprSpec::Choice(items.into_iter().collect())
}

/// Optional.
pub fn opt(e: ExprSpec) -> ExprSpec {
    ExprSpec::Opt(Box::new(e))
}

/// Zero or more.
pub fn star(e: ExprSpec) -> ExprSpec {
    ExprSpec::Star(Box::new(e))
}

/// One or more.
pub fn plus(e: ExprSpec) -> ExprSpec {
    ExprSpec::Plus(Box::new(e))
}

/// And-predicate.
pub fn and(e: ExprSpec) -> ExprSpec {
    ExprSpec::And(Box::new(e))
}

/// Not-predicate.
pub fn not(e: ExprSpec) -> ExprSpec {
    ExprSpec::Not(Box::new(e))
}

/// Anonymous lexical token.
pub fn token(e: ExprSpec) -> ExprSpec {
    ExprSpec::Token(Box::new(e))
}

// ── Compiled form ───────────────────────────────────────────────────────

/// A compiled parsing expression, ready for evaluation.
///
/// Rule references are ordinals into the owning [`Grammar`](crate::Grammar)
/// and character classes are pre-compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Literal text.
    Literal {
        /// Text to match.
        text: String,
        /// Compare with simple case folding.
        case_insensitive: bool,
    },
    /// One character from a class.
    Class(CharClass),
    /// Any single character.
    Any,
    /// Rule reference by ordinal.
    Rule(u32),
    /// Sequence.
    Seq(Vec<Expr>),
    /// Ordered choice.
    Choice(Vec<Expr>),
    /// Zero or one.
    Optional(Box<Expr>),
    /// Zero or more.
    ZeroOrMore(Box<Expr>),
    /// One or more.
    OneOrMore(Box<Expr>),
    /// And-predicate.
    And(Box<Expr>),
    /// Not-predicate.
    Not(Box<Expr>),
    /// Anonymous lexical token.
    Token(Box<Expr>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_build_nested_specs() {
        let e = seq([rule("Type"), opt(seq([lit("="), rule("Expr")])), lit(";")]);
        let ExprSpec::Seq(items) = &e else {
            panic!("expected seq, got {e:?}");
        };
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], ExprSpec::Rule("Type".into()));
        assert!(matches!(items[1], ExprSpec::Opt(_)));
    }

    #[test]
    fn json_form_is_single_key_objects() {
        let e = seq([lit("class"), not(class("a-z")), star(any())]);
        let json = serde_json::to_string(&e).unwrap();
        assert_eq!(
            json,
            r#"{"seq":[{"lit":"class"},{"not":{"class":"a-z"}},{"star":"any"}]}"#
        );
    }

    #[test]
    fn class_spec_accepts_string_or_object() {
        let bare: ExprSpec = serde_json::from_str(r#"{"class": "0-9"}"#).unwrap();
        assert_eq!(bare, class("0-9"));

        let detailed: ExprSpec =
            serde_json::from_str(r#"{"class": {"pattern": "\"\\\\", "negated": true}}"#).unwrap();
        assert_eq!(detailed, not_class("\"\\\\"));

        let ExprSpec::Class(spec) = detailed else {
            unreachable!()
        };
        let compiled = spec.compile().unwrap();
        assert!(compiled.is_negated());
        assert!(!compiled.matches('\\'));
        assert!(compiled.matches('x'));
    }

    #[test]
    fn nocase_and_token_round_trip_through_json() {
        let e = token(seq([lit_nocase("select"), plus(class("a-z"))]));
        let json = serde_json::to_string(&e).unwrap();
        let back: ExprSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
    }
}
