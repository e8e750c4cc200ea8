use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::GRAMMAR_FORMAT_VERSION;
use crate::error::GrammarError;
use crate::expr::{Expr, ExprSpec};
use crate::rule_id::RuleId;

// ── Document form ───────────────────────────────────────────────────────

/// A grammar document: the root rule name plus every rule definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarSpec {
    /// Table format version for compatibility checks.
    #[serde(default = "default_format_version")]
    pub format_version: String,
    /// Name of the rule a parse starts from.
    pub root: String,
    /// Rule definitions. Ordinals follow this order.
    pub rules: Vec<RuleSpec>,
}

fn default_format_version() -> String {
    GRAMMAR_FORMAT_VERSION.to_string()
}

/// One rule definition as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSpec {
    /// Rule name, unique within the grammar.
    pub name: String,
    /// Rule body.
    pub expr: ExprSpec,
    /// Run the body as one lexical token with trivia skipping suspended.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub token: bool,
    /// Description reported when the rule fails at its start, e.g. `<Expr>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

// ── Compiled form ───────────────────────────────────────────────────────

/// A compiled rule.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Identifier used as memo key and node tag.
    pub id: RuleId,
    /// Compiled body.
    pub expr: Expr,
    /// Whether the rule is a lexical token.
    pub token: bool,
    /// Explicit failure label, if any.
    pub expected: Option<String>,
}

impl Rule {
    /// Ordinal of this rule in its grammar.
    pub fn ordinal(&self) -> u32 {
        match self.id {
            RuleId::Rule { ordinal, .. } => ordinal,
            // Compiled rules are always created with `RuleId::Rule`.
            _ => u32::MAX,
        }
    }

    /// The label reported when this rule fails as a whole.
    ///
    /// Token rules fall back to their name so a failed keyword or identifier
    /// is reported as a unit rather than by its first inner character.
    pub fn expected_label(&self) -> Option<&str> {
        match (self.expected.as_deref(), self.token) {
            (Some(label), _) => Some(label),
            (None, true) => Some(self.id.name()),
            (None, false) => None,
        }
    }
}

/// A validated grammar table.
#[derive(Debug, Clone)]
pub struct Grammar {
    rules: Vec<Rule>,
    root: u32,
    by_name: HashMap<Arc<str>, u32>,
}

impl Grammar {
    /// Validate `spec` and compile it into a table.
    pub fn compile(spec: &GrammarSpec) -> Result<Self, GrammarError> {
        check_format_version(&spec.format_version)?;
        if spec.rules.is_empty() {
            return Err(GrammarError::EmptyGrammar);
        }

        let mut by_name: HashMap<Arc<str>, u32> = HashMap::with_capacity(spec.rules.len());
        let mut ids = Vec::with_capacity(spec.rules.len());
        for (ordinal, rule) in (0u32..).zip(&spec.rules) {
            let name: Arc<str> = Arc::from(rule.name.as_str());
            if by_name.insert(Arc::clone(&name), ordinal).is_some() {
                return Err(GrammarError::DuplicateRule(rule.name.clone()));
            }
            ids.push(RuleId::rule(ordinal, name));
        }

        let root = *by_name
            .get(spec.root.as_str())
            .ok_or_else(|| GrammarError::UnknownRoot(spec.root.clone()))?;

        let rules = spec
            .rules
            .iter()
            .zip(ids)
            .map(|(rule, id)| {
                Ok(Rule {
                    id,
                    expr: compile_expr(&rule.expr, &rule.name, &by_name)?,
                    token: rule.token,
                    expected: rule.expected.clone(),
                })
            })
            .collect::<Result<Vec<_>, GrammarError>>()?;

        Ok(Self {
            rules,
            root,
            by_name,
        })
    }

    /// Load a grammar from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, GrammarError> {
        let spec: GrammarSpec = serde_json::from_str(json)?;
        Self::compile(&spec)
    }

    /// Load a grammar from a JSON document that may contain `//` and `/* */`
    /// comments. Error positions refer to the original text.
    pub fn from_jsonc(jsonc: &str) -> Result<Self, GrammarError> {
        Self::from_json(&packrat_cst_jsonc_strip::blank_jsonc(jsonc))
    }

    /// Rule by ordinal.
    pub fn rule(&self, ordinal: u32) -> Option<&Rule> {
        self.rules.get(ordinal as usize)
    }

    /// Rule by name.
    pub fn rule_by_name(&self, name: &str) -> Option<&Rule> {
        self.by_name.get(name).and_then(|&o| self.rule(o))
    }

    /// The root rule.
    pub fn root(&self) -> &Rule {
        &self.rules[self.root as usize]
    }

    /// All rules in ordinal order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

fn check_format_version(found: &str) -> Result<(), GrammarError> {
    let major = |v: &str| v.split('.').next().map(str::to_owned);
    if major(found) == major(GRAMMAR_FORMAT_VERSION) {
        Ok(())
    } else {
        Err(GrammarError::UnsupportedFormat {
            found: found.to_string(),
            expected: GRAMMAR_FORMAT_VERSION,
        })
    }
}

fn compile_expr(
    spec: &ExprSpec,
    rule: &str,
    by_name: &HashMap<Arc<str>, u32>,
) -> Result<Expr, GrammarError> {
    let boxed = |e: &ExprSpec| compile_expr(e, rule, by_name).map(Box::new);
    let many = |items: &[ExprSpec]| {
        items
            .iter()
            .map(|e| compile_expr(e, rule, by_name))
            .collect::<Result<Vec<_>, _>>()
    };

    Ok(match spec {
        ExprSpec::Lit(text) => Expr::Literal {
            text: text.clone(),
            case_insensitive: false,
        },
        ExprSpec::LitNocase(text) => Expr::Literal {
            text: text.clone(),
            case_insensitive: true,
        },
        ExprSpec::Class(class) => {
            Expr::Class(
                class
                    .compile()
                    .map_err(|source| GrammarError::InvalidCharClass {
                        rule: rule.to_string(),
                        pattern: class.pattern().to_string(),
                        source,
                    })?,
            )
        }
        ExprSpec::Any => Expr::Any,
        ExprSpec::Rule(name) => {
            let ordinal = by_name
                .get(name.as_str())
                .ok_or_else(|| GrammarError::UnknownRule {
                    rule: rule.to_string(),
                    reference: name.clone(),
                })?;
            Expr::Rule(*ordinal)
        }
        ExprSpec::Seq(items) => Expr::Seq(many(items.as_slice())?),
        ExprSpec::Choice(items) => Expr::Choice(many(items.as_slice())?),
        ExprSpec::Opt(e) => Expr::Optional(boxed(&**e)?),
        ExprSpec::Star(e) => Expr::ZeroOrMore(boxed(&**e)?),
        ExprSpec::Plus(e) => Expr::OneOrMore(boxed(&**e)?),
        ExprSpec::And(e) => Expr::And(boxed(&**e)?),
        ExprSpec::Not(e) => Expr::Not(boxed(&**e)?),
        ExprSpec::Token(e) => Expr::Token(boxed(&**e)?),
    })
}

// ── Builder ─────────────────────────────────────────────────────────────

/// Fluent construction of a grammar in Rust.
///
/// ```
/// use packrat_cst_grammar::GrammarBuilder;
/// use packrat_cst_grammar::expr::{class, lit, plus, rule, seq};
///
/// let grammar = GrammarBuilder::new()
///     .rule("Assign", seq([rule("Name"), lit("="), rule("Name")]))
///     .token_rule("Name", plus(class("a-z")))
///     .build("Assign")
///     .unwrap();
/// assert_eq!(grammar.root().id.name(), "Assign");
/// ```
#[derive(Debug, Clone, Default)]
pub struct GrammarBuilder {
    rules: Vec<RuleSpec>,
}

impl GrammarBuilder {
    /// Start an empty grammar.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, name: &str, expr: ExprSpec, token: bool, expected: Option<&str>) -> Self {
        self.rules.push(RuleSpec {
            name: name.to_string(),
            expr,
            token,
            expected: expected.map(str::to_string),
        });
        self
    }

    /// Add a syntactic rule.
    pub fn rule(self, name: &str, expr: ExprSpec) -> Self {
        self.push(name, expr, false, None)
    }

    /// Add a lexical token rule.
    pub fn token_rule(self, name: &str, expr: ExprSpec) -> Self {
        self.push(name, expr, true, None)
    }

    /// Add a syntactic rule with a failure label.
    pub fn labeled(self, name: &str, expected: &str, expr: ExprSpec) -> Self {
        self.push(name, expr, false, Some(expected))
    }

    /// Add a lexical token rule with a failure label.
    pub fn token_labeled(self, name: &str, expected: &str, expr: ExprSpec) -> Self {
        self.push(name, expr, true, Some(expected))
    }

    /// The document form of the rules added so far.
    pub fn into_spec(self, root: &str) -> GrammarSpec {
        GrammarSpec {
            format_version: default_format_version(),
            root: root.to_string(),
            rules: self.rules,
        }
    }

    /// Validate and compile, starting parses at `root`.
    pub fn build(self, root: &str) -> Result<Grammar, GrammarError> {
        Grammar::compile(&self.into_spec(root))
    }
}
