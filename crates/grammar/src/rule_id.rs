use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// Identifier of a grammar production, or of one of the engine's built-in
/// anonymous node kinds.
///
/// Grammar rules carry a non-negative ordinal (their index in the grammar
/// table) and a name. Built-in kinds use reserved negative ordinals so the two
/// ranges never collide when used as memoization keys or node tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleId {
    /// A production defined by the grammar table.
    Rule {
        /// Index of the rule in its grammar.
        ordinal: u32,
        /// Rule name as written in the grammar.
        name: Arc<str>,
    },
    /// Text matched by a literal primitive.
    Literal,
    /// A character matched by a character-class primitive.
    CharClass,
    /// A character matched by the wildcard primitive.
    Any,
    /// Text captured by an anonymous token-boundary expression.
    LexicalToken,
}

impl RuleId {
    /// Create the identifier of a grammar rule.
    pub fn rule(ordinal: u32, name: impl Into<Arc<str>>) -> Self {
        RuleId::Rule {
            ordinal,
            name: name.into(),
        }
    }

    /// Signed ordinal: the rule index for grammar rules, `-1..=-4` for the
    /// built-in literal, char-class, any, and lexical-token kinds.
    pub fn ordinal(&self) -> i64 {
        match self {
            RuleId::Rule { ordinal, .. } => i64::from(*ordinal),
            RuleId::Literal => -1,
            RuleId::CharClass => -2,
            RuleId::Any => -3,
            RuleId::LexicalToken => -4,
        }
    }

    /// Display name of the rule or built-in kind.
    pub fn name(&self) -> &str {
        match self {
            RuleId::Rule { name, .. } => name,
            RuleId::Literal => "literal",
            RuleId::CharClass => "char-class",
            RuleId::Any => "any",
            RuleId::LexicalToken => "lexical-token",
        }
    }

    /// Whether this is one of the engine's anonymous built-in kinds.
    pub fn is_builtin(&self) -> bool {
        !matches!(self, RuleId::Rule { .. })
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for RuleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("RuleId", 2)?;
        s.serialize_field("ordinal", &self.ordinal())?;
        s.serialize_field("name", self.name())?;
        s.end()
    }
}
