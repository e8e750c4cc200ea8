//! Grammar tables for the packrat-cst engine.
//!
//! A grammar is plain data: a list of named rules, each mapping a [`RuleId`]
//! to a combinator expression over other rules and primitives. Grammars are
//! written either in Rust with the helper constructors in [`expr`] and a
//! [`GrammarBuilder`], or as JSON/JSONC documents deserialized into a
//! [`GrammarSpec`]. Both paths go through [`Grammar::compile`], which resolves
//! rule names to ordinals, compiles character classes, and rejects malformed
//! tables with a [`GrammarError`].
//!
//! The engine in `packrat_cst_core` consumes a compiled [`Grammar`] and never
//! refers to any rule by name.

#![warn(missing_docs)]

/// Character-class compilation and matching.
pub mod char_class;
/// Grammar construction and validation errors.
pub mod error;
/// Expression DSL: serializable specs, helper constructors, compiled form.
pub mod expr;
/// Compiled grammar tables, specs, and the builder.
pub mod grammar;
/// Rule identifiers used as memoization keys and CST node tags.
pub mod rule_id;

pub use char_class::{CharClass, CharClassError};
pub use error::GrammarError;
pub use expr::{ClassSpec, Expr, ExprSpec};
pub use grammar::{Grammar, GrammarBuilder, GrammarSpec, Rule, RuleSpec};
pub use rule_id::RuleId;

/// Current format version for the grammar JSON schema.
///
/// Documents whose major version differs are rejected.
pub const GRAMMAR_FORMAT_VERSION: &str = "1.0.0";
