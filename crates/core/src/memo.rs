use std::collections::HashMap;

use serde::Serialize;

use crate::cst::NodeRef;
use crate::failure::{Expected, Furthest};
use crate::source::SourceLocation;

/// Cache key: which rule, where it was invoked (before its leading trivia),
/// and whether trivia skipping was suspended at the time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoKey {
    /// Rule ordinal.
    pub rule: u32,
    /// Byte offset of the invocation.
    pub offset: usize,
    /// Whether the call happened inside a lexical token.
    pub lexical: bool,
}

/// A memoized rule outcome. Never overwritten within a parse.
///
/// Both variants keep the furthest failure seen while evaluating the rule so
/// a cache hit leaves the failure tracker exactly as re-evaluation would.
#[derive(Debug, Clone)]
pub enum MemoEntry<'g> {
    /// The rule matched; resume at `end`.
    Success {
        /// Node produced by the rule.
        node: NodeRef,
        /// Cursor position after the match.
        end: SourceLocation,
        /// Furthest failure inside the rule.
        furthest: Furthest<'g>,
    },
    /// The rule failed; the cursor stays at the invocation point.
    Failure {
        /// What the rule expected.
        expected: Expected<'g>,
        /// Furthest failure inside the rule.
        furthest: Furthest<'g>,
    },
}

/// Per-parse packrat cache.
#[derive(Debug, Default)]
pub struct MemoTable<'g> {
    entries: HashMap<MemoKey, MemoEntry<'g>>,
}

impl<'g> MemoTable<'g> {
    /// An empty cache.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Cached outcome for `key`, if any.
    pub fn get(&self, key: &MemoKey) -> Option<&MemoEntry<'g>> {
        self.entries.get(key)
    }

    /// Store the outcome for `key`.
    pub fn insert(&mut self, key: MemoKey, entry: MemoEntry<'g>) {
        let previous = self.entries.insert(key, entry);
        debug_assert!(previous.is_none(), "memo entry for {key:?} written twice");
    }

    /// Number of stored outcomes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Counters collected during one parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    /// Rule invocations, cached or not.
    pub rule_calls: u64,
    /// Rule bodies actually run.
    pub evaluations: u64,
    /// Invocations answered from the cache.
    pub cache_hits: u64,
    /// Invocations that missed the cache (always 0 with memoization off).
    pub cache_misses: u64,
    /// Outcomes stored in the cache.
    pub cache_entries: u64,
}
