//! Grammars and their source-side tries.
//!
//! The dot chart never looks at a grammar's rules directly. It walks a prefix
//! tree over rule source sides, one symbol at a time:
//!
//! ```text
//! rules:   [X] ||| a b        [X] ||| a [Y]       [S] ||| [X] [Y]
//!
//! trie:    root ──a──> • ──b──> •{[X] -> a b}
//!                      └─[Y]──> •{[X] -> a [Y]}
//!          root ─[X]─> • ─[Y]─> •{[S] -> [X] [Y]}
//! ```
//!
//! A trie position that ends one or more rules carries a `RuleCollection`.
//! Positions are shared as `TrieNode` (`Arc<dyn Trie>`): the grammar owns the
//! trie, dot chart items only hold read-only handles into it.
//!
//! ## Modules
//!
//! - `memory.rs`: the in-memory trie, its builder, and `MemoryGrammar`.
//! - `loader.rs`: parses `[LHS] ||| source ||| target` rule text.

#[path = "grammar/loader.rs"]
mod loader;
#[path = "grammar/memory.rs"]
mod memory;

pub use loader::{parse_rule, parse_rules};
pub use memory::{DEFAULT_SPAN_LIMIT, GrammarBuilder, GrammarOptions, MemoryGrammar, MemoryTrie};

use crate::SymbolId;
use crate::vocab::is_nonterminal;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// A synchronous rule. Only the source side takes part in matching; the
/// target side is carried along for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    lhs: SymbolId,
    source: Vec<SymbolId>,
    target: String,
    arity: usize,
}

impl Rule {
    pub fn new(lhs: SymbolId, source: Vec<SymbolId>, target: impl Into<String>) -> Self {
        let arity = source.iter().filter(|&&s| is_nonterminal(s)).count();
        Rule { lhs, source, target: target.into(), arity }
    }

    pub fn lhs(&self) -> SymbolId {
        self.lhs
    }

    pub fn source(&self) -> &[SymbolId] {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Number of nonterminals on the source side.
    pub fn arity(&self) -> usize {
        self.arity
    }
}

/// The rules attached to one trie position. All of them share a source side
/// (up to regex merging, see `MemoryTrie`).
#[derive(Debug, Clone, Default)]
pub struct RuleCollection {
    rules: Vec<Arc<Rule>>,
    arity: usize,
    source: Vec<SymbolId>,
}

impl RuleCollection {
    pub fn new(rules: Vec<Arc<Rule>>) -> Self {
        let (arity, source) = rules.first().map(|r| (r.arity(), r.source().to_vec())).unwrap_or_default();
        RuleCollection { rules, arity, source }
    }

    pub fn rules(&self) -> &[Arc<Rule>] {
        &self.rules
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn source(&self) -> &[SymbolId] {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Shared handle to a trie position.
pub type TrieNode = Arc<dyn Trie>;

bitflags::bitflags! {
    /// Optional fast paths a trie implementation can declare.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TrieCapabilities: u8 {
        /// `Trie::sorted_nonterminals` returns a precomputed list.
        const SORTED_NONTERMINALS = 1 << 0;
    }
}

/// A position in a grammar's source-side prefix tree.
pub trait Trie: fmt::Debug + Send + Sync {
    /// Follow the edge labelled `symbol`.
    fn match_symbol(&self, symbol: SymbolId) -> Option<TrieNode>;

    /// True if any edge leaves this position.
    fn has_extensions(&self) -> bool;

    /// Labels of every edge leaving this position, in no particular order.
    fn child_symbols(&self) -> Vec<SymbolId>;

    /// Rules completed at this position, if any.
    fn rule_collection(&self) -> Option<&RuleCollection>;

    fn capabilities(&self) -> TrieCapabilities {
        TrieCapabilities::empty()
    }

    /// Precomputed ascending list of nonterminal edge labels. Only consulted
    /// when `capabilities()` contains `SORTED_NONTERMINALS`.
    fn sorted_nonterminals(&self) -> Option<&[SymbolId]> {
        None
    }
}

/// A grammar as seen by the dot chart.
pub trait Grammar: Send + Sync {
    /// Whether any rule may apply over `(i, j)`, whose shortest lattice path is
    /// `path_length` arcs long.
    fn has_rule_for_span(&self, i: usize, j: usize, path_length: usize) -> bool;

    /// Root of the source-side trie.
    fn trie_root(&self) -> Option<TrieNode>;
}

/// Ascending nonterminal labels leaving `trie`.
///
/// Uses the precomputed list when the trie declares it, and filters and sorts
/// `child_symbols` otherwise.
pub fn reachable_nonterminals(trie: &dyn Trie) -> Cow<'_, [SymbolId]> {
    if trie.capabilities().contains(TrieCapabilities::SORTED_NONTERMINALS) {
        if let Some(sorted) = trie.sorted_nonterminals() {
            return Cow::Borrowed(sorted);
        }
    }
    let mut nts: Vec<SymbolId> = trie.child_symbols().into_iter().filter(|&s| is_nonterminal(s)).collect();
    nts.sort_unstable();
    nts.dedup();
    Cow::Owned(nts)
}

/// Binary search in an ascending symbol list.
pub fn contains_sorted(sorted: &[SymbolId], symbol: SymbolId) -> bool {
    sorted.binary_search(&symbol).is_ok()
}

/// True if `a` and `b` are the same trie position.
pub fn same_position(a: &TrieNode, b: &TrieNode) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Flat(Vec<SymbolId>);

    impl Trie for Flat {
        fn match_symbol(&self, _symbol: SymbolId) -> Option<TrieNode> {
            None
        }
        fn has_extensions(&self) -> bool {
            !self.0.is_empty()
        }
        fn child_symbols(&self) -> Vec<SymbolId> {
            self.0.clone()
        }
        fn rule_collection(&self) -> Option<&RuleCollection> {
            None
        }
    }

    #[test]
    fn reachable_nonterminals_filters_and_sorts_without_capability() {
        let trie = Flat(vec![4, -1, 2, -7, -3, -1]);
        let nts = reachable_nonterminals(&trie);
        assert!(matches!(nts, Cow::Owned(_)));
        assert_eq!(nts.as_ref(), &[-7, -3, -1]);
    }

    #[test]
    fn contains_sorted_uses_order() {
        let sorted = [-9, -4, -2];
        assert!(contains_sorted(&sorted, -4));
        assert!(!contains_sorted(&sorted, -3));
        assert!(!contains_sorted(&[], -1));
    }

    #[test]
    fn rule_arity_counts_nonterminals() {
        let rule = Rule::new(-1, vec![-2, 5, -3], "x");
        assert_eq!(rule.arity(), 2);

        let collection = RuleCollection::new(vec![Arc::new(rule)]);
        assert_eq!(collection.arity(), 2);
        assert_eq!(collection.source(), &[-2, 5, -3]);
        assert_eq!(collection.len(), 1);
        assert!(RuleCollection::default().is_empty());
    }

    #[test]
    fn same_position_is_identity() {
        let a: TrieNode = Arc::new(Flat(vec![]));
        let b: TrieNode = Arc::new(Flat(vec![]));
        assert!(same_position(&a, &a.clone()));
        assert!(!same_position(&a, &b));
    }
}
