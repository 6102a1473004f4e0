//! Dot chart items.

use super::chart::SuperNodeId;
use super::source_path::SourcePath;
use crate::grammar::{RuleCollection, Trie, TrieNode, same_position};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Opaque identity of a trie position.
///
/// Only meaningful inside one dot cell: two items over different spans may
/// share a trie position and therefore a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrieKey(usize);

impl TrieKey {
    pub fn of(node: &TrieNode) -> Self {
        TrieKey(Arc::as_ptr(node).cast::<()>() as usize)
    }
}

/// A partial application of a rule anchored at `(begin, end)`.
///
/// The trie position marks the dot: everything on the path from the root to
/// it has been matched over the span, and `antecedents` holds the completed
/// nonterminals crossed on the way, in order.
///
/// ```text
/// rule:  [S] -> [NP] likes • [NP]
///                          ^ trie position
/// span:  (0, 2)   antecedents: [#3 (NP over 0..1)]
/// ```
///
/// DotNodes are never mutated; moving the dot creates a new item.
///
/// # Equality
///
/// Two DotNodes are equal when they sit at the same trie position, whatever
/// their spans. Only compare or hash DotNodes from the same dot cell.
#[derive(Debug, Clone)]
pub struct DotNode {
    begin: usize,
    end: usize,
    trie: TrieNode,
    antecedents: Vec<SuperNodeId>,
    source_path: SourcePath,
}

impl DotNode {
    /// Build an item whose antecedents are `antecedents_in` followed by
    /// `current`, if any.
    pub(crate) fn new(
        trie: TrieNode,
        begin: usize,
        end: usize,
        antecedents_in: &[SuperNodeId],
        current: Option<SuperNodeId>,
        source_path: SourcePath,
    ) -> Self {
        let mut antecedents = Vec::with_capacity(antecedents_in.len() + usize::from(current.is_some()));
        antecedents.extend_from_slice(antecedents_in);
        antecedents.extend(current);
        DotNode { begin, end, trie, antecedents, source_path }
    }

    pub fn begin(&self) -> usize {
        self.begin
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn trie_node(&self) -> &dyn Trie {
        self.trie.as_ref()
    }

    pub fn trie_handle(&self) -> &TrieNode {
        &self.trie
    }

    pub fn trie_key(&self) -> TrieKey {
        TrieKey::of(&self.trie)
    }

    /// True if at least one rule is complete at this dot position.
    pub fn has_rules(&self) -> bool {
        self.trie.rule_collection().is_some_and(|c| !c.is_empty())
    }

    pub fn rule_collection(&self) -> Option<&RuleCollection> {
        self.trie.rule_collection()
    }

    pub fn antecedents(&self) -> &[SuperNodeId] {
        &self.antecedents
    }

    pub fn source_path(&self) -> &SourcePath {
        &self.source_path
    }
}

impl PartialEq for DotNode {
    fn eq(&self, other: &Self) -> bool {
        same_position(&self.trie, &other.trie)
    }
}

impl Eq for DotNode {}

impl Hash for DotNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.trie_key().hash(state);
    }
}

impl fmt::Display for DotNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rules = self.rule_collection().map_or(0, RuleCollection::len);
        write!(f, "DOTNODE i={} j={} #rules={} #tails={}", self.begin, self.end, rules, self.antecedents.len())
    }
}
