//! In-memory grammar.
//!
//! Rules are first inserted into a mutable `TrieBuilder`, then frozen into an
//! immutable tree of `MemoryTrie` nodes that can be shared across threads.
//! Freezing precomputes each node's sorted nonterminal labels, so the dot
//! chart's merge step never has to filter and sort on the hot path.
//!
//! ## Regex matching
//!
//! With `GrammarOptions::regex_matching`, terminal edge labels are treated as
//! anchored regular expressions over input words (`walk(s|ed)?`). One input
//! word may then match several edges; their targets are combined into a single
//! `MergedTrie` position:
//!
//! ```text
//!          ┌─"walk(s|ed)?"─> A
//!   node ──┤                        match("walks") -> Merged[A, B]
//!          └─"walks"───────> B
//! ```
//!
//! Labels that do not compile as a regex match literally. Nonterminals always
//! match exactly.

use super::{Grammar, Rule, RuleCollection, Trie, TrieCapabilities, TrieNode};
use crate::SymbolId;
use crate::error::GrammarError;
use crate::vocab::{Vocabulary, is_nonterminal};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Default maximum path length a rule may cover.
pub const DEFAULT_SPAN_LIMIT: usize = 20;

/// Options fixed when a grammar is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrammarOptions {
    /// Longest lattice path (in arcs) any rule may cover. `None` removes the
    /// limit, as for glue grammars.
    pub span_limit: Option<usize>,
    /// Treat terminal labels as regular expressions.
    pub regex_matching: bool,
}

impl Default for GrammarOptions {
    fn default() -> Self {
        GrammarOptions { span_limit: Some(DEFAULT_SPAN_LIMIT), regex_matching: false }
    }
}

// --- Trie --------------------------------------------------------------------

#[derive(Debug, Default)]
pub(crate) struct TrieBuilder {
    children: BTreeMap<SymbolId, TrieBuilder>,
    rules: Vec<Arc<Rule>>,
}

impl TrieBuilder {
    pub(crate) fn insert(&mut self, rule: Rule) {
        let mut node = self;
        for &symbol in rule.source() {
            node = node.children.entry(symbol).or_default();
        }
        node.rules.push(Arc::new(rule));
    }

    /// Freeze into an immutable tree. `regex_vocab` enables regex matching and
    /// supplies the words behind terminal ids.
    pub(crate) fn freeze(self, regex_vocab: Option<&Vocabulary>) -> MemoryTrie {
        let patterns = regex_vocab.map(|vocab| RegexEdges::compile(vocab, self.children.keys().copied()));
        let children: BTreeMap<SymbolId, Arc<MemoryTrie>> =
            self.children.into_iter().map(|(symbol, child)| (symbol, Arc::new(child.freeze(regex_vocab)))).collect();

        // BTreeMap keys are ascending, and nonterminals sort before terminals.
        let sorted_nonterminals = children.keys().copied().take_while(|&s| is_nonterminal(s)).collect();
        let rules = if self.rules.is_empty() { None } else { Some(RuleCollection::new(self.rules)) };

        MemoryTrie { children, sorted_nonterminals, rules, patterns }
    }
}

/// Compiled terminal edge labels of one node, for regex matching.
#[derive(Debug)]
struct RegexEdges {
    vocab: Vocabulary,
    patterns: Vec<(SymbolId, Regex)>,
}

impl RegexEdges {
    fn compile(vocab: &Vocabulary, symbols: impl Iterator<Item = SymbolId>) -> Self {
        let patterns = symbols
            .filter(|&s| !is_nonterminal(s))
            .filter_map(|s| vocab.word(s).map(|word| (s, word)))
            .filter_map(|(s, word)| {
                let re = Regex::new(&format!("^(?:{word})$"))
                    .or_else(|_| Regex::new(&format!("^{}$", regex::escape(&word))))
                    .ok()?;
                Some((s, re))
            })
            .collect();
        RegexEdges { vocab: vocab.clone(), patterns }
    }

    fn matching(&self, children: &BTreeMap<SymbolId, Arc<MemoryTrie>>, symbol: SymbolId) -> Vec<TrieNode> {
        let Some(word) = self.vocab.word(symbol) else {
            return Vec::new();
        };
        self.patterns
            .iter()
            .filter(|(_, re)| re.is_match(&word))
            .filter_map(|(key, _)| children.get(key))
            .map(|child| Arc::clone(child) as TrieNode)
            .collect()
    }
}

/// Immutable trie node owned by a `MemoryGrammar`.
#[derive(Debug, Default)]
pub struct MemoryTrie {
    children: BTreeMap<SymbolId, Arc<MemoryTrie>>,
    sorted_nonterminals: Vec<SymbolId>,
    rules: Option<RuleCollection>,
    patterns: Option<RegexEdges>,
}

impl MemoryTrie {
    /// Number of rules stored at and below this node.
    pub fn rule_count(&self) -> usize {
        self.rules.as_ref().map_or(0, RuleCollection::len) + self.children.values().map(|c| c.rule_count()).sum::<usize>()
    }
}

impl Trie for MemoryTrie {
    fn match_symbol(&self, symbol: SymbolId) -> Option<TrieNode> {
        match &self.patterns {
            Some(edges) if !is_nonterminal(symbol) => merge(edges.matching(&self.children, symbol)),
            _ => self.children.get(&symbol).map(|child| Arc::clone(child) as TrieNode),
        }
    }

    fn has_extensions(&self) -> bool {
        !self.children.is_empty()
    }

    fn child_symbols(&self) -> Vec<SymbolId> {
        self.children.keys().copied().collect()
    }

    fn rule_collection(&self) -> Option<&RuleCollection> {
        self.rules.as_ref()
    }

    fn capabilities(&self) -> TrieCapabilities {
        TrieCapabilities::SORTED_NONTERMINALS
    }

    fn sorted_nonterminals(&self) -> Option<&[SymbolId]> {
        Some(&self.sorted_nonterminals)
    }
}

/// Several trie positions reached by one regex match, seen as one.
///
/// Built on demand during matching, so it has no precomputed nonterminal list.
#[derive(Debug)]
pub(crate) struct MergedTrie {
    parts: Vec<TrieNode>,
    rules: Option<RuleCollection>,
}

impl MergedTrie {
    fn new(parts: Vec<TrieNode>) -> Self {
        let rules: Vec<Arc<Rule>> =
            parts.iter().filter_map(|p| p.rule_collection()).flat_map(|c| c.rules().iter().cloned()).collect();
        let rules = if rules.is_empty() { None } else { Some(RuleCollection::new(rules)) };
        MergedTrie { parts, rules }
    }
}

impl Trie for MergedTrie {
    fn match_symbol(&self, symbol: SymbolId) -> Option<TrieNode> {
        merge(self.parts.iter().filter_map(|p| p.match_symbol(symbol)).collect())
    }

    fn has_extensions(&self) -> bool {
        self.parts.iter().any(|p| p.has_extensions())
    }

    fn child_symbols(&self) -> Vec<SymbolId> {
        let mut symbols: Vec<SymbolId> = self.parts.iter().flat_map(|p| p.child_symbols()).collect();
        symbols.sort_unstable();
        symbols.dedup();
        symbols
    }

    fn rule_collection(&self) -> Option<&RuleCollection> {
        self.rules.as_ref()
    }
}

fn merge(mut nodes: Vec<TrieNode>) -> Option<TrieNode> {
    match nodes.len() {
        0 => None,
        1 => nodes.pop(),
        _ => Some(Arc::new(MergedTrie::new(nodes))),
    }
}

// --- Grammar -----------------------------------------------------------------

/// A grammar held entirely in memory.
#[derive(Debug)]
pub struct MemoryGrammar {
    root: Arc<MemoryTrie>,
    options: GrammarOptions,
    rule_count: usize,
}

impl MemoryGrammar {
    pub fn builder(vocab: &Vocabulary, options: GrammarOptions) -> GrammarBuilder {
        GrammarBuilder { vocab: vocab.clone(), options, trie: TrieBuilder::default(), rule_count: 0 }
    }

    /// Load a grammar from rule text (see `parse_rules`).
    pub fn from_text(text: &str, vocab: &Vocabulary, options: GrammarOptions) -> Result<Self, GrammarError> {
        let mut builder = Self::builder(vocab, options);
        builder.load_text(text)?;
        Ok(builder.build())
    }

    pub fn root(&self) -> &Arc<MemoryTrie> {
        &self.root
    }

    pub fn options(&self) -> GrammarOptions {
        self.options
    }

    pub fn rule_count(&self) -> usize {
        self.rule_count
    }
}

impl Grammar for MemoryGrammar {
    fn has_rule_for_span(&self, i: usize, j: usize, path_length: usize) -> bool {
        match self.options.span_limit {
            None => true,
            Some(limit) => i == j || path_length <= limit,
        }
    }

    fn trie_root(&self) -> Option<TrieNode> {
        Some(Arc::clone(&self.root) as TrieNode)
    }
}

/// Accumulates rules, then freezes them into a `MemoryGrammar`.
#[derive(Debug)]
pub struct GrammarBuilder {
    vocab: Vocabulary,
    options: GrammarOptions,
    trie: TrieBuilder,
    rule_count: usize,
}

impl GrammarBuilder {
    pub fn add_rule(&mut self, rule: Rule) -> &mut Self {
        self.trie.insert(rule);
        self.rule_count += 1;
        self
    }

    pub fn load_text(&mut self, text: &str) -> Result<&mut Self, GrammarError> {
        for rule in super::parse_rules(text, &self.vocab)? {
            self.add_rule(rule);
        }
        Ok(self)
    }

    pub fn build(self) -> MemoryGrammar {
        let regex_vocab = self.options.regex_matching.then_some(&self.vocab);
        let root = Arc::new(self.trie.freeze(regex_vocab));
        tracing::debug!(rules = self.rule_count, regex = self.options.regex_matching, "grammar built");
        MemoryGrammar { root, options: self.options, rule_count: self.rule_count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::reachable_nonterminals;
    use std::borrow::Cow;

    fn grammar(text: &str, options: GrammarOptions) -> (Vocabulary, MemoryGrammar) {
        let vocab = Vocabulary::new();
        let grammar = MemoryGrammar::from_text(text, &vocab, options).unwrap();
        (vocab, grammar)
    }

    #[test]
    fn frozen_trie_follows_rule_source_sides() {
        let (vocab, g) = grammar("[X] ||| a b ||| B A\n[X] ||| a [Y,1] ||| [Y,1] A\n", GrammarOptions::default());
        let a = vocab.get("a").unwrap();
        let b = vocab.get("b").unwrap();
        let y = vocab.get("[Y]").unwrap();

        let root = g.trie_root().unwrap();
        let pos_a = root.match_symbol(a).unwrap();
        assert!(pos_a.has_extensions());
        assert!(pos_a.rule_collection().is_none());

        let pos_ab = pos_a.match_symbol(b).unwrap();
        assert!(!pos_ab.has_extensions());
        assert_eq!(pos_ab.rule_collection().map(|c| c.len()), Some(1));

        let pos_ay = pos_a.match_symbol(y).unwrap();
        assert_eq!(pos_ay.rule_collection().map(|c| c.arity()), Some(1));
        assert!(root.match_symbol(b).is_none());
        assert_eq!(g.rule_count(), 2);
        assert_eq!(g.root().rule_count(), 2);
    }

    #[test]
    fn memory_trie_declares_precomputed_nonterminals() {
        let (vocab, g) = grammar("[S] ||| [X] a ||| x\n[S] ||| [Y] ||| y\n[S] ||| c ||| c\n", GrammarOptions::default());
        let root = g.trie_root().unwrap();

        assert!(root.capabilities().contains(TrieCapabilities::SORTED_NONTERMINALS));
        let nts = reachable_nonterminals(root.as_ref());
        assert!(matches!(nts, Cow::Borrowed(_)));

        let mut expected = vec![vocab.get("[X]").unwrap(), vocab.get("[Y]").unwrap()];
        expected.sort_unstable();
        assert_eq!(nts.as_ref(), expected.as_slice());
    }

    #[test]
    fn span_limit_gates_rule_applicability() {
        let cases = [
            (GrammarOptions { span_limit: Some(2), regex_matching: false }, (0, 3, 3), false),
            (GrammarOptions { span_limit: Some(2), regex_matching: false }, (0, 2, 2), true),
            (GrammarOptions { span_limit: Some(0), regex_matching: false }, (4, 4, 0), true),
            (GrammarOptions { span_limit: None, regex_matching: false }, (0, 50, 50), true),
        ];
        for (options, (i, j, len), expected) in cases {
            let (_, g) = grammar("[X] ||| a ||| a", options);
            assert_eq!(g.has_rule_for_span(i, j, len), expected, "{options:?} ({i},{j}) len {len}");
        }
    }

    #[test]
    fn regex_matching_merges_matching_edges() {
        let options = GrammarOptions { regex_matching: true, ..GrammarOptions::default() };
        let (vocab, g) = grammar("[V] ||| walk(s|ed)? ||| marcher\n[V] ||| walks ||| marche\n", options);
        let walks = vocab.id("walks");
        let walked = vocab.id("walked");
        let run = vocab.id("run");

        let root = g.trie_root().unwrap();
        let merged = root.match_symbol(walks).unwrap();
        assert_eq!(merged.rule_collection().map(|c| c.len()), Some(2));
        assert!(!merged.capabilities().contains(TrieCapabilities::SORTED_NONTERMINALS));

        let single = root.match_symbol(walked).unwrap();
        assert_eq!(single.rule_collection().map(|c| c.len()), Some(1));
        assert!(root.match_symbol(run).is_none());
    }

    #[test]
    fn regex_mode_matches_invalid_patterns_literally() {
        let options = GrammarOptions { regex_matching: true, ..GrammarOptions::default() };
        let (vocab, g) = grammar("[P] ||| ( ||| (\n", options);
        let paren = vocab.id("(");
        let root = g.trie_root().unwrap();
        assert!(root.match_symbol(paren).is_some());
    }

    #[test]
    fn merged_positions_keep_extending() {
        let options = GrammarOptions { regex_matching: true, ..GrammarOptions::default() };
        let (vocab, g) = grammar("[A] ||| go.* [X] ||| a\n[B] ||| goes [X] ||| b\n", options);
        let goes = vocab.id("goes");
        let x = vocab.get("[X]").unwrap();

        let merged = g.trie_root().unwrap().match_symbol(goes).unwrap();
        assert!(merged.has_extensions());
        assert_eq!(reachable_nonterminals(merged.as_ref()).as_ref(), &[x]);

        let done = merged.match_symbol(x).unwrap();
        let lhs: Vec<SymbolId> = done.rule_collection().unwrap().rules().iter().map(|r| r.lhs()).collect();
        assert_eq!(lhs, vec![vocab.get("[A]").unwrap(), vocab.get("[B]").unwrap()]);
    }
}
