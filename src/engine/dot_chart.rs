//! Earley-style implicit binarization of grammar rules.
//!
//! The dot chart keeps, for every span `(i, j)`, the partial rule applications
//! (`DotNode`s) whose matched prefix covers exactly that span. A partial
//! application is just a position in the grammar's source-side trie, so
//! multi-symbol rules are never binarized up front: the dot advances one symbol
//! at a time.
//!
//! At every span the dot moves in one of two ways:
//!
//! ```text
//!  nonterminal:  DotNode(i,k) • [NP]   +  SuperNode [NP] over (k,j)   ->  DotNode(i,j)
//!  terminal:     DotNode(i,j-1) • w    +  lattice arc w from j-1      ->  DotNode(i,j-1+len)
//! ```
//!
//! Nonterminal extension may jump over a wide, already-completed sub-span,
//! while terminal extension consumes exactly one arc, so it only ever looks one
//! lattice node back.
//!
//! ## Ordering contract
//!
//! The dot chart does not schedule itself. `expand_dot_cell(i, j)` must only be
//! called once every `(i, k)` with `k < j` is final in this chart and every main
//! chart cell `(k, j)` with `k > i` is complete. The `Parser` drives both charts
//! in that order, widening spans one step at a time.
//!
//! One dot chart serves one input and one grammar. The main chart is passed to
//! each call rather than held, so the caller can keep adding constituents to it
//! between calls.

use super::chart::{CompletedCells, SuperNodeId};
use super::dot_node::DotNode;
use super::source_path::SourcePath;
use super::span::ChartSpan;
use crate::error::DotChartError;
use crate::grammar::{Grammar, TrieNode, contains_sorted, reachable_nonterminals};
use crate::lattice::Lattice;
use crate::vocab::is_nonterminal;

pub struct DotChart<'a> {
    grammar: &'a dyn Grammar,
    input: &'a Lattice,
    /// Number of lattice nodes; spans range over `0..=sentence_len`.
    sentence_len: usize,
    dot_cells: ChartSpan<Vec<DotNode>>,
    items_added: usize,
}

impl<'a> DotChart<'a> {
    /// Create the dot chart for `input` under `grammar` and seed it.
    pub fn new(input: &'a Lattice, grammar: &'a dyn Grammar) -> Result<Self, DotChartError> {
        let sentence_len = input.node_count();
        let mut chart = DotChart {
            grammar,
            input,
            sentence_len,
            dot_cells: ChartSpan::new(sentence_len, Vec::new()),
            items_added: 0,
        };
        chart.seed()?;
        Ok(chart)
    }

    /// Put a dot item at the trie root over every empty span `(j, j)` the
    /// grammar allows.
    fn seed(&mut self) -> Result<(), DotChartError> {
        let mut seeded = 0;
        for j in 0..self.sentence_len {
            let Some(path_length) = self.input.distance(j, j) else { continue };
            if !self.grammar.has_rule_for_span(j, j, path_length) {
                continue;
            }
            let root = self.grammar.trie_root().ok_or(DotChartError::MissingTrieRoot { position: j })?;
            self.add_dot_item(DotNode::new(root, j, j, &[], None, SourcePath::new()));
            seeded += 1;
        }
        tracing::debug!(seeded, nodes = self.sentence_len, "seeded dot chart");
        Ok(())
    }

    /// Move the dot forward over span `(i, j)`.
    ///
    /// First over completed nonterminals at every split point `i < k < j`, then
    /// over the terminal arcs leaving lattice node `j - 1`. Returns the number
    /// of items created.
    pub fn expand_dot_cell(&mut self, i: usize, j: usize, chart: &impl CompletedCells) -> usize {
        if j <= i || j > self.sentence_len {
            tracing::trace!(i, j, "expand_dot_cell: empty span");
            return 0;
        }
        tracing::debug!(i, j, "expanding dot cell");

        let mut added = 0;
        for k in i + 1..j {
            added += self.extend_dot_items_with_proved_items(i, k, j, chart, false);
        }

        let Some(node) = self.input.node(j - 1) else {
            return added;
        };
        let source = self.dot_cell(i, j - 1);
        if source.is_empty() {
            tracing::trace!(i, j, "expand_dot_cell: no items to extend over terminals");
            return added;
        }

        let mut pending = Vec::new();
        for arc in node.outgoing() {
            // A nonterminal edge is only crossed together with a SuperNode.
            if is_nonterminal(arc.label()) {
                tracing::trace!(i, j, label = arc.label(), "skipping arc with a nonterminal label");
                continue;
            }
            for dot_node in source {
                if let Some(child) = dot_node.trie_node().match_symbol(arc.label()) {
                    pending.push(DotNode::new(
                        child,
                        i,
                        j - 1 + arc.span_len(),
                        dot_node.antecedents(),
                        None,
                        dot_node.source_path().extend(arc),
                    ));
                }
            }
        }
        for item in pending {
            if self.add_dot_item(item) {
                added += 1;
            }
        }
        added
    }

    /// Start dot items from the completed constituents over exactly `(i, j)`.
    ///
    /// Pure unary rules (a single nonterminal with nothing after it) are not
    /// re-derived here; the driver closes cells under unary rules itself.
    pub fn start_dot_items(&mut self, i: usize, j: usize, chart: &impl CompletedCells) -> usize {
        self.extend_dot_items_with_proved_items(i, i, j, chart, true)
    }

    /// Combine items over `(i, k)` with completed SuperNodes over `(k, j)`.
    fn extend_dot_items_with_proved_items(
        &mut self,
        i: usize,
        k: usize,
        j: usize,
        chart: &impl CompletedCells,
        skip_unary: bool,
    ) -> usize {
        let dot_nodes = self.dot_cell(i, k);
        if dot_nodes.is_empty() {
            return 0;
        }
        let Some(cell) = chart.cell(k, j).filter(|cell| !cell.is_empty()) else {
            tracing::trace!(k, j, "no completed constituents");
            return 0;
        };
        let super_nodes: Vec<_> = cell.sorted_super_nodes().collect();

        let mut pending = Vec::new();
        for dot_node in dot_nodes {
            let trie = dot_node.trie_node();
            let nts = reachable_nonterminals(trie);
            if nts.is_empty() {
                continue;
            }
            for super_node in &super_nodes {
                if !contains_sorted(&nts, super_node.lhs) {
                    continue;
                }
                // Under regex matching one symbol may reach several trie edges;
                // they come back merged into a single position.
                let Some(child) = trie.match_symbol(super_node.lhs) else { continue };
                if !skip_unary || child.has_extensions() {
                    pending.push(extend_over(dot_node, child, j, super_node.id));
                }
            }
        }

        let mut added = 0;
        for item in pending {
            if self.add_dot_item(item) {
                added += 1;
            }
        }
        added
    }

    /// Store `item` in its cell. Returns false if its span lies outside the
    /// chart.
    fn add_dot_item(&mut self, item: DotNode) -> bool {
        let Some(cell) = self.dot_cells.get_mut(item.begin(), item.end()) else {
            tracing::trace!(item = %item, "dropping dot item outside the chart");
            return false;
        };
        tracing::trace!(item = %item, "add dot item");
        cell.push(item);
        self.items_added += 1;
        true
    }

    /// Items over `(i, j)` in insertion order. Empty when there are none.
    pub fn dot_cell(&self, i: usize, j: usize) -> &[DotNode] {
        self.dot_cells.get(i, j).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of items created so far, seeds included.
    pub fn items_added(&self) -> usize {
        self.items_added
    }

    pub fn sentence_len(&self) -> usize {
        self.sentence_len
    }

    pub fn grammar(&self) -> &'a dyn Grammar {
        self.grammar
    }
}

fn extend_over(dot_node: &DotNode, child: TrieNode, end: usize, super_node: SuperNodeId) -> DotNode {
    DotNode::new(
        child,
        dot_node.begin(),
        end,
        dot_node.antecedents(),
        Some(super_node),
        dot_node.source_path().extend_nonterminal(),
    )
}
