//! CKY-ordered driver over the dot charts and the main chart.
//!
//! The dot chart only knows how to move dots; this module decides *when*. It
//! owns one `DotChart` per grammar plus the shared `CellTable`, and walks spans
//! bottom-up so that every call sees the state it depends on:
//!
//! ```text
//! for width in 1..=n:
//!   for i in 0..=n-width:  (j = i + width)
//!     (1) expand        every dot chart over (i,j)          -> DotNodes over (i,j)
//!     (2) complete      DotNodes with rules                 -> SuperNodes over (i,j)
//!     (3) unary close   [X] over (i,j) + rule [Y] ||| [X]   -> [Y] over (i,j)
//!     (4) start         DotNodes over (i,i) + cell (i,j)    -> DotNodes over (i,j)
//! ```
//!
//! Step (4) runs last so the items it creates see the finished cell, and it
//! skips pure unary rules because step (3) already applied them.
//!
//! Spans the grammar does not allow (`Grammar::has_rule_for_span`) are never
//! completed. Spans with no lattice path between their end points have no
//! items to complete in the first place.

use super::chart::{CellTable, CompletedCells, Derivation, SuperNodeId};
use super::dot_chart::DotChart;
use super::metrics::{PassMetrics, RunMetrics, RunResult};
use crate::SymbolId;
use crate::error::DotChartError;
use crate::grammar::Grammar;
use crate::lattice::Lattice;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

/// Parser builds every constituent the grammars license over an input lattice.
///
/// Usage: create with `Parser::new(&lattice, &grammars, goal)` then call
/// `run()`. The goal symbol only decides which SuperNode `RunResult::goal`
/// points at; the charts are filled the same way whatever it is.
pub struct Parser<'a> {
    input: &'a Lattice,
    dot_charts: Vec<DotChart<'a>>,
    cells: CellTable,
    goal: SymbolId,
}

impl<'a> Parser<'a> {
    /// Seed one dot chart per grammar.
    pub fn new(input: &'a Lattice, grammars: &[&'a dyn Grammar], goal: SymbolId) -> Result<Self, DotChartError> {
        let dot_charts = grammars.iter().map(|&grammar| DotChart::new(input, grammar)).collect::<Result<Vec<_>, _>>()?;
        Ok(Parser { input, dot_charts, cells: CellTable::new(input.node_count()), goal })
    }

    /// Fill both charts over every span and look up the goal.
    pub fn run(mut self) -> RunResult<'a> {
        let total_start = Instant::now();
        let n = self.input.source_len();
        let mut metrics = RunMetrics {
            seeded: self.dot_charts.iter().map(DotChart::items_added).sum(),
            ..RunMetrics::default()
        };

        for width in 1..=n {
            let pass_start = Instant::now();
            let mut pass = PassMetrics { width, ..PassMetrics::default() };
            for i in 0..=n - width {
                self.expand_span(i, i + width, &mut pass);
            }
            pass.duration = pass_start.elapsed();
            tracing::debug!(
                width,
                dot_items = pass.dot_items,
                super_nodes = pass.super_nodes,
                derivations = pass.derivations,
                "finished span width"
            );
            metrics.absorb(pass);
        }

        let goal = self.goal_node();
        metrics.total = total_start.elapsed();
        tracing::info!(
            nodes = self.input.node_count(),
            dot_items = metrics.seeded + metrics.dot_items,
            super_nodes = metrics.super_nodes,
            goal_reached = goal.is_some(),
            "parse finished"
        );
        RunResult { cells: self.cells, dot_charts: self.dot_charts, goal, metrics }
    }

    fn expand_span(&mut self, i: usize, j: usize, pass: &mut PassMetrics) {
        for dot_chart in &mut self.dot_charts {
            pass.dot_items += dot_chart.expand_dot_cell(i, j, &self.cells);
        }

        let fresh = self.complete_span(i, j, pass);
        self.close_unary(i, j, fresh, pass);

        for dot_chart in &mut self.dot_charts {
            pass.dot_items += dot_chart.start_dot_items(i, j, &self.cells);
        }
    }

    /// Turn every dot item over `(i, j)` that ends a rule into a derivation.
    /// Returns the SuperNodes this created.
    fn complete_span(&mut self, i: usize, j: usize, pass: &mut PassMetrics) -> Vec<SuperNodeId> {
        let mut fresh = Vec::new();
        let Some(path_length) = self.input.distance(i, j) else {
            return fresh;
        };
        for dot_chart in &self.dot_charts {
            if !dot_chart.grammar().has_rule_for_span(i, j, path_length) {
                continue;
            }
            for dot_node in dot_chart.dot_cell(i, j) {
                let Some(rules) = dot_node.rule_collection() else { continue };
                for rule in rules.rules() {
                    let Some((id, created)) = self.cells.ensure_super_node(i, j, rule.lhs()) else { continue };
                    if created {
                        fresh.push(id);
                        pass.super_nodes += 1;
                    }
                    let derivation = Derivation {
                        rule: Arc::clone(rule),
                        antecedents: dot_node.antecedents().to_vec(),
                        source_cost: dot_node.source_path().cost(),
                    };
                    if self.cells.add_derivation(id, derivation) {
                        pass.derivations += 1;
                    }
                }
            }
        }
        fresh
    }

    /// Apply `[Y] ||| [X]` rules over `(i, j)` until no new SuperNode appears.
    ///
    /// Only newly created SuperNodes are queued, so cyclic unary rules stop
    /// once every left-hand side exists in the cell.
    fn close_unary(&mut self, i: usize, j: usize, fresh: Vec<SuperNodeId>, pass: &mut PassMetrics) {
        let Some(path_length) = self.input.distance(i, j) else { return };
        let mut queue: VecDeque<SuperNodeId> = fresh.into();
        while let Some(id) = queue.pop_front() {
            let Some(lhs) = self.cells.super_node(id).map(|node| node.lhs) else { continue };
            for dot_chart in &self.dot_charts {
                let grammar = dot_chart.grammar();
                if !grammar.has_rule_for_span(i, j, path_length) {
                    continue;
                }
                let Some(child) = grammar.trie_root().and_then(|root| root.match_symbol(lhs)) else { continue };
                let Some(rules) = child.rule_collection() else { continue };
                for rule in rules.rules().iter().filter(|rule| rule.source().len() == 1 && rule.arity() == 1) {
                    let Some((parent, created)) = self.cells.ensure_super_node(i, j, rule.lhs()) else { continue };
                    if created {
                        tracing::trace!(i, j, lhs = rule.lhs(), "unary closure created super node");
                        queue.push_back(parent);
                        pass.super_nodes += 1;
                        pass.unary_super_nodes += 1;
                    }
                    let derivation = Derivation { rule: Arc::clone(rule), antecedents: vec![id], source_cost: 0.0 };
                    if self.cells.add_derivation(parent, derivation) {
                        pass.derivations += 1;
                    }
                }
            }
        }
    }

    /// The goal SuperNode over the whole input, if any.
    fn goal_node(&self) -> Option<SuperNodeId> {
        let n = self.input.source_len();
        if n == 0 {
            return None;
        }
        self.cells.cell(0, n).and_then(|cell| cell.get(self.goal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{GrammarOptions, MemoryGrammar};
    use crate::vocab::Vocabulary;

    fn sentence(vocab: &Vocabulary, text: &str) -> Lattice {
        let ids: Vec<SymbolId> = text.split_whitespace().map(|w| vocab.id(w)).collect();
        Lattice::from_sentence(&ids)
    }

    fn run(text: &str, rules: &str, check: impl FnOnce(&Vocabulary, RunResult<'_>)) {
        let vocab = Vocabulary::new();
        let grammar = MemoryGrammar::from_text(rules, &vocab, GrammarOptions::default()).unwrap();
        let lattice = sentence(&vocab, text);
        let goal = vocab.id("[S]");
        let result = Parser::new(&lattice, &[&grammar as &dyn Grammar], goal).unwrap().run();
        check(&vocab, result);
    }

    #[test]
    fn binary_rule_reaches_goal() {
        let rules = "[D] ||| the ||| le\n[N] ||| cat ||| chat\n[NP] ||| [D] [N] ||| [D,1] [N,2]\n[S] ||| [NP] sleeps ||| [NP,1] dort\n";
        run("the cat sleeps", rules, |vocab, result| {
            let goal = result.goal.expect("goal over the whole sentence");
            let node = result.cells.super_node(goal).unwrap();
            assert_eq!((node.begin, node.end), (0, 3));
            assert_eq!(node.derivations.len(), 1);

            let np = result.cells.cell(0, 2).and_then(|c| c.get(vocab.id("[NP]"))).unwrap();
            assert_eq!(node.derivations[0].antecedents, vec![np]);
            assert_eq!(result.metrics.passes.len(), 3);
            assert_eq!(result.metrics.passes.iter().map(|p| p.width).collect::<Vec<_>>(), vec![1, 2, 3]);
        });
    }

    #[test]
    fn no_goal_when_the_sentence_is_not_covered() {
        run("the dog", "[S] ||| the cat ||| le chat\n", |_, result| {
            assert!(result.goal.is_none());
            assert_eq!(result.metrics.super_nodes, 0);
        });
    }

    #[test]
    fn cyclic_unary_rules_terminate() {
        let rules = "[X] ||| a ||| a\n[Y] ||| [X] ||| [X,1]\n[X] ||| [Y] ||| [Y,1]\n[S] ||| [Y] ||| [Y,1]\n";
        run("a", rules, |vocab, result| {
            let cell = result.cells.cell(0, 1).unwrap();
            assert_eq!(cell.len(), 3);
            let x = cell.get(vocab.id("[X]")).unwrap();
            // [X] ||| a and [X] ||| [Y]
            assert_eq!(result.cells.super_node(x).unwrap().derivations.len(), 2);
            assert!(result.goal.is_some());
            assert_eq!(result.metrics.passes[0].unary_super_nodes, 2);
        });
    }

    #[test]
    fn unary_rules_feed_longer_rules() {
        let rules = "[A] ||| a ||| a\n[B] ||| [A] ||| [A,1]\n[S] ||| [B] b ||| [B,1] b\n";
        run("a b", rules, |_, result| assert!(result.goal.is_some()));
    }

    #[test]
    fn empty_input_never_reaches_goal() {
        run("", "[S] ||| a ||| a\n", |_, result| {
            assert!(result.goal.is_none());
            assert!(result.metrics.passes.is_empty());
            assert_eq!(result.metrics.seeded, 1);
        });
    }
}
