//! Main chart: completed constituents per span.
//!
//! Every completed constituent over `(i, j)` is grouped with the others that
//! share its left-hand side into one `SuperNode`. SuperNodes live in an arena
//! owned by `CellTable` and are referred to by `SuperNodeId`, so dot chart
//! items can point at them while the table keeps growing.
//!
//! ```text
//! CellTable
//!   cells:  (i,j) -> Cell { [NP] -> #4, [X] -> #7 }     (sorted by lhs id)
//!   arena:  #4 SuperNode { lhs: [NP], span: (i,j), derivations: [..] }
//! ```
//!
//! The chart records *which* rules apply over a span (`Derivation`), not
//! scored hypotheses.

use super::dedup::DerivationKey;
use super::span::ChartSpan;
use crate::SymbolId;
use crate::grammar::Rule;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Handle to a `SuperNode` in a `CellTable` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SuperNodeId(usize);

impl SuperNodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One way of building a SuperNode: a rule applied over antecedent SuperNodes.
#[derive(Debug, Clone)]
pub struct Derivation {
    pub rule: Arc<Rule>,
    pub antecedents: Vec<SuperNodeId>,
    /// Lattice cost of the source path the rule consumed.
    pub source_cost: f32,
}

/// All completed constituents over one span sharing one left-hand side.
#[derive(Debug, Clone)]
pub struct SuperNode {
    pub id: SuperNodeId,
    pub lhs: SymbolId,
    pub begin: usize,
    pub end: usize,
    pub derivations: Vec<Derivation>,
}

/// A SuperNode as listed by its cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperNodeRef {
    pub lhs: SymbolId,
    pub id: SuperNodeId,
}

/// Completed constituents over one span, keyed by left-hand side.
#[derive(Debug, Clone, Default)]
pub struct Cell {
    by_lhs: BTreeMap<SymbolId, SuperNodeId>,
}

impl Cell {
    /// SuperNodes of this cell in ascending lhs order.
    pub fn sorted_super_nodes(&self) -> impl Iterator<Item = SuperNodeRef> + '_ {
        self.by_lhs.iter().map(|(&lhs, &id)| SuperNodeRef { lhs, id })
    }

    pub fn get(&self, lhs: SymbolId) -> Option<SuperNodeId> {
        self.by_lhs.get(&lhs).copied()
    }

    pub fn len(&self) -> usize {
        self.by_lhs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_lhs.is_empty()
    }
}

/// Read-only access to completed cells, as needed by the dot chart.
pub trait CompletedCells {
    fn cell(&self, begin: usize, end: usize) -> Option<&Cell>;
}

/// Span-indexed cells plus the SuperNode arena.
#[derive(Debug, Clone)]
pub struct CellTable {
    cells: ChartSpan<Cell>,
    super_nodes: Vec<SuperNode>,
    /// Position of each recorded derivation in its SuperNode's `derivations`.
    seen: HashMap<DerivationKey, usize>,
    derivation_count: usize,
}

impl CellTable {
    /// Table for spans over `node_count` lattice nodes.
    pub fn new(node_count: usize) -> Self {
        CellTable {
            cells: ChartSpan::new(node_count, Cell::default()),
            super_nodes: Vec::new(),
            seen: HashMap::new(),
            derivation_count: 0,
        }
    }

    /// Return the SuperNode for `(begin, end, lhs)`, creating it if needed.
    ///
    /// The flag is true when the SuperNode was created by this call. Spans
    /// outside the table yield `None`.
    pub fn ensure_super_node(&mut self, begin: usize, end: usize, lhs: SymbolId) -> Option<(SuperNodeId, bool)> {
        let next = SuperNodeId(self.super_nodes.len());
        let cell = self.cells.get_mut(begin, end)?;
        if let Some(id) = cell.get(lhs) {
            return Some((id, false));
        }
        cell.by_lhs.insert(lhs, next);
        self.super_nodes.push(SuperNode { id: next, lhs, begin, end, derivations: Vec::new() });
        Some((next, true))
    }

    /// Record `derivation` on SuperNode `id`.
    ///
    /// A derivation that repeats an existing (rule, antecedents) pair only
    /// lowers the stored source cost. Returns true if a new derivation was
    /// added.
    pub fn add_derivation(&mut self, id: SuperNodeId, derivation: Derivation) -> bool {
        let key = DerivationKey::new(id, &derivation);
        let Some(node) = self.super_nodes.get_mut(id.0) else {
            return false;
        };
        if let Some(&idx) = self.seen.get(&key) {
            let existing = &mut node.derivations[idx];
            existing.source_cost = existing.source_cost.min(derivation.source_cost);
            return false;
        }
        self.seen.insert(key, node.derivations.len());
        node.derivations.push(derivation);
        self.derivation_count += 1;
        true
    }

    pub fn super_node(&self, id: SuperNodeId) -> Option<&SuperNode> {
        self.super_nodes.get(id.0)
    }

    pub fn super_nodes(&self) -> &[SuperNode] {
        &self.super_nodes
    }

    pub fn derivation_count(&self) -> usize {
        self.derivation_count
    }
}

impl CompletedCells for CellTable {
    fn cell(&self, begin: usize, end: usize) -> Option<&Cell> {
        self.cells.get(begin, end)
    }
}
