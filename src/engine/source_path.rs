//! Lattice path bookkeeping for partial rule applications.

use crate::SymbolId;
use crate::lattice::LatticeArc;

/// One step of a source path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep {
    /// A terminal consumed from a lattice arc.
    Terminal(SymbolId),
    /// A completed nonterminal crossed at no lattice cost.
    NonTerminal,
}

/// Accumulated lattice cost and the steps taken by a (partial) rule
/// application. Values are immutable; every extension returns a new path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourcePath {
    cost: f32,
    steps: Vec<PathStep>,
}

impl SourcePath {
    /// The empty, zero-cost path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cross `arc`: add its cost and record its label.
    pub fn extend(&self, arc: &LatticeArc) -> SourcePath {
        let mut steps = Vec::with_capacity(self.steps.len() + 1);
        steps.extend_from_slice(&self.steps);
        steps.push(PathStep::Terminal(arc.label()));
        SourcePath { cost: self.cost + arc.cost(), steps }
    }

    /// Cross a completed nonterminal. The cost is unchanged.
    pub fn extend_nonterminal(&self) -> SourcePath {
        let mut steps = Vec::with_capacity(self.steps.len() + 1);
        steps.extend_from_slice(&self.steps);
        steps.push(PathStep::NonTerminal);
        SourcePath { cost: self.cost, steps }
    }

    pub fn cost(&self) -> f32 {
        self.cost
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Labels of the terminals consumed so far, in order.
    pub fn terminals(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.steps.iter().filter_map(|step| match step {
            PathStep::Terminal(label) => Some(*label),
            PathStep::NonTerminal => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_accumulates_cost_without_touching_the_original() {
        let start = SourcePath::new();
        let one = start.extend(&LatticeArc::new(0, 1, 0.5, 7));
        let two = one.extend_nonterminal().extend(&LatticeArc::new(3, 5, 1.25, 9));

        assert_eq!(start.cost(), 0.0);
        assert!(start.steps().is_empty());
        assert_eq!(one.cost(), 0.5);
        assert_eq!(two.cost(), 1.75);
        assert_eq!(two.steps(), &[PathStep::Terminal(7), PathStep::NonTerminal, PathStep::Terminal(9)]);
        assert_eq!(two.terminals().collect::<Vec<_>>(), vec![7, 9]);
    }
}
