//! Engine run metrics.
//!
//! Every expansion call returns how many dot items it created; the parser adds
//! those counts up here instead of bumping a shared counter. Metrics are cheap
//! enough to collect on every run:
//!
//! - `Parser::run` returns a `RunResult` carrying both charts and these metrics.
//! - The verbose API and the CLI report them per span width.

use super::chart::{CellTable, SuperNodeId};
use super::dot_chart::DotChart;
use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct RunMetrics {
    /// Total elapsed time for [`Parser::run`](super::Parser::run).
    pub total: Duration,
    /// Dot items placed by seeding, over all grammars.
    pub seeded: usize,
    /// Dot items created by expansion, over all grammars.
    pub dot_items: usize,
    /// SuperNodes created in the main chart.
    pub super_nodes: usize,
    /// Distinct derivations recorded in the main chart.
    pub derivations: usize,
    /// One entry per span width, in increasing order.
    pub passes: Vec<PassMetrics>,
}

/// Counts and timing for every span of one width.
#[derive(Debug, Default, Clone)]
pub struct PassMetrics {
    pub width: usize,
    pub duration: Duration,
    pub dot_items: usize,
    pub super_nodes: usize,
    pub derivations: usize,
    /// SuperNodes that only exist through unary closure.
    pub unary_super_nodes: usize,
}

impl RunMetrics {
    pub(crate) fn absorb(&mut self, pass: PassMetrics) {
        self.dot_items += pass.dot_items;
        self.super_nodes += pass.super_nodes;
        self.derivations += pass.derivations;
        self.passes.push(pass);
    }
}

/// Both charts after a full run.
pub struct RunResult<'a> {
    pub cells: CellTable,
    pub dot_charts: Vec<DotChart<'a>>,
    /// The goal SuperNode over the whole input, if one was built.
    pub goal: Option<SuperNodeId>,
    pub metrics: RunMetrics,
}
