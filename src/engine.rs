//! Chart parsing engine.
//!
//! This module is the *public entry point* for on-the-fly binarized chart
//! parsing. It is split into focused submodules under `src/engine/` while the
//! public paths stay flat (for example `crate::engine::DotChart` and
//! `crate::engine::Parser`).
//!
//! ## How the parts work together
//!
//! Two charts grow side by side over the spans of an input lattice:
//!
//! ```text
//! grammar trie ──┐
//!                │  DotChart::new              (dot_chart.rs)
//! lattice ───────┼─ seed the root at every (j, j)
//!                v
//!         Parser::run (parser.rs), span by span, narrow first
//!           - DotChart::expand_dot_cell   moves dots over terminals
//!                                         and completed nonterminals
//!           - complete                    DotNodes with rules -> CellTable
//!           - unary closure               [Y] ||| [X] inside one cell
//!           - DotChart::start_dot_items   rules starting with a nonterminal
//!                │
//!                v
//!         RunResult { cells, dot_charts, goal, metrics }
//! ```
//!
//! The dot chart holds partial rule applications (`DotNode`), the main chart
//! (`CellTable`) holds completed constituents (`SuperNode`). The dot chart
//! reads the main chart but never writes to it; completing items is the
//! parser's job.
//!
//! ## Responsibilities by module
//!
//! - `span.rs`: triangular `(i, j)` storage shared by both charts.
//! - `source_path.rs`: cost and symbols of the lattice path a DotNode consumed.
//! - `dot_node.rs`: the immutable dot chart item.
//! - `dot_chart.rs`: seeding and dot movement for one grammar.
//! - `chart.rs`: SuperNodes, cells and the `CompletedCells` view.
//! - `dedup.rs`: keys that keep each derivation recorded once.
//! - `parser.rs`: the CKY-ordered driver.
//! - `metrics.rs`: per-width counts and timings.

#[path = "engine/chart.rs"]
mod chart;
#[path = "engine/dedup.rs"]
mod dedup;
#[path = "engine/dot_chart.rs"]
mod dot_chart;
#[path = "engine/dot_node.rs"]
mod dot_node;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/parser.rs"]
mod parser;
#[path = "engine/source_path.rs"]
mod source_path;
#[path = "engine/span.rs"]
mod span;


pub use chart::{Cell, CellTable, CompletedCells, Derivation, SuperNode, SuperNodeId, SuperNodeRef};
pub use dot_chart::DotChart;
pub use dot_node::{DotNode, TrieKey};
pub use metrics::{PassMetrics, RunMetrics, RunResult};
pub use parser::Parser;
pub use source_path::{PathStep, SourcePath};
pub use span::ChartSpan;
