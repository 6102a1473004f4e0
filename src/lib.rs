//! On-the-fly binarized chart parsing over sentences and lattices.
//!
//! Rules of a synchronous grammar are matched against the input without
//! binarizing them first. A dot chart keeps partial rule applications per
//! span and advances them one source symbol at a time, over terminal lattice
//! arcs or over constituents already completed in the main chart.
//!
//! ```text
//! rule text ─> MemoryGrammar (trie) ─┐
//!                                    ├─> engine::Parser ─> CellTable (SuperNodes)
//! sentence / PLF ─> Lattice ─────────┘        │
//!                                             └─> DotChart per grammar
//! ```
//!
//! Most callers go through [`parse_text`] or [`parse_with`]; the engine types
//! are public for drivers that need the charts themselves.

pub type SymbolId = i32;

#[macro_use]
mod macros;
mod api;
pub mod engine;
pub mod error;
pub mod grammar;
pub mod lattice;
pub mod vocab;

pub use api::{
    Constituent, DotCellSummary, Options, ParseDetails, ParseResult, ParseResultVerbose, WidthPass, parse_text,
    parse_verbose_with, parse_with,
};
pub use error::{DotChartError, Error, GrammarError, LatticeError};
pub use grammar::{Grammar, GrammarOptions, MemoryGrammar};
pub use lattice::Lattice;
pub use vocab::Vocabulary;
