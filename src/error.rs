//! Error types.
//!
//! Only configuration and input-format problems are errors. A sparse chart
//! produces plenty of empty cells and failed symbol matches during a decode;
//! those are ordinary outcomes and never reach these types.

/// Errors raised while building or seeding a dot chart.
#[derive(Debug, thiserror::Error)]
pub enum DotChartError {
    /// The grammar claims rules for a span but exposes no trie root.
    #[error("malformed grammar: no trie root while seeding position {position}")]
    MissingTrieRoot { position: usize },
}

/// Errors raised while loading grammar rules from text.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("line {line}: expected `[LHS] ||| source ||| target`, found {fields} field(s)")]
    FieldCount { line: usize, fields: usize },

    #[error("line {line}: left-hand side `{symbol}` is not a nonterminal")]
    LhsNotNonterminal { line: usize, symbol: String },

    #[error("line {line}: rule has an empty source side")]
    EmptySource { line: usize },
}

/// Errors raised while building a lattice.
#[derive(Debug, thiserror::Error)]
pub enum LatticeError {
    #[error("arc {tail}->{head} must move forward")]
    BackwardArc { tail: usize, head: usize },

    #[error("arc {tail}->{head} leaves a lattice of {nodes} node(s)")]
    ArcOutOfRange { tail: usize, head: usize, nodes: usize },

    #[error("lattice has no nodes")]
    Empty,

    #[error("malformed PLF near byte {offset}: {message}")]
    Plf { offset: usize, message: String },
}

/// Crate-level error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    DotChart(#[from] DotChartError),

    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Lattice(#[from] LatticeError),
}
