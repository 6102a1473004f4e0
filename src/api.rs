use crate::SymbolId;
use crate::engine::{self, RunResult, SuperNode};
use crate::error::Error;
use crate::grammar::{Grammar, GrammarOptions, MemoryGrammar, Rule};
use crate::lattice::Lattice;
use crate::vocab::Vocabulary;
use std::time::Duration;

/// Options that affect a parse.
#[derive(Debug, Clone)]
pub struct Options {
    /// Label of the symbol that must cover the whole input, e.g. `"[S]"`.
    pub goal: String,
}

impl Default for Options {
    fn default() -> Self {
        Options { goal: "[S]".to_string() }
    }
}

/// A completed constituent: every derivation of one left-hand side over one
/// span.
///
/// `start`/`end` are lattice node positions.
#[derive(Debug, Clone)]
pub struct Constituent {
    /// Left-hand side label, e.g. `"[NP]"`.
    pub lhs: String,
    pub start: usize,
    pub end: usize,
    /// Applied rules, as `source ||| target`, one per derivation.
    pub rules: Vec<String>,
    /// Cheapest lattice cost among the derivations' own source paths.
    pub best_source_cost: f32,
}

/// Result from [`parse_with`] and [`parse_text`].
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Whether the goal symbol covers the whole input.
    pub goal_reached: bool,
    /// Every constituent, narrow spans first.
    pub constituents: Vec<Constituent>,
    /// Dot items created, seeds included, over all grammars.
    pub dot_items: usize,
    /// Total elapsed time spent parsing.
    pub elapsed: Duration,
}

/// A compact per-width trace.
#[derive(Debug, Clone)]
pub struct WidthPass {
    pub width: usize,
    pub duration: Duration,
    pub dot_items: usize,
    pub super_nodes: usize,
    pub derivations: usize,
}

/// Item counts of one non-empty dot cell.
#[derive(Debug, Clone)]
pub struct DotCellSummary {
    /// Index of the grammar, in the order given to the parse.
    pub grammar: usize,
    pub start: usize,
    pub end: usize,
    pub items: usize,
    /// Items whose trie position completes at least one rule.
    pub complete: usize,
}

/// Additional details returned by [`parse_verbose_with`].
///
/// This is intentionally compact: it's meant for debugging and performance
/// inspection without dumping every DotNode.
#[derive(Debug, Clone)]
pub struct ParseDetails {
    /// Total elapsed time.
    pub total: Duration,
    /// Dot items placed by seeding.
    pub seeded: usize,
    pub passes: Vec<WidthPass>,
    pub dot_cells: Vec<DotCellSummary>,
}

/// Result from [`parse_verbose_with`].
#[derive(Debug, Clone)]
pub struct ParseResultVerbose {
    pub result: ParseResult,
    pub details: ParseDetails,
}

/// Parse a whitespace-separated `sentence` with rules given as text.
///
/// Symbols are interned into a fresh vocabulary and the grammar uses
/// [`GrammarOptions::default`].
///
/// # Example
/// ```
/// use dotchart::{Options, parse_text};
///
/// let rules = "[X] ||| a ||| a\n[S] ||| [X] b ||| [X,1] b\n";
/// let out = parse_text("a b", rules, &Options::default()).unwrap();
/// assert!(out.goal_reached);
/// ```
pub fn parse_text(sentence: &str, grammar_text: &str, options: &Options) -> Result<ParseResult, Error> {
    let vocab = Vocabulary::new();
    let grammar = MemoryGrammar::from_text(grammar_text, &vocab, GrammarOptions::default())?;
    let words: Vec<SymbolId> = sentence.split_whitespace().map(|w| vocab.terminal_id(w)).collect();
    let lattice = Lattice::from_sentence(&words);
    parse_with(&lattice, &[&grammar], &vocab, options)
}

/// Parse `input` against `grammars`, which must share `vocab`.
pub fn parse_with(
    input: &Lattice,
    grammars: &[&dyn Grammar],
    vocab: &Vocabulary,
    options: &Options,
) -> Result<ParseResult, Error> {
    let run = run(input, grammars, vocab, options)?;
    Ok(summarize(&run, vocab))
}

/// Parse like [`parse_with`] and return extra (compact) debug details.
pub fn parse_verbose_with(
    input: &Lattice,
    grammars: &[&dyn Grammar],
    vocab: &Vocabulary,
    options: &Options,
) -> Result<ParseResultVerbose, Error> {
    let run = run(input, grammars, vocab, options)?;
    let result = summarize(&run, vocab);

    let passes = run
        .metrics
        .passes
        .iter()
        .map(|pass| WidthPass {
            width: pass.width,
            duration: pass.duration,
            dot_items: pass.dot_items,
            super_nodes: pass.super_nodes,
            derivations: pass.derivations,
        })
        .collect();

    let mut dot_cells = Vec::new();
    for (grammar, chart) in run.dot_charts.iter().enumerate() {
        let n = chart.sentence_len();
        for start in 0..n {
            for end in start..=n {
                let items = chart.dot_cell(start, end);
                if items.is_empty() {
                    continue;
                }
                let complete = items.iter().filter(|item| item.has_rules()).count();
                dot_cells.push(DotCellSummary { grammar, start, end, items: items.len(), complete });
            }
        }
    }

    let details = ParseDetails { total: run.metrics.total, seeded: run.metrics.seeded, passes, dot_cells };
    Ok(ParseResultVerbose { result, details })
}

fn run<'a>(
    input: &'a Lattice,
    grammars: &[&'a dyn Grammar],
    vocab: &Vocabulary,
    options: &Options,
) -> Result<RunResult<'a>, Error> {
    let goal = vocab.id(&options.goal);
    let parser = engine::Parser::new(input, grammars, goal)?;
    Ok(parser.run())
}

fn summarize(run: &RunResult<'_>, vocab: &Vocabulary) -> ParseResult {
    let constituents = run.cells.super_nodes().iter().map(|node| constituent(node, vocab)).collect();
    let dot_items = run.dot_charts.iter().map(|chart| chart.items_added()).sum();
    ParseResult { goal_reached: run.goal.is_some(), constituents, dot_items, elapsed: run.metrics.total }
}

fn constituent(node: &SuperNode, vocab: &Vocabulary) -> Constituent {
    let best_source_cost = node.derivations.iter().map(|d| d.source_cost).fold(f32::INFINITY, f32::min);
    Constituent {
        lhs: vocab.display(node.lhs),
        start: node.begin,
        end: node.end,
        rules: node.derivations.iter().map(|d| format_rule(&d.rule, vocab)).collect(),
        best_source_cost,
    }
}

fn format_rule(rule: &Rule, vocab: &Vocabulary) -> String {
    let source: Vec<String> = rule.source().iter().map(|&s| vocab.display(s)).collect();
    format!("{} ||| {}", source.join(" "), rule.target())
}
