//! Input lattices.
//!
//! A lattice is a weighted DAG over numbered nodes `0..node_count`. Every arc
//! leaves its `tail` and enters a strictly later `head`, so node numbering is a
//! topological order and an arc covers `head - tail` positions:
//!
//! ```text
//!         a/0.0        b/0.0
//!   (0) ────────> (1) ────────> (2)
//!     └───────────────────────────┘
//!              ab/0.5  (span_len 2)
//! ```
//!
//! A plain sentence of `n` words is the single-path lattice with `n + 1` nodes.
//!
//! Shortest path lengths (in arcs) between every pair of nodes are computed once
//! at construction; grammars use them to decide span applicability.

use crate::SymbolId;
use crate::error::LatticeError;
use crate::vocab::Vocabulary;

/// A weighted, labelled lattice edge.
#[derive(Debug, Clone, PartialEq)]
pub struct LatticeArc {
    tail: usize,
    head: usize,
    cost: f32,
    label: SymbolId,
}

impl LatticeArc {
    pub fn new(tail: usize, head: usize, cost: f32, label: SymbolId) -> Self {
        Self { tail, head, cost, label }
    }

    /// Node the arc leaves.
    pub fn tail(&self) -> usize {
        self.tail
    }

    /// Node the arc enters.
    pub fn head(&self) -> usize {
        self.head
    }

    pub fn cost(&self) -> f32 {
        self.cost
    }

    pub fn label(&self) -> SymbolId {
        self.label
    }

    /// Number of input positions the arc covers (always at least 1).
    pub fn span_len(&self) -> usize {
        self.head - self.tail
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    id: usize,
    outgoing: Vec<LatticeArc>,
}

impl Node {
    pub fn id(&self) -> usize {
        self.id
    }

    /// Arcs leaving this node, in insertion order.
    pub fn outgoing(&self) -> &[LatticeArc] {
        &self.outgoing
    }
}

#[derive(Debug, Clone)]
pub struct Lattice {
    nodes: Vec<Node>,
    /// Row-major `node_count * node_count` table of shortest path lengths.
    distances: Vec<Option<usize>>,
}

impl Lattice {
    /// Build the single-path lattice for a sentence; every arc costs nothing.
    pub fn from_sentence(words: &[SymbolId]) -> Self {
        let nodes = (0..=words.len())
            .map(|id| Node {
                id,
                outgoing: words.get(id).map(|&w| vec![LatticeArc::new(id, id + 1, 0.0, w)]).unwrap_or_default(),
            })
            .collect();
        Self::with_distances(nodes)
    }

    /// Build a lattice from explicit arcs.
    ///
    /// Arcs are attached to their tail node in the order given.
    pub fn from_arcs(node_count: usize, arcs: impl IntoIterator<Item = LatticeArc>) -> Result<Self, LatticeError> {
        if node_count == 0 {
            return Err(LatticeError::Empty);
        }
        let mut nodes: Vec<Node> = (0..node_count).map(|id| Node { id, outgoing: Vec::new() }).collect();
        for arc in arcs {
            if arc.head <= arc.tail {
                return Err(LatticeError::BackwardArc { tail: arc.tail, head: arc.head });
            }
            if arc.head >= node_count {
                return Err(LatticeError::ArcOutOfRange { tail: arc.tail, head: arc.head, nodes: node_count });
            }
            nodes[arc.tail].outgoing.push(arc);
        }
        Ok(Self::with_distances(nodes))
    }

    /// Parse a lattice in Python Lattice Format.
    ///
    /// ```text
    /// ((('a',0.0,1),),(('b',0.0,1),('bc',0.5,2),),(('c',0.0,1),),)
    ///   └─ node 0 ──┘  └──────── node 1 ───────┘  └─ node 2 ──┘
    /// ```
    ///
    /// Each node lists its outgoing arcs as `(label, cost, offset)`, where the
    /// head is `node + offset`. The final node is implicit. Labels are interned
    /// into `vocab` as terminals.
    pub fn from_plf(text: &str, vocab: &Vocabulary) -> Result<Self, LatticeError> {
        let outer = split_groups(text, 0)?;
        let [(offset, body)] = outer.as_slice() else {
            return Err(LatticeError::Plf { offset: 0, message: format!("expected one outer tuple, found {}", outer.len()) });
        };

        let node_groups = split_groups(body, *offset)?;
        let mut arcs = Vec::new();
        for (tail, (node_offset, node_body)) in node_groups.iter().enumerate() {
            for (arc_offset, arc_body) in split_groups(node_body, *node_offset)? {
                let caps = regex!(
                    r#"^\s*(?:'((?:[^'\\]|\\.)*)'|"((?:[^"\\]|\\.)*)")\s*,\s*([^,\s]+)\s*,\s*(\d+)\s*,?\s*$"#
                )
                .captures(arc_body)
                .ok_or_else(|| LatticeError::Plf {
                    offset: arc_offset,
                    message: format!("expected ('label', cost, offset), found ({arc_body})"),
                })?;

                let label = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
                let cost: f32 = caps[3].parse().map_err(|_| LatticeError::Plf {
                    offset: arc_offset,
                    message: format!("invalid arc cost `{}`", &caps[3]),
                })?;
                let span: usize = caps[4].parse().map_err(|_| LatticeError::Plf {
                    offset: arc_offset,
                    message: format!("invalid arc offset `{}`", &caps[4]),
                })?;

                let head = tail.checked_add(span).ok_or_else(|| LatticeError::Plf {
                    offset: arc_offset,
                    message: "arc offset out of range".to_string(),
                })?;
                arcs.push(LatticeArc::new(tail, head, cost, vocab.terminal_id(&unescape(label))));
            }
        }

        Self::from_arcs(node_groups.len() + 1, arcs)
    }

    fn with_distances(nodes: Vec<Node>) -> Self {
        let n = nodes.len();
        let mut distances = vec![None; n * n];
        for start in 0..n {
            distances[start * n + start] = Some(0);
            // Node ids are a topological order, so one forward sweep settles every
            // shortest path out of `start`.
            for node in &nodes[start..] {
                let Some(d) = distances[start * n + node.id] else { continue };
                for arc in &node.outgoing {
                    let slot = &mut distances[start * n + arc.head];
                    if slot.is_none_or(|current| d + 1 < current) {
                        *slot = Some(d + 1);
                    }
                }
            }
        }
        Lattice { nodes, distances }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of positions a full path covers (`node_count - 1`).
    pub fn source_len(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    pub fn node(&self, pos: usize) -> Option<&Node> {
        self.nodes.get(pos)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Shortest path length in arcs from `i` to `j`, or `None` if `j` cannot be
    /// reached from `i`.
    pub fn distance(&self, i: usize, j: usize) -> Option<usize> {
        let n = self.nodes.len();
        if i >= n || j >= n {
            return None;
        }
        self.distances[i * n + j]
    }

    /// True if every node has at most one outgoing arc of length 1.
    pub fn is_linear(&self) -> bool {
        self.nodes.iter().all(|node| match node.outgoing.as_slice() {
            [] => true,
            [arc] => arc.span_len() == 1,
            _ => false,
        })
    }
}

/// Return the inner text of each top-level parenthesized group in `text`,
/// paired with its byte offset (relative to the start of the whole document).
///
/// Quoted labels may contain parentheses and backslash escapes.
fn split_groups(text: &str, base: usize) -> Result<Vec<(usize, &str)>, LatticeError> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' if depth > 0 => quote = Some(c),
            '(' => {
                if depth == 0 {
                    start = i + 1;
                }
                depth += 1;
            }
            ')' => {
                if depth == 0 {
                    return Err(LatticeError::Plf { offset: base + i, message: "unbalanced `)`".to_string() });
                }
                depth -= 1;
                if depth == 0 {
                    groups.push((base + start, &text[start..i]));
                }
            }
            _ if depth == 0 && !(c.is_whitespace() || c == ',') => {
                return Err(LatticeError::Plf { offset: base + i, message: format!("unexpected `{c}`") });
            }
            _ => {}
        }
    }

    if depth > 0 || quote.is_some() {
        return Err(LatticeError::Plf { offset: base + text.len(), message: "unterminated tuple".to_string() });
    }
    Ok(groups)
}

fn unescape(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut chars = label.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentence_is_a_single_path() {
        let lattice = Lattice::from_sentence(&[1, 2, 3]);

        assert_eq!(lattice.node_count(), 4);
        assert_eq!(lattice.source_len(), 3);
        assert!(lattice.is_linear());
        assert_eq!(lattice.node(3).map(|n| n.outgoing().len()), Some(0));

        let arc = &lattice.node(1).unwrap().outgoing()[0];
        assert_eq!((arc.tail(), arc.head(), arc.label(), arc.span_len()), (1, 2, 2, 1));
        assert_eq!(arc.cost(), 0.0);
    }

    #[test]
    fn distances_follow_shortest_paths() {
        let arcs = vec![
            LatticeArc::new(0, 1, 0.0, 1),
            LatticeArc::new(1, 2, 0.0, 2),
            LatticeArc::new(2, 3, 0.0, 3),
            LatticeArc::new(0, 2, 1.0, 4),
        ];
        let lattice = Lattice::from_arcs(4, arcs).unwrap();

        let cases = [((0, 0), Some(0)), ((0, 1), Some(1)), ((0, 2), Some(1)), ((0, 3), Some(2)), ((1, 3), Some(2))];
        for ((i, j), expected) in cases {
            assert_eq!(lattice.distance(i, j), expected, "distance({i}, {j})");
        }
        assert_eq!(lattice.distance(2, 1), None);
        assert_eq!(lattice.distance(0, 9), None);
        assert!(!lattice.is_linear());
    }

    #[test]
    fn from_arcs_rejects_bad_arcs() {
        let backward = Lattice::from_arcs(3, vec![LatticeArc::new(1, 1, 0.0, 1)]);
        assert!(matches!(backward, Err(LatticeError::BackwardArc { tail: 1, head: 1 })));

        let outside = Lattice::from_arcs(3, vec![LatticeArc::new(1, 3, 0.0, 1)]);
        assert!(matches!(outside, Err(LatticeError::ArcOutOfRange { nodes: 3, .. })));

        assert!(matches!(Lattice::from_arcs(0, Vec::new()), Err(LatticeError::Empty)));
    }

    #[test]
    fn plf_builds_multi_span_arcs() {
        let vocab = Vocabulary::new();
        let lattice =
            Lattice::from_plf("((('a',0.0,1),),(('b',0.0,1),('b c',0.5,2),),(('c',0.25,1),),)", &vocab).unwrap();

        assert_eq!(lattice.node_count(), 4);
        let node1 = lattice.node(1).unwrap().outgoing();
        assert_eq!(node1.len(), 2);
        assert_eq!(node1[1].head(), 3);
        assert_eq!(node1[1].span_len(), 2);
        assert_eq!(node1[1].cost(), 0.5);
        assert_eq!(node1[1].label(), vocab.get("b c").unwrap());
        assert_eq!(lattice.node(2).unwrap().outgoing()[0].cost(), 0.25);
    }

    #[test]
    fn plf_handles_quotes_and_escapes() {
        let vocab = Vocabulary::new();
        let lattice = Lattice::from_plf(r#"((('(',0,1),),(("it\'s",0,1),),)"#, &vocab).unwrap();

        assert_eq!(lattice.node_count(), 3);
        assert!(vocab.get("(").is_some());
        assert!(vocab.get("it's").is_some());
    }

    #[test]
    fn plf_labels_are_always_terminals() {
        let vocab = Vocabulary::new();
        let lattice = Lattice::from_plf("((('[X]',0,1),),)", &vocab).unwrap();
        let label = lattice.node(0).unwrap().outgoing()[0].label();
        assert!(!crate::vocab::is_nonterminal(label));
        assert_eq!(vocab.word(label).as_deref(), Some("[X]"));
    }

    #[test]
    fn plf_reports_malformed_input() {
        let vocab = Vocabulary::new();
        let cases = ["((('a',0.0,1),)", "((('a',zero,1),),)", "((('a',0.0),),)", "x((('a',0.0,1),),)", "()()"];
        for input in cases {
            assert!(matches!(Lattice::from_plf(input, &vocab), Err(LatticeError::Plf { .. })), "input {input}");
        }

        let huge = format!("((('a',0,1),),(('b',0,{}),),)", usize::MAX);
        let err = Lattice::from_plf(&huge, &vocab).err();
        assert!(matches!(err, Some(LatticeError::Plf { ref message, .. }) if message == "arc offset out of range"));

        // Offsets of zero produce a backward arc.
        assert!(matches!(Lattice::from_plf("((('a',0.0,0),),)", &vocab), Err(LatticeError::BackwardArc { .. })));
    }
}
