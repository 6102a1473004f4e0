//! Rule text format.
//!
//! One rule per line, fields separated by `|||`:
//!
//! ```text
//! [X] ||| le [X,1] ||| the [X,1] ||| 0.3 1.2
//! └LHS┘   └─source─┘   └─target─┘   └features (ignored)
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. Nonterminals on either
//! side are written `[X]` or with a rule-local index `[X,1]`.

use super::Rule;
use crate::error::GrammarError;
use crate::vocab::{Vocabulary, is_nonterminal_label};

/// Parse every rule in `text`, interning symbols into `vocab`.
pub fn parse_rules(text: &str, vocab: &Vocabulary) -> Result<Vec<Rule>, GrammarError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(idx, line)| parse_rule(line, idx + 1, vocab))
        .collect()
}

/// Parse a single rule line. `line_no` is only used in errors.
pub fn parse_rule(line: &str, line_no: usize, vocab: &Vocabulary) -> Result<Rule, GrammarError> {
    let fields: Vec<&str> = line.split("|||").map(str::trim).collect();
    if !(3..=4).contains(&fields.len()) {
        return Err(GrammarError::FieldCount { line: line_no, fields: fields.len() });
    }

    let lhs = fields[0];
    if !is_nonterminal_label(lhs) || lhs.contains(char::is_whitespace) {
        return Err(GrammarError::LhsNotNonterminal { line: line_no, symbol: lhs.to_string() });
    }

    let source: Vec<_> = fields[1].split_whitespace().map(|word| vocab.id(word)).collect();
    if source.is_empty() {
        return Err(GrammarError::EmptySource { line: line_no });
    }

    let target = fields[2].split_whitespace().collect::<Vec<_>>().join(" ");
    Ok(Rule::new(vocab.id(lhs), source, target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hiero_style_rules() {
        let vocab = Vocabulary::new();
        let rules = parse_rules(
            "# comment\n\n[X] ||| le [X,1]   chat ||| the   [X,1] cat ||| 0.5 1\n[S] ||| [X,1] ||| [X,1]\n",
            &vocab,
        )
        .unwrap();

        assert_eq!(rules.len(), 2);
        let x = vocab.get("[X]").unwrap();
        assert_eq!(rules[0].lhs(), x);
        assert_eq!(rules[0].source(), &[vocab.get("le").unwrap(), x, vocab.get("chat").unwrap()]);
        assert_eq!(rules[0].target(), "the [X,1] cat");
        assert_eq!(rules[0].arity(), 1);
        assert_eq!(rules[1].lhs(), vocab.get("[S]").unwrap());
    }

    #[test]
    fn reports_line_numbers() {
        let vocab = Vocabulary::new();
        let err = parse_rules("[X] ||| a ||| a\n\nX ||| b ||| b\n", &vocab).unwrap_err();
        assert!(matches!(err, GrammarError::LhsNotNonterminal { line: 3, .. }), "{err}");
    }

    #[test]
    fn rejects_malformed_lines() {
        let vocab = Vocabulary::new();
        let cases = [
            ("[X] ||| a", "field count"),
            ("[X] ||| a ||| b ||| 1 ||| extra", "field count"),
            ("[X] |||   ||| b", "empty source"),
            ("[X Y] ||| a ||| b", "lhs"),
        ];
        for (line, what) in cases {
            let err = parse_rule(line, 1, &vocab).unwrap_err();
            let ok = match what {
                "field count" => matches!(err, GrammarError::FieldCount { .. }),
                "empty source" => matches!(err, GrammarError::EmptySource { .. }),
                _ => matches!(err, GrammarError::LhsNotNonterminal { .. }),
            };
            assert!(ok, "{line}: {err}");
        }
    }
}
