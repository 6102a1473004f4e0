//! Symbol interning.
//!
//! Grammar symbols and input words are compared as integer ids everywhere in
//! the engine. The `Vocabulary` hands those ids out:
//!
//! ```text
//!   "[X]"  -> -1      nonterminals count down from -1
//!   "[S]"  -> -2
//!   "le"   ->  1      terminals count up from 1
//!   "chat" ->  2
//! ```
//!
//! The sign convention is what lets the dot chart split a trie node's children
//! into terminals and nonterminals without a lookup (see `is_nonterminal`).
//!
//! A `Vocabulary` is a cheap, cloneable handle. Grammar loading, lattice
//! construction and regex trie matching all share one instance, so interning
//! goes through an internal `RwLock`.

use crate::SymbolId;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Return true if `id` denotes a nonterminal.
pub fn is_nonterminal(id: SymbolId) -> bool {
    id < 0
}

/// Return true if `word` is written as a nonterminal label (`[X]` or `[X,1]`).
pub fn is_nonterminal_label(word: &str) -> bool {
    word.len() > 2 && word.starts_with('[') && word.ends_with(']')
}

/// Strip a rule-local index from a nonterminal label: `[X,1]` becomes `[X]`.
///
/// Labels without an index are returned unchanged.
pub fn strip_index(label: &str) -> Cow<'_, str> {
    match regex!(r"^(\[[^\],]+),\d+\]$").captures(label) {
        Some(caps) => Cow::Owned(format!("{}]", &caps[1])),
        None => Cow::Borrowed(label),
    }
}

#[derive(Debug, Default)]
struct Inner {
    ids: HashMap<String, SymbolId>,
    /// Input words spelled like nonterminals, interned as terminals.
    bracketed_words: HashMap<String, SymbolId>,
    terminals: Vec<String>,
    nonterminals: Vec<String>,
}

/// Shared symbol table. Clones refer to the same table.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    inner: Arc<RwLock<Inner>>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `word` and return its id.
    ///
    /// Nonterminal labels are normalized with [`strip_index`] first, so `[X,1]`
    /// and `[X]` share an id.
    pub fn id(&self, word: &str) -> SymbolId {
        let word = if is_nonterminal_label(word) { strip_index(word) } else { Cow::Borrowed(word) };
        let word = word.as_ref();
        if let Some(id) = self.get(word) {
            return id;
        }

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        // Another writer may have raced us between the read and write locks.
        if let Some(&id) = inner.ids.get(word) {
            return id;
        }
        let id = if is_nonterminal_label(word) {
            inner.nonterminals.push(word.to_string());
            -(inner.nonterminals.len() as SymbolId)
        } else {
            inner.terminals.push(word.to_string());
            inner.terminals.len() as SymbolId
        };
        inner.ids.insert(word.to_string(), id);
        id
    }

    /// Intern an input word. Always returns a terminal id, even for words
    /// spelled like a nonterminal (`[X]` in the input is text, not a symbol).
    pub fn terminal_id(&self, word: &str) -> SymbolId {
        if !is_nonterminal_label(word) {
            return self.id(word);
        }
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(&id) = inner.bracketed_words.get(word) {
            return id;
        }
        inner.terminals.push(word.to_string());
        let id = inner.terminals.len() as SymbolId;
        inner.bracketed_words.insert(word.to_string(), id);
        id
    }

    /// Look up `word` without interning it.
    pub fn get(&self, word: &str) -> Option<SymbolId> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.ids.get(word).copied()
    }

    /// Return the string for `id`, if it was ever interned.
    pub fn word(&self, id: SymbolId) -> Option<String> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let (table, index) = if is_nonterminal(id) {
            (&inner.nonterminals, id.unsigned_abs() as usize)
        } else {
            (&inner.terminals, id as usize)
        };
        index.checked_sub(1).and_then(|i| table.get(i)).cloned()
    }

    /// Like [`Vocabulary::word`], but falls back to `#<id>` for unknown ids.
    pub fn display(&self, id: SymbolId) -> String {
        self.word(id).unwrap_or_else(|| format!("#{id}"))
    }

    /// Number of interned symbols (terminals and nonterminals).
    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.ids.len() + inner.bracketed_words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonterminals_are_negative_and_terminals_positive() {
        let vocab = Vocabulary::new();
        let x = vocab.id("[X]");
        let s = vocab.id("[S]");
        let a = vocab.id("a");

        assert_eq!(x, -1);
        assert_eq!(s, -2);
        assert_eq!(a, 1);
        assert!(is_nonterminal(x));
        assert!(!is_nonterminal(a));
    }

    #[test]
    fn indexed_labels_share_an_id() {
        let vocab = Vocabulary::new();
        assert_eq!(vocab.id("[X,1]"), vocab.id("[X]"));
        assert_eq!(vocab.id("[X,2]"), vocab.id("[X]"));
        assert_eq!(vocab.word(vocab.id("[X,1]")).as_deref(), Some("[X]"));
    }

    #[test]
    fn clones_share_the_table() {
        let vocab = Vocabulary::new();
        let other = vocab.clone();
        let id = other.id("chat");
        assert_eq!(vocab.get("chat"), Some(id));
        assert_eq!(vocab.len(), 1);
    }

    #[test]
    fn bracketed_input_words_stay_terminals() {
        let vocab = Vocabulary::new();
        let x = vocab.id("[X]");
        let word = vocab.terminal_id("[X]");

        assert!(!is_nonterminal(word));
        assert_ne!(word, x);
        assert_eq!(vocab.terminal_id("[X]"), word);
        assert_eq!(vocab.terminal_id("[X,1]"), vocab.terminal_id("[X,1]"));
        assert_ne!(vocab.terminal_id("[X,1]"), word);
        assert_eq!(vocab.word(word).as_deref(), Some("[X]"));
        assert_eq!(vocab.terminal_id("cat"), vocab.id("cat"));
    }

    #[test]
    fn unknown_ids_display_with_hash() {
        let vocab = Vocabulary::new();
        assert_eq!(vocab.word(0), None);
        assert_eq!(vocab.word(7), None);
        assert_eq!(vocab.display(-3), "#-3");
    }

    #[test]
    fn strip_index_cases() {
        let cases = [("[X,1]", "[X]"), ("[NP,12]", "[NP]"), ("[X]", "[X]"), ("word", "word"), ("[A,B]", "[A,B]")];
        for (input, expected) in cases {
            assert_eq!(strip_index(input), expected, "input {input}");
        }
    }
}
