//! Deduplication keys for chart derivations.
//!
//! Lattice inputs can reach the same trie position over the same span along
//! different paths, and the dot chart keeps every one of those items (their
//! source costs differ). Completing them would record the same derivation
//! several times, so the main chart keys derivations by:
//!
//! - the SuperNode they build,
//! - the identity of the applied rule (the `Arc<Rule>` address, not its text),
//! - the antecedent SuperNodes, in order.
//!
//! Rule identity is enough because every rule lives in exactly one grammar
//! trie for the lifetime of a decode.

use super::chart::{Derivation, SuperNodeId};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct DerivationKey {
    node: SuperNodeId,
    rule: usize,
    antecedents: Vec<SuperNodeId>,
}

impl DerivationKey {
    pub(crate) fn new(node: SuperNodeId, derivation: &Derivation) -> Self {
        DerivationKey {
            node,
            rule: Arc::as_ptr(&derivation.rule) as usize,
            antecedents: derivation.antecedents.clone(),
        }
    }
}
