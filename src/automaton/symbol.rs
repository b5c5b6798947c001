//! Transition labels and the per-automaton alphabet table.

use indexmap::IndexSet;

/// A symbol identifier, an index into the owning automaton's [`Alphabet`].
/// The special value `EPSILON` represents an epsilon (empty) transition.
pub type SymbolId = u32;

/// Special symbol ID representing epsilon (empty) transitions.
pub const EPSILON: SymbolId = u32::MAX;

pub const EPSILON_LABEL: &str = "ε";

/// Check if a symbol is an epsilon transition.
#[inline]
pub fn is_epsilon(symbol: SymbolId) -> bool {
    symbol == EPSILON
}

/// Interns symbol names to dense ids in order of first appearance.
#[derive(Clone, Debug, Default)]
pub struct Alphabet {
    names: IndexSet<String>,
}

impl Alphabet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(idx) = self.names.get_index_of(name) {
            return idx as SymbolId;
        }
        self.names.insert_full(name.to_string()).0 as SymbolId
    }

    pub fn id(&self, name: &str) -> Option<SymbolId> {
        self.names.get_index_of(name).map(|idx| idx as SymbolId)
    }

    /// The textual label of a symbol; epsilon renders as `ε`.
    pub fn label(&self, symbol: SymbolId) -> Option<&str> {
        if is_epsilon(symbol) {
            return Some(EPSILON_LABEL);
        }
        self.names.get_index(symbol as usize).map(String::as_str)
    }

    /// All symbol ids in interning order.
    pub fn ids(&self) -> impl Iterator<Item = SymbolId> {
        0..self.names.len() as SymbolId
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
