//! Finite automata over named symbols.

pub mod dfa;
pub mod epsilon_nfa;
pub mod state;
pub mod subset_construction;
pub mod symbol;

pub use dfa::Dfa;
pub use epsilon_nfa::EpsilonNfa;
pub use state::{StateId, StateSet};
pub use subset_construction::subset_construction;
pub use symbol::{Alphabet, SymbolId, EPSILON};
