//! Subset construction algorithm for converting ε-NFA to DFA.

use indexmap::IndexMap;
use std::collections::{BTreeMap, VecDeque};

use crate::automaton::dfa::Dfa;
use crate::automaton::epsilon_nfa::EpsilonNfa;
use crate::automaton::state::StateId;
use crate::automaton::symbol::SymbolId;
use crate::log::log;

/// Convert an epsilon-NFA to an equivalent DFA over the same alphabet.
///
/// Only subsets reachable from the start closure become states, and they are
/// numbered in breadth-first order with symbols visited in alphabet order, so
/// the result is the same on every run. Empty subsets are never created; a
/// missing transition means rejection.
pub fn subset_construction(nfa: &EpsilonNfa) -> Dfa {
    let mut dfa = Dfa::with_alphabet(nfa.alphabet().clone());

    let Some(start) = nfa.start_state() else {
        return dfa;
    };

    let closures = nfa.epsilon_closures();
    let closure_of = |states: &[StateId]| {
        let mut closure: Vec<StateId> = states
            .iter()
            .flat_map(|&state| closures[state as usize].iter().copied())
            .collect();
        closure.sort_unstable();
        closure.dedup();
        closure
    };
    let is_final = |states: &[StateId]| states.iter().any(|&s| nfa.final_states().contains(s));

    // Each DFA state corresponds to a sorted set of NFA states
    let mut state_mapping: IndexMap<Vec<StateId>, StateId> = IndexMap::new();
    let mut worklist: VecDeque<StateId> = VecDeque::new();

    let initial_set = closures[start as usize].clone();
    let initial_state = dfa.add_state();
    dfa.set_start_state(initial_state);
    if is_final(&initial_set) {
        dfa.add_final_state(initial_state);
    }
    state_mapping.insert(initial_set, initial_state);
    worklist.push_back(initial_state);

    while let Some(current_state) = worklist.pop_front() {
        let mut moves: BTreeMap<SymbolId, Vec<StateId>> = BTreeMap::new();
        if let Some((current_set, _)) = state_mapping.get_index(current_state as usize) {
            for &state in current_set {
                for (symbol, destinations) in nfa.symbol_transitions(state) {
                    moves.entry(symbol).or_default().extend_from_slice(destinations);
                }
            }
        }

        // Symbols without a move are skipped: no empty subset is ever created
        for (symbol, reached) in moves {
            let next_set = closure_of(&reached);

            let next_state = match state_mapping.get(&next_set) {
                Some(&existing) => existing,
                None => {
                    let new_state = dfa.add_state();
                    if is_final(&next_set) {
                        dfa.add_final_state(new_state);
                    }
                    state_mapping.insert(next_set, new_state);
                    worklist.push_back(new_state);
                    new_state
                }
            };

            dfa.add_transition(current_state, symbol, next_state);
        }
    }

    log!(
        "determinized {} nfa states into {} dfa states",
        nfa.num_states(),
        dfa.num_states()
    );

    dfa
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subset_construction_basic() {
        // NFA: 0 -a-> 1, 0 -a-> 2, 1 -b-> 3(final), 2 -b-> 3(final)
        let mut nfa = EpsilonNfa::new();
        nfa.add_symbol_transition(0, "a", 1);
        nfa.add_symbol_transition(0, "a", 2);
        nfa.add_symbol_transition(1, "b", 3);
        nfa.add_symbol_transition(2, "b", 3);
        nfa.set_start_state(0);
        nfa.add_final_state(3);

        let dfa = subset_construction(&nfa);

        assert_eq!(dfa.start_state(), Some(0));
        assert_eq!(dfa.num_states(), 3);
        assert_eq!(dfa.transition(0, 0), Some(1));
        assert_eq!(dfa.transition(1, 1), Some(2));
        assert_eq!(dfa.final_states().to_vec(), vec![2]);
        assert!(dfa.accepts(&["a", "b"]));
        assert!(!dfa.accepts(&["a"]));
    }

    #[test]
    fn test_subset_construction_with_epsilon() {
        // NFA: 0 -ε-> 1 -a-> 2(final), 0 final through 0 -ε-> 3
        let mut nfa = EpsilonNfa::new();
        nfa.add_epsilon_transition(0, 1);
        nfa.add_symbol_transition(1, "a", 2);
        nfa.add_epsilon_transition(0, 3);
        nfa.set_start_state(0);
        nfa.add_final_state(2);
        nfa.add_final_state(3);

        let dfa = subset_construction(&nfa);

        assert_eq!(dfa.num_states(), 2);
        assert_eq!(dfa.final_states().to_vec(), vec![0, 1]);
        assert!(dfa.accepts::<&str>(&[]));
        assert!(dfa.accepts(&["a"]));
        assert!(!dfa.accepts(&["a", "a"]));
    }

    #[test]
    fn test_dead_subsets_are_not_created() {
        let mut nfa = EpsilonNfa::new();
        nfa.add_symbol_transition(0, "a", 1);
        nfa.add_symbol_transition(1, "b", 1);
        nfa.set_start_state(0);
        nfa.add_final_state(1);

        let dfa = subset_construction(&nfa);

        assert_eq!(dfa.num_states(), 2);
        assert_eq!(dfa.transition(0, 1), None);
        assert_eq!(dfa.transition(1, 0), None);
    }

    #[test]
    fn test_empty_nfa() {
        let nfa = EpsilonNfa::new();
        let dfa = subset_construction(&nfa);
        assert!(dfa.start_state().is_none());
        assert_eq!(dfa.num_states(), 0);
    }
}
