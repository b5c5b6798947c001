//! Epsilon Non-deterministic Finite Automaton (ε-NFA) implementation.

use std::collections::BTreeMap;

use crate::automaton::state::{StateId, StateSet};
use crate::automaton::symbol::{is_epsilon, Alphabet, SymbolId, EPSILON};

/// An Epsilon Non-deterministic Finite Automaton.
#[derive(Debug, Clone, Default)]
pub struct EpsilonNfa {
    /// Number of states (states are numbered 0..num_states)
    num_states: StateId,
    start_state: Option<StateId>,
    final_states: StateSet,
    /// Transitions: (source, symbol) -> sorted destination states
    /// For epsilon transitions, symbol == EPSILON
    transitions: BTreeMap<(StateId, SymbolId), Vec<StateId>>,
    /// All symbols used (excluding epsilon)
    alphabet: Alphabet,
}

impl EpsilonNfa {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new state and return its ID.
    pub fn add_state(&mut self) -> StateId {
        let id = self.num_states;
        self.num_states += 1;
        id
    }

    fn ensure_state(&mut self, state: StateId) {
        if state >= self.num_states {
            self.num_states = state + 1;
        }
    }

    /// Add a transition from source to destination on the given symbol id.
    pub fn add_transition(&mut self, source: StateId, symbol: SymbolId, destination: StateId) {
        self.ensure_state(source);
        self.ensure_state(destination);

        let destinations = self.transitions.entry((source, symbol)).or_default();
        if let Err(position) = destinations.binary_search(&destination) {
            destinations.insert(position, destination);
        }
    }

    /// Add a transition labelled with a symbol name, interning it.
    pub fn add_symbol_transition(&mut self, source: StateId, name: &str, destination: StateId) {
        let symbol = self.alphabet.intern(name);
        self.add_transition(source, symbol, destination);
    }

    pub fn add_epsilon_transition(&mut self, source: StateId, destination: StateId) {
        self.add_transition(source, EPSILON, destination);
    }

    pub fn set_start_state(&mut self, state: StateId) {
        self.ensure_state(state);
        self.start_state = Some(state);
    }

    pub fn add_final_state(&mut self, state: StateId) {
        self.ensure_state(state);
        self.final_states.insert(state);
    }

    pub fn num_states(&self) -> StateId {
        self.num_states
    }

    pub fn start_state(&self) -> Option<StateId> {
        self.start_state
    }

    pub fn final_states(&self) -> &StateSet {
        &self.final_states
    }

    /// The alphabet (all symbols except epsilon).
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    fn epsilon_successors(&self, state: StateId) -> &[StateId] {
        self.transitions
            .get(&(state, EPSILON))
            .map_or(&[][..], Vec::as_slice)
    }

    /// Epsilon closure of every state as a sorted list, indexed by state id.
    pub fn epsilon_closures(&self) -> Vec<Vec<StateId>> {
        // visited_from[s] is the last state whose closure reached s
        let mut visited_from: Vec<Option<StateId>> = vec![None; self.num_states as usize];

        (0..self.num_states)
            .map(|origin| {
                let mut closure = vec![];
                let mut stack = vec![origin];

                while let Some(s) = stack.pop() {
                    if visited_from[s as usize] == Some(origin) {
                        continue;
                    }
                    visited_from[s as usize] = Some(origin);
                    closure.push(s);
                    stack.extend_from_slice(self.epsilon_successors(s));
                }

                closure.sort_unstable();
                closure
            })
            .collect()
    }

    /// Get the epsilon closure of a set of states.
    pub fn epsilon_closure(&self, states: &StateSet) -> StateSet {
        let mut closure = StateSet::with_capacity(self.num_states as usize);
        let mut stack = states.to_vec();

        while let Some(s) = stack.pop() {
            if closure.insert(s) {
                stack.extend_from_slice(self.epsilon_successors(s));
            }
        }
        closure
    }

    /// Non-epsilon transitions leaving `state`, in symbol order.
    pub fn symbol_transitions(
        &self,
        state: StateId,
    ) -> impl Iterator<Item = (SymbolId, &[StateId])> + '_ {
        self.transitions
            .range((state, 0)..(state, EPSILON))
            .map(|(&(_, symbol), destinations)| (symbol, destinations.as_slice()))
    }

    /// States reached from `states` by exactly one `symbol` transition, without
    /// taking epsilon moves afterwards.
    pub fn move_on_symbol(&self, states: &StateSet, symbol: SymbolId) -> StateSet {
        debug_assert!(!is_epsilon(symbol), "use epsilon_closure for epsilon moves");

        let mut reached = StateSet::with_capacity(self.num_states as usize);
        for state in states.iter() {
            if let Some(destinations) = self.transitions.get(&(state, symbol)) {
                for &destination in destinations {
                    reached.insert(destination);
                }
            }
        }
        reached
    }

    /// Simulates the automaton on a word of symbol names.
    pub fn accepts<S: AsRef<str>>(&self, word: &[S]) -> bool {
        let Some(start) = self.start_state else {
            return false;
        };

        let mut current = self.epsilon_closure(&StateSet::singleton(start, 1));
        for name in word {
            let Some(symbol) = self.alphabet.id(name.as_ref()) else {
                return false;
            };
            current = self.epsilon_closure(&self.move_on_symbol(&current, symbol));
            if current.is_empty() {
                return false;
            }
        }

        current.intersects(&self.final_states)
    }

    /// Get all transitions as an iterator, ordered by source and symbol.
    pub fn transitions(&self) -> impl Iterator<Item = (StateId, SymbolId, StateId)> + '_ {
        self.transitions
            .iter()
            .flat_map(|(&(src, sym), dests)| dests.iter().map(move |&dst| (src, sym, dst)))
    }
}
