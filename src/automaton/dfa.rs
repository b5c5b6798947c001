//! Deterministic Finite Automaton (DFA) implementation with partition-refinement minimization.

use indexmap::IndexMap;
use std::collections::{BTreeMap, VecDeque};

use crate::automaton::state::{StateId, StateSet};
use crate::automaton::symbol::{Alphabet, SymbolId};
use crate::log::log;

/// A Deterministic Finite Automaton.
///
/// The transition function may be partial; a missing transition rejects.
#[derive(Debug, Clone, Default)]
pub struct Dfa {
    /// Number of states
    num_states: StateId,
    /// Start state (None if empty)
    start_state: Option<StateId>,
    /// Final (accepting) states
    final_states: StateSet,
    /// Transitions: (source, symbol) -> destination
    transitions: BTreeMap<(StateId, SymbolId), StateId>,
    alphabet: Alphabet,
}

impl Dfa {
    /// Create a new empty DFA.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alphabet(alphabet: Alphabet) -> Self {
        Self {
            alphabet,
            ..Self::default()
        }
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

    pub fn set_start_state(&mut self, state: StateId) {
        self.ensure_state(state);
        self.start_state = Some(state);
    }

    pub fn add_final_state(&mut self, state: StateId) {
        self.ensure_state(state);
        self.final_states.insert(state);
    }

    /// Add a transition, replacing any previous one for the same source and symbol.
    pub fn add_transition(&mut self, source: StateId, symbol: SymbolId, destination: StateId) {
        self.ensure_state(source);
        self.ensure_state(destination);
        self.transitions.insert((source, symbol), destination);
    }

    pub fn add_symbol_transition(&mut self, source: StateId, name: &str, destination: StateId) {
        let symbol = self.alphabet.intern(name);
        self.add_transition(source, symbol, destination);
    }

    pub fn transition(&self, source: StateId, symbol: SymbolId) -> Option<StateId> {
        self.transitions.get(&(source, symbol)).copied()
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

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Get all transitions, ordered by source and symbol id.
    pub fn transitions(&self) -> impl Iterator<Item = (StateId, SymbolId, StateId)> + '_ {
        self.transitions
            .iter()
            .map(|(&(src, sym), &dst)| (src, sym, dst))
    }

    /// Check if the DFA is empty (accepts no strings).
    pub fn is_empty(&self) -> bool {
        let Some(start) = self.start_state else {
            return true;
        };

        !self.reachable_states(start).intersects(&self.final_states)
    }

    /// Runs a word of symbol names from the start state.
    pub fn accepts<S: AsRef<str>>(&self, word: &[S]) -> bool {
        let Some(mut state) = self.start_state else {
            return false;
        };

        for name in word {
            let next = self
                .alphabet
                .id(name.as_ref())
                .and_then(|symbol| self.transition(state, symbol));

            match next {
                Some(next) => state = next,
                None => return false,
            }
        }

        self.final_states.contains(state)
    }

    /// Transitions leaving `state`, in symbol id order.
    fn successors(&self, state: StateId) -> impl Iterator<Item = (SymbolId, StateId)> + '_ {
        self.transitions
            .range((state, 0)..=(state, SymbolId::MAX))
            .map(|(&(_, symbol), &next)| (symbol, next))
    }

    /// Symbol ids paired with their names, sorted by name.
    fn symbols_by_name(&self) -> Vec<(SymbolId, &str)> {
        let mut symbols: Vec<_> = self
            .alphabet
            .ids()
            .filter_map(|symbol| Some((symbol, self.alphabet.label(symbol)?)))
            .collect();
        symbols.sort_by(|a, b| a.1.cmp(b.1));
        symbols
    }

    /// Find all states reachable from `start`.
    fn reachable_states(&self, start: StateId) -> StateSet {
        let mut reachable = StateSet::with_capacity(self.num_states as usize);
        let mut queue = VecDeque::from([start]);

        while let Some(state) = queue.pop_front() {
            if !reachable.insert(state) {
                continue;
            }

            queue.extend(
                self.successors(state)
                    .map(|(_, next)| next)
                    .filter(|next| !reachable.contains(*next)),
            );
        }

        reachable
    }

    /// Reachable states from which some final state can be reached, plus the start.
    fn live_states(&self, start: StateId) -> StateSet {
        let reachable = self.reachable_states(start);

        let mut predecessors: Vec<Vec<StateId>> = vec![vec![]; self.num_states as usize];
        for (src, _, dst) in self.transitions() {
            if reachable.contains(src) {
                predecessors[dst as usize].push(src);
            }
        }

        let mut live = StateSet::with_capacity(self.num_states as usize);
        let mut stack: Vec<StateId> = self.final_states.intersection(&reachable).to_vec();

        while let Some(state) = stack.pop() {
            if !live.insert(state) {
                continue;
            }
            stack.extend(
                predecessors[state as usize]
                    .iter()
                    .filter(|p| !live.contains(**p)),
            );
        }

        live.insert(start);
        live
    }

    /// Returns the minimal DFA accepting the same language.
    ///
    /// Unreachable and dead states are dropped first, so the result is a
    /// partial DFA without a sink. States are numbered breadth-first from the
    /// start, visiting symbols in name order, which makes the result canonical:
    /// two DFAs with the same language minimize to identical automata.
    pub fn minimize(&self) -> Dfa {
        let Some(start) = self.start_state else {
            let mut empty = Dfa::new();
            let state = empty.add_state();
            empty.set_start_state(state);
            return empty;
        };

        let live = &self.live_states(start);
        let live_successors = move |state: StateId| {
            self.successors(state)
                .filter(move |&(_, next)| live.contains(next))
        };

        let block_of = Refinement::new(self, live).run();
        let num_blocks = block_of.iter().flatten().max().map_or(0, |b| b + 1);

        let symbols = self.symbols_by_name();
        let mut rank = vec![0; self.alphabet.len()];
        for (position, &(symbol, _)) in symbols.iter().enumerate() {
            rank[symbol as usize] = position;
        }

        let mut used = vec![false; self.alphabet.len()];
        for state in live.iter() {
            for (symbol, _) in live_successors(state) {
                used[symbol as usize] = true;
            }
        }

        let mut alphabet = Alphabet::new();
        for &(symbol, name) in &symbols {
            if used[symbol as usize] {
                alphabet.intern(name);
            }
        }

        let mut minimal = Dfa::with_alphabet(alphabet);
        let mut numbering: Vec<Option<StateId>> = vec![None; num_blocks];
        let mut queue = VecDeque::from([start]);
        let block = |state: StateId| block_of[state as usize].unwrap_or(0);

        let new_start = minimal.add_state();
        minimal.set_start_state(new_start);
        numbering[block(start)] = Some(new_start);

        // Each block is expanded once, through the first member discovered.
        while let Some(state) = queue.pop_front() {
            let Some(source) = numbering[block(state)] else {
                continue;
            };

            if self.final_states.contains(state) {
                minimal.add_final_state(source);
            }

            let mut edges: Vec<(SymbolId, StateId)> = live_successors(state).collect();
            edges.sort_by_key(|&(symbol, _)| rank[symbol as usize]);

            for (symbol, next) in edges {
                let target = match numbering[block(next)] {
                    Some(target) => target,
                    None => {
                        let target = minimal.add_state();
                        numbering[block(next)] = Some(target);
                        queue.push_back(next);
                        target
                    }
                };

                if let Some(name) = self.alphabet.label(symbol) {
                    minimal.add_symbol_transition(source, name, target);
                }
            }
        }

        log!(
            "minimized {} dfa states into {}",
            self.num_states,
            minimal.num_states()
        );

        minimal
    }

    /// Product automaton accepting words accepted by both DFAs.
    ///
    /// Alphabets are merged by symbol name; only symbols known to both sides
    /// produce transitions. The result is not minimized.
    pub fn intersection(&self, other: &Dfa) -> Dfa {
        let mut alphabet = self.alphabet.clone();
        for symbol in other.alphabet.ids() {
            if let Some(name) = other.alphabet.label(symbol) {
                alphabet.intern(name);
            }
        }
        let mut product = Dfa::with_alphabet(alphabet);

        let (Some(left_start), Some(right_start)) = (self.start_state, other.start_state) else {
            return product;
        };

        let shared: Vec<(SymbolId, SymbolId, &str)> = self
            .symbols_by_name()
            .into_iter()
            .filter_map(|(left, name)| Some((left, other.alphabet.id(name)?, name)))
            .collect();

        let mut numbering: IndexMap<(StateId, StateId), StateId> = IndexMap::new();
        let mut queue = VecDeque::new();

        let start = product.add_state();
        product.set_start_state(start);
        numbering.insert((left_start, right_start), start);
        queue.push_back((left_start, right_start, start));

        while let Some((left, right, source)) = queue.pop_front() {
            if self.final_states.contains(left) && other.final_states.contains(right) {
                product.add_final_state(source);
            }

            for &(left_symbol, right_symbol, name) in &shared {
                let (Some(left_next), Some(right_next)) = (
                    self.transition(left, left_symbol),
                    other.transition(right, right_symbol),
                ) else {
                    continue;
                };

                let target = match numbering.get(&(left_next, right_next)) {
                    Some(&target) => target,
                    None => {
                        let target = product.add_state();
                        numbering.insert((left_next, right_next), target);
                        queue.push_back((left_next, right_next, target));
                        target
                    }
                };

                product.add_symbol_transition(source, name, target);
            }
        }

        product
    }
}

/// Partition refinement over the live states of a DFA.
///
/// Blocks are contiguous ranges of `elements`, and the marked members of a
/// block sit at its front until the block is split. Splitting by the smaller
/// half relies on every state having at most one successor per symbol.
struct Refinement {
    elements: Vec<StateId>,
    position: Vec<usize>,
    block_of: Vec<Option<usize>>,
    first: Vec<usize>,
    end: Vec<usize>,
    marked: Vec<usize>,
    touched: Vec<usize>,
    pending: Vec<bool>,
    worklist: Vec<usize>,
    predecessors: Vec<Vec<(SymbolId, StateId)>>,
}

impl Refinement {
    fn new(dfa: &Dfa, live: &StateSet) -> Self {
        let num_states = dfa.num_states as usize;

        let mut predecessors = vec![vec![]; num_states];
        for (src, symbol, dst) in dfa.transitions() {
            if live.contains(src) && live.contains(dst) {
                predecessors[dst as usize].push((symbol, src));
            }
        }

        let mut refinement = Refinement {
            elements: Vec::with_capacity(live.len()),
            position: vec![0; num_states],
            block_of: vec![None; num_states],
            first: vec![],
            end: vec![],
            marked: vec![],
            touched: vec![],
            pending: vec![],
            worklist: vec![],
            predecessors,
        };

        let (finals, others): (Vec<StateId>, Vec<StateId>) =
            live.iter().partition(|&state| dfa.final_states.contains(state));

        for members in [others, finals] {
            if members.is_empty() {
                continue;
            }

            let block = refinement.first.len();
            refinement.first.push(refinement.elements.len());
            for state in members {
                refinement.position[state as usize] = refinement.elements.len();
                refinement.block_of[state as usize] = Some(block);
                refinement.elements.push(state);
            }
            refinement.end.push(refinement.elements.len());
            refinement.marked.push(0);

            // A missing transition is not implied by the complement block, so
            // both initial blocks act as splitters.
            refinement.pending.push(true);
            refinement.worklist.push(block);
        }

        refinement
    }

    fn mark(&mut self, state: StateId) {
        let Some(block) = self.block_of[state as usize] else {
            return;
        };

        let current = self.position[state as usize];
        let boundary = self.first[block] + self.marked[block];
        if current < boundary {
            return;
        }

        self.elements.swap(current, boundary);
        self.position[self.elements[current] as usize] = current;
        self.position[state as usize] = boundary;

        if self.marked[block] == 0 {
            self.touched.push(block);
        }
        self.marked[block] += 1;
    }

    /// Moves the marked front of every touched block into a block of its own.
    fn split_touched(&mut self) {
        for block in std::mem::take(&mut self.touched) {
            let marked = std::mem::replace(&mut self.marked[block], 0);
            let first = self.first[block];

            if first + marked == self.end[block] {
                continue;
            }

            let new_block = self.first.len();
            self.first.push(first);
            self.end.push(first + marked);
            self.marked.push(0);
            self.pending.push(false);
            self.first[block] = first + marked;

            for &state in &self.elements[first..first + marked] {
                self.block_of[state as usize] = Some(new_block);
            }

            let remaining = self.end[block] - self.first[block];
            let splitter = if self.pending[block] || marked <= remaining {
                new_block
            } else {
                block
            };
            self.pending[splitter] = true;
            self.worklist.push(splitter);
        }
    }

    /// Block index of every live state; `None` for the others.
    fn run(mut self) -> Vec<Option<usize>> {
        while let Some(splitter) = self.worklist.pop() {
            self.pending[splitter] = false;

            let members = self.elements[self.first[splitter]..self.end[splitter]].to_vec();
            let mut sources_by_symbol: BTreeMap<SymbolId, Vec<StateId>> = BTreeMap::new();
            for state in members {
                for &(symbol, source) in &self.predecessors[state as usize] {
                    sources_by_symbol.entry(symbol).or_default().push(source);
                }
            }

            for sources in sources_by_symbol.into_values() {
                for source in sources {
                    self.mark(source);
                }
                self.split_touched();
            }
        }

        self.block_of
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(dfa: &Dfa) -> Vec<(StateId, String, StateId)> {
        dfa.transitions()
            .map(|(src, sym, dst)| (src, dfa.alphabet().label(sym).unwrap().to_string(), dst))
            .collect()
    }

    #[test]
    fn test_dfa_basic() {
        let mut dfa = Dfa::new();
        let s0 = dfa.add_state();
        let s1 = dfa.add_state();
        let s2 = dfa.add_state();

        dfa.set_start_state(s0);
        dfa.add_final_state(s2);
        dfa.add_symbol_transition(s0, "a", s1);
        dfa.add_symbol_transition(s1, "b", s2);

        assert_eq!(dfa.num_states(), 3);
        assert_eq!(dfa.start_state(), Some(0));
        assert!(!dfa.is_empty());
        assert!(dfa.accepts(&["a", "b"]));
        assert!(!dfa.accepts(&["a"]));
        assert!(!dfa.accepts(&["a", "c"]));
    }

    #[test]
    fn test_dfa_minimization() {
        // 0 -a-> 1 -b-> 3(final)
        // 0 -b-> 2 -b-> 4(final)
        // States 1 and 2 should be merged, as should 3 and 4
        let mut dfa = Dfa::new();
        dfa.set_start_state(0);
        dfa.add_final_state(3);
        dfa.add_final_state(4);

        dfa.add_symbol_transition(0, "a", 1);
        dfa.add_symbol_transition(0, "b", 2);
        dfa.add_symbol_transition(1, "b", 3);
        dfa.add_symbol_transition(2, "b", 4);

        let minimized = dfa.minimize();

        assert_eq!(minimized.num_states(), 3);
        assert_eq!(minimized.final_states().to_vec(), vec![2]);
        assert_eq!(
            edges(&minimized),
            vec![
                (0, "a".to_string(), 1),
                (0, "b".to_string(), 1),
                (1, "b".to_string(), 2)
            ]
        );
    }

    #[test]
    fn test_minimization_drops_dead_and_unreachable_states() {
        let mut dfa = Dfa::new();
        dfa.set_start_state(0);
        dfa.add_final_state(1);
        dfa.add_final_state(4);

        dfa.add_symbol_transition(0, "a", 1);
        // 2 is a sink
        dfa.add_symbol_transition(0, "b", 2);
        dfa.add_symbol_transition(2, "b", 2);
        // 3 and 4 are unreachable
        dfa.add_symbol_transition(3, "c", 4);

        let minimized = dfa.minimize();

        assert_eq!(minimized.num_states(), 2);
        assert_eq!(edges(&minimized), vec![(0, "a".to_string(), 1)]);
        assert_eq!(minimized.alphabet().len(), 1);
    }

    #[test]
    fn test_minimization_is_canonical() {
        // Both accept (ab)*, with states created in different orders.
        let mut first = Dfa::new();
        first.set_start_state(0);
        first.add_final_state(0);
        first.add_symbol_transition(0, "a", 1);
        first.add_symbol_transition(1, "b", 0);

        let mut second = Dfa::new();
        second.set_start_state(2);
        second.add_final_state(2);
        second.add_final_state(0);
        second.add_symbol_transition(1, "b", 0);
        second.add_symbol_transition(2, "a", 1);
        second.add_symbol_transition(0, "a", 3);
        second.add_symbol_transition(3, "b", 2);

        let first = first.minimize();
        let second = second.minimize();

        assert_eq!(first.num_states(), 2);
        assert_eq!(edges(&first), edges(&second));
        assert_eq!(first.final_states().to_vec(), second.final_states().to_vec());
    }

    #[test]
    fn test_missing_transition_separates_states() {
        // p and q only differ in p having an `a` move; q and r are equivalent
        let (s, p, q, r, f) = (0, 1, 2, 3, 4);
        let mut dfa = Dfa::new();
        dfa.set_start_state(s);
        dfa.add_final_state(f);
        dfa.add_symbol_transition(s, "x", p);
        dfa.add_symbol_transition(s, "y", q);
        dfa.add_symbol_transition(p, "a", r);
        dfa.add_symbol_transition(p, "b", f);
        dfa.add_symbol_transition(q, "b", f);
        dfa.add_symbol_transition(r, "b", f);

        let minimized = dfa.minimize();

        assert_eq!(minimized.num_states(), 4);
        assert!(minimized.accepts(&["x", "a", "b"]));
        assert!(minimized.accepts(&["y", "b"]));
        assert!(!minimized.accepts(&["y", "a", "b"]));
    }

    #[test]
    fn test_long_chain_minimization() {
        let length = 20_000;
        let mut dfa = Dfa::new();
        dfa.set_start_state(0);
        dfa.add_final_state(length);
        for state in 0..length {
            dfa.add_symbol_transition(state, "a", state + 1);
        }

        let minimized = dfa.minimize();

        assert_eq!(minimized.num_states(), length + 1);
        assert_eq!(minimized.final_states().to_vec(), vec![length]);
        assert_eq!(minimized.transition(7, 0), Some(8));
    }

    #[test]
    fn test_minimize_without_start() {
        let minimized = Dfa::new().minimize();

        assert_eq!(minimized.num_states(), 1);
        assert_eq!(minimized.start_state(), Some(0));
        assert!(minimized.final_states().is_empty());
        assert!(minimized.is_empty());
    }

    #[test]
    fn test_empty_dfa() {
        let dfa = Dfa::new();
        assert!(dfa.is_empty());

        let mut dfa2 = Dfa::new();
        dfa2.add_state();
        dfa2.set_start_state(0);
        // No final states - should be empty
        assert!(dfa2.is_empty());

        dfa2.add_final_state(3);
        dfa2.add_symbol_transition(1, "a", 3);
        // Final state exists but is unreachable
        assert!(dfa2.is_empty());
    }

    #[test]
    fn test_intersection() {
        // a*b
        let mut left = Dfa::new();
        left.set_start_state(0);
        left.add_final_state(1);
        left.add_symbol_transition(0, "a", 0);
        left.add_symbol_transition(0, "b", 1);

        // words of length 2 over {a, b, c}
        let mut right = Dfa::new();
        right.set_start_state(0);
        right.add_final_state(2);
        for name in ["c", "b", "a"] {
            right.add_symbol_transition(0, name, 1);
            right.add_symbol_transition(1, name, 2);
        }

        let product = left.intersection(&right);

        assert!(product.accepts(&["a", "b"]));
        assert!(!product.accepts(&["b"]));
        assert!(!product.accepts(&["a", "a", "b"]));
        assert!(!product.accepts(&["c", "b"]));
        assert_eq!(product.alphabet().len(), 3);
        assert_eq!(product.minimize().num_states(), 3);
    }
}
