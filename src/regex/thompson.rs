//! Thompson construction of an epsilon-NFA from a regular expression.

use crate::automaton::{EpsilonNfa, StateId};
use crate::regex::Regex;

/// A sub-automaton with a single entry and a single exit state.
#[derive(Clone, Copy, Debug)]
struct Fragment {
    start: StateId,
    end: StateId,
}

pub fn thompson(regex: &Regex) -> EpsilonNfa {
    let mut nfa = EpsilonNfa::new();
    let fragment = build(&mut nfa, regex);

    nfa.set_start_state(fragment.start);
    nfa.add_final_state(fragment.end);
    nfa
}

fn build(nfa: &mut EpsilonNfa, regex: &Regex) -> Fragment {
    match regex {
        Regex::Empty => Fragment {
            start: nfa.add_state(),
            end: nfa.add_state(),
        },
        Regex::Epsilon => {
            let (start, end) = (nfa.add_state(), nfa.add_state());
            nfa.add_epsilon_transition(start, end);
            Fragment { start, end }
        }
        Regex::Symbol(name) => {
            let (start, end) = (nfa.add_state(), nfa.add_state());
            nfa.add_symbol_transition(start, name, end);
            Fragment { start, end }
        }
        Regex::Concat(items) => {
            let fragments: Vec<Fragment> = items.iter().map(|item| build(nfa, item)).collect();

            let (Some(first), Some(last)) = (fragments.first(), fragments.last()) else {
                return build(nfa, &Regex::Epsilon);
            };

            for pair in fragments.windows(2) {
                nfa.add_epsilon_transition(pair[0].end, pair[1].start);
            }

            Fragment {
                start: first.start,
                end: last.end,
            }
        }
        Regex::Union(items) => {
            let start = nfa.add_state();
            let alternatives: Vec<Fragment> = items.iter().map(|item| build(nfa, item)).collect();
            let end = nfa.add_state();

            for alternative in alternatives {
                nfa.add_epsilon_transition(start, alternative.start);
                nfa.add_epsilon_transition(alternative.end, end);
            }
            Fragment { start, end }
        }
        Regex::Star(inner) => {
            let start = nfa.add_state();
            let inner = build(nfa, inner);
            let end = nfa.add_state();

            nfa.add_epsilon_transition(start, inner.start);
            nfa.add_epsilon_transition(start, end);
            nfa.add_epsilon_transition(inner.end, inner.start);
            nfa.add_epsilon_transition(inner.end, end);
            Fragment { start, end }
        }
    }
}
