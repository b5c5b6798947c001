//! Flat, name-based views of grammars and automata for callers.

use std::collections::HashMap;
use std::fmt;

use itertools::Itertools;
use serde_derive::Serialize;

use crate::automaton::Dfa;
use crate::grammar::{Grammar, Production};

/// A production as `(head, body)`; an empty body is an epsilon production.
pub type ExportedProduction = (String, Vec<String>);

/// A labelled edge `(from, to, label)`.
pub type ExportedEdge = (usize, usize, String);

fn export_productions(grammar: &Grammar) -> Vec<ExportedProduction> {
    grammar
        .productions()
        .iter()
        .map(|Production { head, body }| {
            (
                head.clone(),
                body.iter().map(|symbol| symbol.name().to_string()).collect(),
            )
        })
        .collect()
}

fn write_productions(f: &mut fmt::Formatter<'_>, productions: &[ExportedProduction]) -> fmt::Result {
    for (head, body) in productions {
        if body.is_empty() {
            writeln!(f, "{head} -> ε")?;
        } else {
            writeln!(f, "{head} -> {}", body.iter().join(" "))?;
        }
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExportedGrammar {
    pub start: String,
    pub productions: Vec<ExportedProduction>,
}

impl From<&Grammar> for ExportedGrammar {
    fn from(grammar: &Grammar) -> Self {
        ExportedGrammar {
            start: grammar.start_symbol().to_string(),
            productions: export_productions(grammar),
        }
    }
}

impl fmt::Display for ExportedGrammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "start: {}", self.start)?;
        write_productions(f, &self.productions)
    }
}

/// A grammar in Chomsky normal form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NormalForm {
    pub start: String,
    pub productions: Vec<ExportedProduction>,
    /// Whether the grammar the normal form was computed from derives the
    /// empty word.
    pub derives_epsilon: bool,
}

impl NormalForm {
    pub fn new(normal: &Grammar, derives_epsilon: bool) -> Self {
        NormalForm {
            start: normal.start_symbol().to_string(),
            productions: export_productions(normal),
            derives_epsilon,
        }
    }
}

impl fmt::Display for NormalForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "start: {}", self.start)?;
        writeln!(f, "derives epsilon: {}", self.derives_epsilon)?;
        write_productions(f, &self.productions)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NormalFormWithVariables {
    pub start: String,
    /// Variables of the grammar before normalization, sorted by name.
    pub original_variables: Vec<String>,
    pub productions: Vec<ExportedProduction>,
    pub derives_epsilon: bool,
}

impl NormalFormWithVariables {
    pub fn new(normal: &Grammar, original_variables: Vec<String>, derives_epsilon: bool) -> Self {
        NormalFormWithVariables {
            start: normal.start_symbol().to_string(),
            original_variables,
            productions: export_productions(normal),
            derives_epsilon,
        }
    }
}

impl fmt::Display for NormalFormWithVariables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "start: {}", self.start)?;
        writeln!(f, "original variables: {}", self.original_variables.iter().join(" "))?;
        writeln!(f, "derives epsilon: {}", self.derives_epsilon)?;
        write_productions(f, &self.productions)
    }
}

/// A DFA with dense state indices and symbol names on its edges.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExportedDfa {
    pub num_states: usize,
    pub start: usize,
    /// Sorted.
    pub finals: Vec<usize>,
    /// Sorted by source, then label.
    pub edges: Vec<ExportedEdge>,
}

impl ExportedDfa {
    /// States keep the numbering of `dfa`. A DFA without a start state is
    /// exported with start 0.
    pub fn from_dfa(dfa: &Dfa) -> Self {
        let mut edges: Vec<ExportedEdge> = dfa
            .transitions()
            .filter_map(|(src, symbol, dst)| {
                let label = dfa.alphabet().label(symbol)?;
                Some((src as usize, dst as usize, label.to_string()))
            })
            .collect();
        edges.sort_by(|a, b| (a.0, &a.2, a.1).cmp(&(b.0, &b.2, b.1)));

        ExportedDfa {
            num_states: dfa.num_states() as usize,
            start: dfa.start_state().unwrap_or_default() as usize,
            finals: dfa.final_states().iter().map(|s| s as usize).collect(),
            edges,
        }
    }

    /// Runs a word of symbol names over the exported edges.
    pub fn accepts<S: AsRef<str>>(&self, word: &[S]) -> bool {
        if self.num_states == 0 {
            return false;
        }

        let delta: HashMap<(usize, &str), usize> = self
            .edges
            .iter()
            .map(|(from, to, label)| ((*from, label.as_str()), *to))
            .collect();

        let mut state = self.start;
        for symbol in word {
            match delta.get(&(state, symbol.as_ref())) {
                Some(&next) => state = next,
                None => return false,
            }
        }

        self.finals.binary_search(&state).is_ok()
    }
}

impl fmt::Display for ExportedDfa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "states: {}", self.num_states)?;
        writeln!(f, "start: {}", self.start)?;
        writeln!(f, "finals: {}", self.finals.iter().join(" "))?;
        for (from, to, label) in &self.edges {
            writeln!(f, "{from} {label} {to}")?;
        }
        Ok(())
    }
}
