//! Regular expressions over named symbols.

mod parse;
mod thompson;

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use peg::error::ParseError;
use peg::str::LineCol;

use crate::automaton::{subset_construction, Dfa, EpsilonNfa};
use crate::log::log;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Regex {
    /// Matches nothing.
    Empty,
    /// Matches only the empty word.
    Epsilon,
    Symbol(String),
    /// Runs are kept flat, so a long sequence does not nest.
    Concat(Vec<Regex>),
    Union(Vec<Regex>),
    Star(Box<Regex>),
}

#[derive(Debug, thiserror::Error)]
#[error("malformed regular expression: {0}")]
pub struct RegexSyntaxError(#[from] ParseError<LineCol>);

impl Regex {
    pub fn concat(left: Regex, right: Regex) -> Regex {
        Regex::concat_all([left, right])
    }

    pub fn union(left: Regex, right: Regex) -> Regex {
        Regex::union_all([left, right])
    }

    /// Concatenation of `items`, splicing in nested concatenations.
    pub fn concat_all<I: IntoIterator<Item = Regex>>(items: I) -> Regex {
        let mut flat = vec![];
        for item in items {
            match item {
                Regex::Concat(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }

        match flat.len() {
            0 => Regex::Epsilon,
            1 => flat.remove(0),
            _ => Regex::Concat(flat),
        }
    }

    /// Union of `items`, splicing in nested unions.
    pub fn union_all<I: IntoIterator<Item = Regex>>(items: I) -> Regex {
        let mut flat = vec![];
        for item in items {
            match item {
                Regex::Union(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }

        match flat.len() {
            0 => Regex::Empty,
            1 => flat.remove(0),
            _ => Regex::Union(flat),
        }
    }

    /// `(r*)*` is `r*`.
    pub fn star(inner: Regex) -> Regex {
        match inner {
            Regex::Star(_) => inner,
            other => Regex::Star(Box::new(other)),
        }
    }

    /// `inner | ε`; left alone when `inner` already matches the empty word
    /// at its top level.
    pub fn optional(inner: Regex) -> Regex {
        match &inner {
            Regex::Epsilon | Regex::Star(_) => inner,
            Regex::Union(items) if items.contains(&Regex::Epsilon) => inner,
            _ => Regex::union(inner, Regex::Epsilon),
        }
    }

    pub fn to_epsilon_nfa(&self) -> EpsilonNfa {
        thompson::thompson(self)
    }

    pub fn to_minimal_dfa(&self) -> Dfa {
        let nfa = self.to_epsilon_nfa();
        log!("thompson construction built {} states", nfa.num_states());

        subset_construction(&nfa).minimize()
    }
}

pub fn parse_regex(pattern: &str) -> Result<Regex, RegexSyntaxError> {
    Ok(parse::regex_parser::regex(pattern)?)
}

impl FromStr for Regex {
    type Err = RegexSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_regex(s)
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regex::Empty => write!(f, "∅"),
            Regex::Epsilon => write!(f, "ε"),
            Regex::Symbol(name) => write!(f, "{name}"),
            Regex::Concat(items) => write!(f, "({})", items.iter().join(" ")),
            Regex::Union(items) => write!(f, "({})", items.iter().join(" | ")),
            Regex::Star(inner) => write!(f, "({inner})*"),
        }
    }
}
