pub mod cnf;
pub mod generation;
mod parse;
mod validate_grammar;

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use indexmap::IndexSet;
use itertools::Itertools;
use peg::error::ParseError;
use peg::str::LineCol;
use serde_derive::Deserialize;

use parse::grammar_parser::{arrow_grammar, compact_grammar};
use parse::RawRule;

/// Tokens that stand for the empty word inside a production body.
pub const EPSILON_TOKENS: [&str; 4] = ["$", "ε", "ϵ", "epsilon"];

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Terminal(String),
    Variable(String),
}

impl Symbol {
    pub fn terminal<S: Into<String>>(name: S) -> Self {
        Symbol::Terminal(name.into())
    }

    pub fn variable<S: Into<String>>(name: S) -> Self {
        Symbol::Variable(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            Symbol::Terminal(name) | Symbol::Variable(name) => name,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Terminal(_))
    }

    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Symbol::Variable(name) => Some(name),
            Symbol::Terminal(_) => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `head -> body`; an empty body is an epsilon production.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Production {
    pub head: String,
    pub body: Vec<Symbol>,
}

impl Production {
    pub fn new<S: Into<String>>(head: S, body: Vec<Symbol>) -> Self {
        Production {
            head: head.into(),
            body,
        }
    }

    pub fn is_epsilon(&self) -> bool {
        self.body.is_empty()
    }

    /// The variable on the right of a unit production `A -> B`.
    pub fn unit_target(&self) -> Option<&str> {
        match self.body.as_slice() {
            [symbol] => symbol.as_variable(),
            _ => None,
        }
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.body.is_empty() {
            write!(f, "{} -> ε", self.head)
        } else {
            write!(f, "{} -> {}", self.head, self.body.iter().join(" "))
        }
    }
}

#[derive(Clone, Debug)]
pub struct Grammar {
    start: String,
    variables: BTreeSet<String>,
    terminals: BTreeSet<String>,
    productions: IndexSet<Production>,
}

impl Grammar {
    /// Builds a grammar whose variables are the start symbol, every head and
    /// every variable occurring in a body.
    pub fn new<S, I>(start: S, productions: I) -> Grammar
    where
        S: Into<String>,
        I: IntoIterator<Item = Production>,
    {
        let start = start.into();
        let productions: IndexSet<Production> = productions.into_iter().collect();

        let mut variables = BTreeSet::new();
        let mut terminals = BTreeSet::new();
        variables.insert(start.clone());

        for production in &productions {
            variables.insert(production.head.clone());
            for symbol in &production.body {
                match symbol {
                    Symbol::Variable(name) => variables.insert(name.clone()),
                    Symbol::Terminal(name) => terminals.insert(name.clone()),
                };
            }
        }

        Grammar {
            start,
            variables,
            terminals,
            productions,
        }
    }

    pub fn start_symbol(&self) -> &str {
        &self.start
    }

    pub fn variables(&self) -> &BTreeSet<String> {
        &self.variables
    }

    pub fn terminals(&self) -> &BTreeSet<String> {
        &self.terminals
    }

    pub fn productions(&self) -> &IndexSet<Production> {
        &self.productions
    }

    pub fn productions_of<'a>(&'a self, head: &'a str) -> impl Iterator<Item = &'a Production> {
        self.productions.iter().filter(move |p| p.head == head)
    }

    pub fn nullable_variables(&self) -> HashSet<String> {
        nullable_variables(&self.productions)
    }

    /// Whether the start symbol derives the empty word.
    pub fn derives_epsilon(&self) -> bool {
        self.nullable_variables().contains(&self.start)
    }

    pub fn to_normal_form(&self) -> Grammar {
        cnf::normalize(self)
    }

    /// Every production is `A -> B C` or `A -> a`, apart from an optional
    /// `start -> ε` when the start symbol appears in no body.
    pub fn is_normal_form(&self) -> bool {
        let start_in_body = self
            .productions
            .iter()
            .any(|p| p.body.iter().any(|s| s.as_variable() == Some(&self.start)));

        self.productions.iter().all(|p| match p.body.as_slice() {
            [Symbol::Terminal(_)] => true,
            [Symbol::Variable(_), Symbol::Variable(_)] => true,
            [] => p.head == self.start && !start_in_body,
            _ => false,
        })
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for production in &self.productions {
            writeln!(f, "{production}")?;
        }
        Ok(())
    }
}

/// Fixpoint: a variable is nullable if some production of it has a body made
/// only of nullable variables.
pub(crate) fn nullable_variables(productions: &IndexSet<Production>) -> HashSet<String> {
    let mut nullable = HashSet::new();
    let mut changed = true;

    while changed {
        changed = false;
        for production in productions {
            if nullable.contains(&production.head) {
                continue;
            }

            let all_nullable = production.body.iter().all(|symbol| {
                symbol
                    .as_variable()
                    .map_or(false, |name| nullable.contains(name))
            });

            if all_nullable {
                nullable.insert(production.head.clone());
                changed = true;
            }
        }
    }

    nullable
}

#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GrammarFormat {
    /// `Head -> body | body`, one rule per line.
    #[default]
    Arrow,
    /// `Head sym sym`, one production per line.
    Compact,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GrammarOptions {
    pub start: String,
    pub format: GrammarFormat,
}

impl Default for GrammarOptions {
    fn default() -> Self {
        Self {
            start: "S".to_string(),
            format: GrammarFormat::Arrow,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarSyntaxError {
    #[error("malformed grammar: {0}")]
    Malformed(#[from] ParseError<LineCol>),

    #[error("invalid grammar: {0}")]
    Invalid(anyhow::Error),
}

/// A single semantic problem found while validating grammar text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarIssue {
    #[error("start symbol `{0}` has no productions")]
    UndefinedStart(String),

    #[error("`{0}` is used both as a terminal and as a variable")]
    AmbiguousSymbol(String),

    #[error("production head `{0}` is not a variable")]
    TerminalHead(String),
}

/// Classifies a token of the text; `None` stands for epsilon.
pub(crate) fn classify(token: &str) -> Option<Symbol> {
    if EPSILON_TOKENS.contains(&token) {
        return None;
    }

    if let Some(name) = token.strip_prefix("VAR:").filter(|n| !n.is_empty()) {
        return Some(Symbol::variable(name));
    }
    if let Some(name) = token.strip_prefix("TER:").filter(|n| !n.is_empty()) {
        return Some(Symbol::terminal(name));
    }

    if token.chars().next().map_or(false, char::is_uppercase) {
        Some(Symbol::variable(token))
    } else {
        Some(Symbol::terminal(token))
    }
}

pub fn parse_grammar(content: &str, options: &GrammarOptions) -> Result<Grammar, GrammarSyntaxError> {
    let rules = match options.format {
        GrammarFormat::Arrow => arrow_grammar(content)?,
        GrammarFormat::Compact => compact_grammar(content)?,
    };

    validate_grammar::validate_grammar(&rules, &options.start)
        .map_err(GrammarSyntaxError::Invalid)?;

    Ok(build_grammar(&rules, &options.start))
}

fn build_grammar(rules: &[RawRule], start: &str) -> Grammar {
    let productions = rules.iter().flat_map(|rule| {
        let head = match classify(rule.head) {
            Some(Symbol::Variable(name)) => Some(name),
            _ => None,
        };

        rule.alternatives.iter().filter_map(move |alternative| {
            let body = alternative.iter().filter_map(|token| classify(token)).collect();
            head.clone().map(|head| Production::new(head, body))
        })
    });

    Grammar::new(start, productions)
}
