//! Context-free grammar normalization and regular expression compilation.
//!
//! The four entry points at the crate root are pure functions over text:
//! grammars are parsed, converted to Chomsky normal form and flattened into
//! name-based productions; regular expressions are compiled through an
//! epsilon-NFA and subset construction into a minimal DFA that is flattened
//! into an indexed edge list.

pub mod automaton;
pub mod export;
pub mod grammar;
pub mod log;
pub mod regex;

pub use export::{ExportedDfa, ExportedGrammar, NormalForm, NormalFormWithVariables};
pub use grammar::{GrammarFormat, GrammarOptions, GrammarSyntaxError};
pub use regex::RegexSyntaxError;

use crate::grammar::parse_grammar;
use crate::log::log;

/// Parses `text`, converts it to Chomsky normal form and reports whether the
/// original grammar derives the empty word.
pub fn normalize_cfg(text: &str) -> Result<NormalForm, GrammarSyntaxError> {
    normalize_cfg_with(text, &GrammarOptions::default())
}

pub fn normalize_cfg_with(
    text: &str,
    options: &GrammarOptions,
) -> Result<NormalForm, GrammarSyntaxError> {
    let grammar = parse_grammar(text, options)?;
    let derives_epsilon = grammar.derives_epsilon();
    let normal = grammar.to_normal_form();

    Ok(NormalForm::new(&normal, derives_epsilon))
}

/// Parses `text` without normalizing it.
pub fn read_cfg(text: &str) -> Result<ExportedGrammar, GrammarSyntaxError> {
    read_cfg_with(text, &GrammarOptions::default())
}

pub fn read_cfg_with(
    text: &str,
    options: &GrammarOptions,
) -> Result<ExportedGrammar, GrammarSyntaxError> {
    let grammar = parse_grammar(text, options)?;
    Ok(ExportedGrammar::from(&grammar))
}

/// Same as [`normalize_cfg`], additionally returning the variables of the
/// grammar as it was written.
pub fn normalize_cfg_with_variables(
    text: &str,
) -> Result<NormalFormWithVariables, GrammarSyntaxError> {
    normalize_cfg_with_variables_with(text, &GrammarOptions::default())
}

pub fn normalize_cfg_with_variables_with(
    text: &str,
    options: &GrammarOptions,
) -> Result<NormalFormWithVariables, GrammarSyntaxError> {
    let grammar = parse_grammar(text, options)?;
    let derives_epsilon = grammar.derives_epsilon();
    let original_variables = grammar.variables().iter().cloned().collect();
    let normal = grammar.to_normal_form();

    Ok(NormalFormWithVariables::new(
        &normal,
        original_variables,
        derives_epsilon,
    ))
}

/// Compiles `pattern` into its minimal DFA and flattens it into indexed edges.
pub fn compile_regex(pattern: &str) -> Result<ExportedDfa, RegexSyntaxError> {
    let regex = regex::parse_regex(pattern)?;
    let dfa = regex.to_minimal_dfa();

    log!(
        "compiled `{}` into {} states",
        pattern.trim(),
        dfa.num_states()
    );

    Ok(ExportedDfa::from_dfa(&dfa))
}
