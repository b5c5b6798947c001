use std::collections::BTreeMap;

use beau_collector::BeauCollector;

use super::parse::RawRule;
use super::{classify, GrammarIssue, Symbol};

type ValidateResult = Result<(), anyhow::Error>;

pub fn validate_grammar(rules: &[RawRule], start: &str) -> ValidateResult {
    let checks = [find_start, heads_are_variables, consistent_symbols];

    let _ = checks
        .into_iter()
        .map(|check| check(rules, start))
        .bcollect::<Vec<_>>()?;

    Ok(())
}

fn find_start(rules: &[RawRule], start: &str) -> ValidateResult {
    let defined = rules
        .iter()
        .any(|rule| classify(rule.head).as_ref().and_then(Symbol::as_variable) == Some(start));

    if defined {
        Ok(())
    } else {
        Err(GrammarIssue::UndefinedStart(start.to_string()).into())
    }
}

fn heads_are_variables(rules: &[RawRule], _start: &str) -> ValidateResult {
    rules
        .iter()
        .filter(|rule| !matches!(classify(rule.head), Some(Symbol::Variable(_))))
        .map(|rule| {
            Err::<(), anyhow::Error>(GrammarIssue::TerminalHead(rule.head.to_string()).into())
        })
        .bcollect::<Vec<_>>()?;
    Ok(())
}

fn consistent_symbols(rules: &[RawRule], _start: &str) -> ValidateResult {
    // name -> (used as terminal, used as variable)
    let mut usage: BTreeMap<String, (bool, bool)> = BTreeMap::new();

    let tokens = rules
        .iter()
        .flat_map(|rule| std::iter::once(&rule.head).chain(rule.alternatives.iter().flatten()));

    for token in tokens {
        match classify(token) {
            Some(Symbol::Terminal(name)) => usage.entry(name).or_default().0 = true,
            Some(Symbol::Variable(name)) => usage.entry(name).or_default().1 = true,
            None => {}
        }
    }

    usage
        .into_iter()
        .filter(|(_, (terminal, variable))| *terminal && *variable)
        .map(|(name, _)| Err::<(), anyhow::Error>(GrammarIssue::AmbiguousSymbol(name).into()))
        .bcollect::<Vec<_>>()?;
    Ok(())
}
