//! Conversion to Chomsky normal form.
//!
//! The stages run in the classic order START, TERM, BIN, DEL, UNIT and are
//! followed by removal of useless variables. DEL runs after BIN, so every body
//! it expands has at most two symbols and yields at most four variants.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;

use super::{nullable_variables, Grammar, Production, Symbol};
use crate::log::log;

pub fn normalize(grammar: &Grammar) -> Grammar {
    let mut names = FreshNames::new(grammar);

    let (start, productions) = add_start(grammar, &mut names);
    let productions = isolate_terminals(productions, &mut names);
    let productions = binarize(productions, &mut names);
    let productions = remove_epsilon(productions, &start);
    let productions = remove_units(productions);
    let productions = prune(&start, productions);

    log!(
        "normal form: {} -> {} productions, start `{}`",
        grammar.productions().len(),
        productions.len(),
        start
    );

    Grammar::new(start, productions)
}

/// Hands out variable names unused by the grammar being normalized.
struct FreshNames {
    taken: HashSet<String>,
    links: usize,
}

impl FreshNames {
    fn new(grammar: &Grammar) -> Self {
        let taken = grammar
            .variables()
            .iter()
            .chain(grammar.terminals())
            .cloned()
            .collect();

        FreshNames { taken, links: 0 }
    }

    fn claim(&mut self, candidate: String) -> String {
        let mut name = candidate.clone();
        let mut suffix = 0;

        while self.taken.contains(&name) {
            suffix += 1;
            name = format!("{candidate}#{suffix}");
        }

        self.taken.insert(name.clone());
        name
    }

    fn link(&mut self, head: &str) -> String {
        self.links += 1;
        self.claim(format!("{head}_{}", self.links))
    }
}

fn mentions(production: &Production, variable: &str) -> bool {
    production
        .body
        .iter()
        .any(|symbol| symbol.as_variable() == Some(variable))
}

/// START: a fresh start symbol, needed only when the old one occurs in a body.
fn add_start(grammar: &Grammar, names: &mut FreshNames) -> (String, IndexSet<Production>) {
    let start = grammar.start_symbol();

    if !grammar.productions().iter().any(|p| mentions(p, start)) {
        return (start.to_string(), grammar.productions().clone());
    }

    let fresh = names.claim(format!("{start}'"));
    let mut productions = IndexSet::with_capacity(grammar.productions().len() + 1);
    productions.insert(Production::new(fresh.clone(), vec![Symbol::variable(start)]));
    productions.extend(grammar.productions().iter().cloned());

    (fresh, productions)
}

/// TERM: terminals in bodies longer than one symbol go behind `T_x -> x`.
fn isolate_terminals(
    productions: IndexSet<Production>,
    names: &mut FreshNames,
) -> IndexSet<Production> {
    let mut wrappers: IndexMap<String, String> = IndexMap::new();
    let mut result = IndexSet::with_capacity(productions.len());

    for production in productions {
        if production.body.len() < 2 {
            result.insert(production);
            continue;
        }

        let body = production
            .body
            .into_iter()
            .map(|symbol| match symbol {
                Symbol::Terminal(terminal) => match wrappers.get(&terminal) {
                    Some(wrapper) => Symbol::variable(wrapper.clone()),
                    None => {
                        let wrapper = names.claim(format!("T_{terminal}"));
                        wrappers.insert(terminal, wrapper.clone());
                        Symbol::Variable(wrapper)
                    }
                },
                variable => variable,
            })
            .collect();

        result.insert(Production::new(production.head, body));
    }

    result.extend(
        wrappers
            .into_iter()
            .map(|(terminal, wrapper)| Production::new(wrapper, vec![Symbol::Terminal(terminal)])),
    );
    result
}

/// BIN: `A -> X Y Z` becomes `A -> X A_1`, `A_1 -> Y Z`.
fn binarize(productions: IndexSet<Production>, names: &mut FreshNames) -> IndexSet<Production> {
    let mut result = IndexSet::with_capacity(productions.len());

    for production in productions {
        if production.body.len() <= 2 {
            result.insert(production);
            continue;
        }

        let mut head = production.head.clone();
        let mut rest = production.body.as_slice();

        while rest.len() > 2 {
            let link = names.link(&production.head);
            result.insert(Production::new(
                head,
                vec![rest[0].clone(), Symbol::variable(link.clone())],
            ));
            head = link;
            rest = &rest[1..];
        }

        result.insert(Production::new(head, rest.to_vec()));
    }

    result
}

/// DEL: every combination of nullable occurrences may be dropped; epsilon
/// productions survive only at the start symbol.
fn remove_epsilon(productions: IndexSet<Production>, start: &str) -> IndexSet<Production> {
    let nullable = nullable_variables(&productions);
    let mut result = IndexSet::with_capacity(productions.len());

    for production in &productions {
        let optional = production
            .body
            .iter()
            .positions(|symbol| symbol.as_variable().map_or(false, |v| nullable.contains(v)))
            .collect_vec();

        for dropped in optional.into_iter().powerset() {
            let body = production
                .body
                .iter()
                .enumerate()
                .filter(|(idx, _)| !dropped.contains(idx))
                .map(|(_, symbol)| symbol.clone())
                .collect_vec();

            if !body.is_empty() {
                result.insert(Production::new(production.head.clone(), body));
            }
        }
    }

    if nullable.contains(start) {
        result.insert(Production::new(start, vec![]));
    }

    result
}

/// UNIT: `A -> B` is replaced by the non-unit productions of everything in the
/// unit closure of `A`.
fn remove_units(productions: IndexSet<Production>) -> IndexSet<Production> {
    let mut by_head: IndexMap<&str, Vec<&Production>> = IndexMap::new();
    for production in &productions {
        by_head
            .entry(production.head.as_str())
            .or_default()
            .push(production);
    }

    let mut result = IndexSet::with_capacity(productions.len());

    for &head in by_head.keys() {
        let mut closure: IndexSet<&str> = IndexSet::new();
        closure.insert(head);
        let mut stack = vec![head];

        while let Some(variable) = stack.pop() {
            let targets = by_head
                .get(variable)
                .into_iter()
                .flatten()
                .filter_map(|p| p.unit_target());

            for target in targets {
                if closure.insert(target) {
                    stack.push(target);
                }
            }
        }

        for variable in closure {
            let inherited = by_head
                .get(variable)
                .into_iter()
                .flatten()
                .filter(|p| p.unit_target().is_none());

            for production in inherited {
                result.insert(Production::new(head, production.body.clone()));
            }
        }
    }

    result
}

fn generating_variables(productions: &IndexSet<Production>) -> HashSet<String> {
    let mut generating = HashSet::new();
    let mut changed = true;

    while changed {
        changed = false;
        for production in productions {
            if generating.contains(&production.head) {
                continue;
            }

            let generates = production
                .body
                .iter()
                .all(|symbol| symbol.is_terminal() || generating.contains(symbol.name()));

            if generates {
                generating.insert(production.head.clone());
                changed = true;
            }
        }
    }

    generating
}

fn reachable_variables(start: &str, productions: &IndexSet<Production>) -> HashSet<String> {
    let mut by_head: HashMap<&str, Vec<&Production>> = HashMap::new();
    for production in productions {
        by_head
            .entry(production.head.as_str())
            .or_default()
            .push(production);
    }

    let mut reachable = HashSet::new();
    let mut queue = VecDeque::new();
    reachable.insert(start.to_string());
    queue.push_back(start);

    while let Some(variable) = queue.pop_front() {
        for production in by_head.get(variable).into_iter().flatten() {
            for next in production.body.iter().filter_map(Symbol::as_variable) {
                if reachable.insert(next.to_string()) {
                    queue.push_back(next);
                }
            }
        }
    }

    reachable
}

/// Drops non-generating and unreachable variables until neither removes
/// anything.
fn prune(start: &str, mut productions: IndexSet<Production>) -> IndexSet<Production> {
    loop {
        let before = productions.len();

        let generating = generating_variables(&productions);
        productions.retain(|p| {
            generating.contains(&p.head)
                && p.body
                    .iter()
                    .filter_map(Symbol::as_variable)
                    .all(|v| generating.contains(v))
        });

        let reachable = reachable_variables(start, &productions);
        productions.retain(|p| reachable.contains(&p.head));

        if productions.len() == before {
            return productions;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{parse_grammar, GrammarOptions};

    fn normal_form(text: &str) -> Grammar {
        parse_grammar(text, &GrammarOptions::default())
            .unwrap()
            .to_normal_form()
    }

    fn rendered(grammar: &Grammar) -> Vec<String> {
        grammar
            .productions()
            .iter()
            .map(ToString::to_string)
            .sorted()
            .collect()
    }

    #[test]
    fn test_single_terminal_is_untouched() {
        let grammar = normal_form("S -> a");

        assert_eq!(grammar.start_symbol(), "S");
        assert_eq!(rendered(&grammar), vec!["S -> a"]);
    }

    #[test]
    fn test_balanced_brackets() {
        let grammar = normal_form("S -> a S b | $");

        assert!(grammar.is_normal_form());
        assert_eq!(grammar.start_symbol(), "S'");
        assert_eq!(
            rendered(&grammar),
            vec![
                "S -> T_a S_1",
                "S' -> T_a S_1",
                "S' -> ε",
                "S_1 -> S T_b",
                "S_1 -> b",
                "T_a -> a",
                "T_b -> b",
            ]
        );
    }

    #[test]
    fn test_fresh_names_avoid_collisions() {
        let grammar = normal_form("S -> a S | S' T_a\nS' -> c\nT_a -> d");

        assert!(grammar.is_normal_form());
        assert_eq!(grammar.start_symbol(), "S'#1");
        assert!(grammar
            .productions()
            .iter()
            .any(|p| p.to_string() == "T_a#1 -> a"));
    }

    #[test]
    fn test_long_body_chain_keeps_order() {
        let grammar = normal_form("S -> A B C D\nA -> a\nB -> b\nC -> c\nD -> d");

        assert_eq!(
            rendered(&grammar),
            vec![
                "A -> a",
                "B -> b",
                "C -> c",
                "D -> d",
                "S -> A S_1",
                "S_1 -> B S_2",
                "S_2 -> C D",
            ]
        );
    }

    #[test]
    fn test_unit_cycle() {
        let grammar = normal_form("S -> A\nA -> B\nB -> S | c");

        assert!(grammar.is_normal_form());
        assert_eq!(rendered(&grammar), vec!["S' -> c"]);
    }

    #[test]
    fn test_empty_language() {
        let grammar = normal_form("S -> A b\nA -> A a");
        assert!(grammar.productions().is_empty());
    }

    #[test]
    fn test_only_epsilon() {
        let grammar = normal_form("S -> $");
        assert_eq!(rendered(&grammar), vec!["S -> ε"]);
    }

    #[test]
    fn test_unreachable_after_pruning() {
        // B only occurs next to the non-generating C, so it becomes
        // unreachable once C is gone.
        let grammar = normal_form("S -> a | B C\nB -> b\nC -> C c");
        assert_eq!(rendered(&grammar), vec!["S -> a"]);
    }

    #[test]
    fn test_nullable_variables_are_inlined() {
        let grammar = normal_form("S -> A B\nA -> a | $\nB -> b | $");

        assert!(grammar.is_normal_form());
        assert_eq!(
            rendered(&grammar),
            vec!["A -> a", "B -> b", "S -> A B", "S -> a", "S -> b", "S -> ε"]
        );
    }

    #[test]
    fn test_normalization_is_deterministic() {
        let text = "S -> a S b S | b A\nA -> a A A | $";
        let first = normal_form(text);
        let second = normal_form(text);

        assert_eq!(
            first.productions().iter().collect_vec(),
            second.productions().iter().collect_vec()
        );
    }
}
