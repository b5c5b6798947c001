#![allow(dead_code)]

use std::collections::{BTreeSet, HashSet, VecDeque};

use formlang::export::ExportedProduction;
use formlang::regex::Regex;
use formlang::ExportedDfa;

pub fn word(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Every word over `alphabet` of length at most `max_len`, shortest first.
pub fn enumerate_words(alphabet: &[String], max_len: usize) -> Vec<Vec<String>> {
    let mut words = vec![vec![]];
    let mut layer: Vec<Vec<String>> = vec![vec![]];

    for _ in 0..max_len {
        layer = layer
            .iter()
            .flat_map(|prefix| {
                alphabet.iter().map(move |symbol| {
                    let mut next = prefix.clone();
                    next.push(symbol.clone());
                    next
                })
            })
            .collect();
        words.extend(layer.iter().cloned());
    }

    words
}

/// Body symbols that never appear as a head.
pub fn terminals_of(productions: &[ExportedProduction]) -> Vec<String> {
    let heads: HashSet<&str> = productions.iter().map(|(h, _)| h.as_str()).collect();
    let terminals: BTreeSet<String> = productions
        .iter()
        .flat_map(|(_, body)| body.iter())
        .filter(|s| !heads.contains(s.as_str()))
        .cloned()
        .collect();
    terminals.into_iter().collect()
}

/// CYK membership for a grammar in Chomsky normal form.
pub fn cyk(productions: &[ExportedProduction], start: &str, word: &[String]) -> bool {
    let n = word.len();
    if n == 0 {
        return productions
            .iter()
            .any(|(head, body)| head == start && body.is_empty());
    }

    // table[i][l - 1] holds the variables deriving word[i..i + l]
    let mut table: Vec<Vec<HashSet<&str>>> = vec![vec![HashSet::new(); n]; n];

    for (i, symbol) in word.iter().enumerate() {
        for (head, body) in productions {
            if body.len() == 1 && &body[0] == symbol {
                table[i][0].insert(head.as_str());
            }
        }
    }

    for len in 2..=n {
        for i in 0..=n - len {
            for split in 1..len {
                for (head, body) in productions {
                    if body.len() != 2 {
                        continue;
                    }
                    if table[i][split - 1].contains(body[0].as_str())
                        && table[i + split][len - split - 1].contains(body[1].as_str())
                    {
                        table[i][len - 1].insert(head.as_str());
                    }
                }
            }
        }
    }

    table[0][n - 1].contains(start)
}

/// Membership for an arbitrary context-free grammar, epsilon and unit
/// productions included, by a span chart filled to a fixpoint.
pub fn derives(productions: &[ExportedProduction], start: &str, word: &[String]) -> bool {
    let heads: HashSet<&str> = productions.iter().map(|(h, _)| h.as_str()).collect();
    let n = word.len();
    let mut chart: HashSet<(&str, usize, usize)> = HashSet::new();

    for len in 0..=n {
        for i in 0..=n - len {
            let j = i + len;
            loop {
                let mut changed = false;
                for (head, body) in productions {
                    if chart.contains(&(head.as_str(), i, j)) {
                        continue;
                    }

                    let mut positions: BTreeSet<usize> = BTreeSet::from([i]);
                    for symbol in body {
                        let mut next = BTreeSet::new();
                        for &p in &positions {
                            if heads.contains(symbol.as_str()) {
                                for q in p..=j {
                                    if chart.contains(&(symbol.as_str(), p, q)) {
                                        next.insert(q);
                                    }
                                }
                            } else if p < j && &word[p] == symbol {
                                next.insert(p + 1);
                            }
                        }
                        positions = next;
                    }

                    if positions.contains(&j) {
                        chart.insert((head.as_str(), i, j));
                        changed = true;
                    }
                }
                if !changed {
                    break;
                }
            }
        }
    }

    chart.contains(&(start, 0, n))
}

/// Positions reachable after matching `regex` from any of `starts`.
fn ends(regex: &Regex, word: &[String], starts: &BTreeSet<usize>) -> BTreeSet<usize> {
    match regex {
        Regex::Empty => BTreeSet::new(),
        Regex::Epsilon => starts.clone(),
        Regex::Symbol(name) => starts
            .iter()
            .filter(|&&p| p < word.len() && &word[p] == name)
            .map(|p| p + 1)
            .collect(),
        Regex::Concat(items) => items
            .iter()
            .fold(starts.clone(), |reached, item| ends(item, word, &reached)),
        Regex::Union(items) => items
            .iter()
            .flat_map(|item| ends(item, word, starts))
            .collect(),
        Regex::Star(inner) => {
            let mut result = starts.clone();
            loop {
                let before = result.len();
                let more = ends(inner, word, &result);
                result.extend(more);
                if result.len() == before {
                    return result;
                }
            }
        }
    }
}

/// Matches a word against the expression tree directly.
pub fn regex_matches(regex: &Regex, word: &[String]) -> bool {
    ends(regex, word, &BTreeSet::from([0])).contains(&word.len())
}

pub fn edge_labels(dfa: &ExportedDfa) -> Vec<String> {
    let labels: BTreeSet<String> = dfa.edges.iter().map(|(_, _, l)| l.clone()).collect();
    labels.into_iter().collect()
}

fn step(dfa: &ExportedDfa, state: Option<usize>, label: &str) -> Option<usize> {
    let state = state?;
    dfa.edges
        .iter()
        .find(|(from, _, l)| *from == state && l == label)
        .map(|(_, to, _)| *to)
}

/// Whether some word is accepted from exactly one of `p` and `q`; a missing
/// transition leads to an implicit rejecting sink.
pub fn distinguishable(dfa: &ExportedDfa, p: usize, q: usize) -> bool {
    let labels = edge_labels(dfa);
    let is_final = |s: Option<usize>| s.map_or(false, |s| dfa.finals.contains(&s));

    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([(Some(p), Some(q))]);

    while let Some((a, b)) = queue.pop_front() {
        if !seen.insert((a, b)) {
            continue;
        }
        if is_final(a) != is_final(b) {
            return true;
        }
        for label in &labels {
            queue.push_back((step(dfa, a, label), step(dfa, b, label)));
        }
    }

    false
}
