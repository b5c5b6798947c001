use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::grammar::{Grammar, Production, Symbol};

#[derive(Clone, Debug)]
pub struct ProductionApplication {
    pub production: Production,
    pub items: Vec<TreeNode>,
}

#[derive(Clone, Debug)]
pub enum TreeNode {
    ProductionApplication(ProductionApplication),
    Terminal(String),
}

impl TreeNode {
    pub fn fold(&self, buffer: &mut Vec<String>) {
        match self {
            TreeNode::ProductionApplication(pa) => {
                for item in &pa.items {
                    item.fold(buffer);
                }
            }
            TreeNode::Terminal(t) => buffer.push(t.clone()),
        }
    }
}

impl From<TreeNode> for Sample {
    fn from(tree: TreeNode) -> Sample {
        let mut word = vec![];
        tree.fold(&mut word);
        Sample { tree, word }
    }
}

/// A derivation tree together with the word it yields.
#[derive(Clone, Debug)]
pub struct Sample {
    pub tree: TreeNode,
    pub word: Vec<String>,
}

/// Produces random words of a grammar by bounded-depth derivation.
///
/// Each variable's minimal derivation height is computed up front, and only
/// productions that can still finish within the remaining depth are chosen,
/// so generation never backtracks.
pub struct Generator {
    grammar: Grammar,
    depth_limit: usize,
    heights: HashMap<String, usize>,
}

impl Generator {
    pub fn new(grammar: Grammar, depth_limit: usize) -> Generator {
        let heights = minimal_heights(&grammar);

        Generator {
            grammar,
            depth_limit,
            heights,
        }
    }

    pub fn generate(&self) -> Option<Sample> {
        self.generate_with(&mut rand::thread_rng())
    }

    /// `None` when no word of the grammar has a derivation within the depth
    /// limit, in particular when the language is empty.
    pub fn generate_with<R: Rng>(&self, rng: &mut R) -> Option<Sample> {
        let start = self.grammar.start_symbol();

        if !self.fits(start, self.depth_limit) {
            return None;
        }

        self.generate_production(rng, start, self.depth_limit)
            .map(Sample::from)
    }

    fn fits(&self, variable: &str, budget: usize) -> bool {
        self.heights
            .get(variable)
            .map_or(false, |&height| height <= budget)
    }

    fn generate_symbol<R: Rng>(
        &self,
        rng: &mut R,
        symbol: &Symbol,
        remaining_depth: usize,
    ) -> Option<TreeNode> {
        match symbol {
            Symbol::Terminal(t) => Some(TreeNode::Terminal(t.clone())),
            Symbol::Variable(v) => self.generate_production(rng, v, remaining_depth - 1),
        }
    }

    fn generate_production<R: Rng>(
        &self,
        rng: &mut R,
        current: &str,
        remaining_depth: usize,
    ) -> Option<TreeNode> {
        let usable: Vec<&Production> = self
            .grammar
            .productions_of(current)
            .filter(|production| {
                production
                    .body
                    .iter()
                    .filter_map(Symbol::as_variable)
                    .all(|v| remaining_depth > 0 && self.fits(v, remaining_depth - 1))
            })
            .collect();

        let production = usable.choose(rng)?;

        let items = production
            .body
            .iter()
            .map(|symbol| self.generate_symbol(rng, symbol, remaining_depth))
            .collect::<Option<Vec<TreeNode>>>()?;

        Some(TreeNode::ProductionApplication(ProductionApplication {
            production: (*production).clone(),
            items,
        }))
    }
}

/// Height of the shortest derivation tree of every generating variable; a
/// production whose body holds only terminals has height zero.
fn minimal_heights(grammar: &Grammar) -> HashMap<String, usize> {
    let mut heights: HashMap<String, usize> = HashMap::new();
    let mut changed = true;

    while changed {
        changed = false;
        for production in grammar.productions() {
            let height = production
                .body
                .iter()
                .filter_map(Symbol::as_variable)
                .map(|v| heights.get(v).map(|h| h + 1))
                .try_fold(0, |acc, h| h.map(|h| acc.max(h)));

            let Some(height) = height else {
                continue;
            };

            let known = heights.get(&production.head).copied();
            if known.map_or(true, |known| height < known) {
                heights.insert(production.head.clone(), height);
                changed = true;
            }
        }
    }

    heights
}
