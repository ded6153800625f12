use super::creators::{create_terminal, GrowCreator, TreeCreator};
use super::crossover::{borrow_slot, slot_at};
use crate::error::{GpError, Result};
use crate::functions::symbol::SymbolKind;
use crate::grammar::{Grammar, SelectionTable};
use crate::tree::{ExpressionTree, Node, NodePath};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use std::sync::Arc;

/// Produces a modified copy of a tree. The input tree is never changed.
pub trait Mutator: Send + Sync {
    fn name(&self) -> &'static str;

    fn mutate(&self, rng: &mut dyn RngCore, grammar: &Grammar, tree: &ExpressionTree) -> Result<ExpressionTree>;
}

fn random_path(rng: &mut dyn RngCore, tree: &ExpressionTree) -> NodePath {
    let paths = tree.prefix_paths();
    paths[rng.gen_range(0..paths.len())].clone()
}

/// Replaces a random subtree with a freshly grown one.
///
/// The new fragment is bounded by `max_length`/`max_depth` and by whatever room the grammar's
/// global length and depth limits leave around the mutation point.
pub struct SubtreeMutator {
    pub max_length: usize,
    pub max_depth: usize,
    creator: Arc<dyn TreeCreator>,
}

impl SubtreeMutator {
    pub fn new(max_length: usize, max_depth: usize) -> Self {
        Self {
            max_length,
            max_depth,
            creator: Arc::new(GrowCreator),
        }
    }

    pub fn with_creator(mut self, creator: Arc<dyn TreeCreator>) -> Self {
        self.creator = creator;
        self
    }
}

impl Mutator for SubtreeMutator {
    fn name(&self) -> &'static str {
        "SubtreeMutator"
    }

    fn mutate(&self, rng: &mut dyn RngCore, grammar: &Grammar, tree: &ExpressionTree) -> Result<ExpressionTree> {
        let mut mutant = tree.clone();
        let path = random_path(rng, &mutant);
        let target_length = mutant.subtree(&path).map_or(0, Node::length);
        let outside = mutant.length() - target_length;
        let length_budget = self.max_length.min(grammar.max_length().saturating_sub(outside));
        let depth_budget = self.max_depth.min(grammar.max_depth().saturating_sub(path.len()));
        if length_budget == 0 || depth_budget == 0 {
            log::trace!("no room for a new subtree at {:?}", path);
            return Ok(mutant);
        }

        let slot = slot_at(&mutant, &path);
        let fragment =
            self.creator
                .create_subtree(rng, grammar, borrow_slot(&slot), length_budget, depth_budget)?;
        mutant.replace_at(&path, fragment)?;
        Ok(mutant)
    }
}

/// Swaps the symbol of a random node for another symbol of compatible arity that is legal at
/// the node's position and accepts the node's existing children.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeNodeTypeMutator;

impl Mutator for ChangeNodeTypeMutator {
    fn name(&self) -> &'static str {
        "ChangeNodeTypeMutator"
    }

    fn mutate(&self, rng: &mut dyn RngCore, grammar: &Grammar, tree: &ExpressionTree) -> Result<ExpressionTree> {
        let mut mutant = tree.clone();
        let path = random_path(rng, &mutant);
        let slot = slot_at(&mutant, &path);
        let node = mutant
            .subtree(&path)
            .ok_or_else(|| GpError::InvalidTree(format!("no node at {:?}", path)))?;

        let current = node.symbol();
        let arity = node.child_count();
        let terminal = node.is_terminal();
        let candidates: Vec<_> = grammar
            .candidates_for(borrow_slot(&slot))
            .into_iter()
            .filter(|candidate| {
                candidate.name() != current.name()
                    && candidate.is_terminal() == terminal
                    && candidate.accepts_arity(arity)
                    && node
                        .children()
                        .iter()
                        .enumerate()
                        .all(|(i, child)| grammar.is_allowed_child_symbol(candidate, child.symbol(), i))
            })
            .collect();

        let Some(replacement) = SelectionTable::new(&candidates).choose(rng) else {
            log::trace!("no replacement symbol for {} at {:?}", current.name(), path);
            return Ok(mutant);
        };

        if terminal {
            let leaf = create_terminal(rng, &replacement)?;
            mutant.replace_at(&path, leaf)?;
        } else if let Some(target) = mutant.subtree_mut(&path) {
            target.set_function_symbol(replacement)?;
        }
        Ok(mutant)
    }
}

/// Perturbs one terminal: constants are shifted by up to `shift_range` either way, variables
/// are renamed to another name declared by their own variable symbol.
#[derive(Debug, Clone, Copy)]
pub struct ChangeTerminalMutator {
    pub shift_range: f64,
}

impl Default for ChangeTerminalMutator {
    fn default() -> Self {
        Self { shift_range: 1.0 }
    }
}

impl Mutator for ChangeTerminalMutator {
    fn name(&self) -> &'static str {
        "ChangeTerminalMutator"
    }

    fn mutate(&self, rng: &mut dyn RngCore, _grammar: &Grammar, tree: &ExpressionTree) -> Result<ExpressionTree> {
        let mut mutant = tree.clone();
        let leaves: Vec<NodePath> = mutant
            .prefix_paths()
            .into_iter()
            .filter(|p| mutant.subtree(p).map_or(false, Node::is_terminal))
            .collect();
        let Some(path) = leaves.choose(rng) else {
            return Ok(mutant);
        };

        match mutant.subtree_mut(path) {
            Some(Node::Constant { value, .. }) => {
                if self.shift_range > 0.0 {
                    *value += rng.gen_range(-self.shift_range..=self.shift_range);
                }
            }
            Some(Node::Variable { symbol, name }) => {
                let declared: &[String] = match symbol.kind() {
                    SymbolKind::Variable { variable_names } => variable_names.as_slice(),
                    _ => &[],
                };
                let others: Vec<&String> = declared.iter().filter(|v| v.as_str() != name.as_str()).collect();
                if let Some(other) = others.choose(rng) {
                    *name = (*other).clone();
                }
            }
            _ => {}
        }
        Ok(mutant)
    }
}

/// Delegates each call to one of its mutators, chosen uniformly.
pub struct MultiMutator {
    mutators: Vec<Box<dyn Mutator>>,
}

impl MultiMutator {
    pub fn new(mutators: Vec<Box<dyn Mutator>>) -> Result<Self> {
        if mutators.is_empty() {
            return Err(GpError::Configuration(
                "multi mutator needs at least one mutator".to_string(),
            ));
        }
        Ok(Self { mutators })
    }
}

impl Mutator for MultiMutator {
    fn name(&self) -> &'static str {
        "MultiMutator"
    }

    fn mutate(&self, rng: &mut dyn RngCore, grammar: &Grammar, tree: &ExpressionTree) -> Result<ExpressionTree> {
        let index = rng.gen_range(0..self.mutators.len());
        self.mutators[index].mutate(rng, grammar, tree)
    }
}
