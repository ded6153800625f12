use crate::error::Result;
use crate::functions::symbol::Symbol;
use crate::grammar::Grammar;
use crate::tree::{ExpressionTree, Node, NodePath};
use rand::{Rng, RngCore};
use std::sync::Arc;

/// Recombines two parents. The offspring is always a copy of `parent_a` with zero or more
/// subtrees taken from `parent_b`, and shares no nodes with either parent.
pub trait Crossover: Send + Sync {
    fn name(&self) -> &'static str;

    fn cross(
        &self,
        rng: &mut dyn RngCore,
        grammar: &Grammar,
        parent_a: &ExpressionTree,
        parent_b: &ExpressionTree,
    ) -> Result<ExpressionTree>;
}

/// The slot a node occupies: its parent's symbol and its child index, `None` for the root.
pub(crate) fn slot_at(tree: &ExpressionTree, path: &[usize]) -> Option<(Arc<Symbol>, usize)> {
    tree.parent_of(path)
        .map(|(parent, index)| (Arc::clone(parent.symbol()), index))
}

pub(crate) fn borrow_slot(slot: &Option<(Arc<Symbol>, usize)>) -> Option<(&Symbol, usize)> {
    slot.as_ref().map(|(symbol, index)| (symbol.as_ref(), *index))
}

/// Whether `donor` may replace the subtree at `path` of `offspring` without breaking the
/// grammar or the grammar's global size limits.
fn is_legal_donor(grammar: &Grammar, offspring: &ExpressionTree, path: &[usize], donor: &Node) -> bool {
    let slot = slot_at(offspring, path);
    if !grammar.is_allowed_at(borrow_slot(&slot), donor.symbol()) {
        return false;
    }
    let Some(target) = offspring.subtree(path) else {
        return false;
    };
    let new_length = offspring.length() - target.length() + donor.length();
    let new_depth = path.len() + donor.depth();
    new_length <= grammar.max_length() && new_depth <= grammar.max_depth()
}

/// Replace the subtree at `path` with a copy of a random legal donor from `donors`.
/// Returns false when no donor is legal there.
fn swap_in_donor(
    rng: &mut dyn RngCore,
    grammar: &Grammar,
    offspring: &mut ExpressionTree,
    path: &[usize],
    donors: &[&Node],
) -> Result<bool> {
    let legal: Vec<&Node> = donors
        .iter()
        .copied()
        .filter(|donor| is_legal_donor(grammar, offspring, path, donor))
        .collect();
    if legal.is_empty() {
        log::trace!("no legal donor for crossover point {:?}", path);
        return Ok(false);
    }
    let donor = legal[rng.gen_range(0..legal.len())].clone();
    offspring.replace_at(path, donor)?;
    Ok(true)
}

/// Classic subtree crossover: one crossover point in the first parent, one grammar-legal donor
/// subtree from the second.
#[derive(Debug, Clone, Copy)]
pub struct SubtreeCrossover {
    /// Chance of picking a function node (rather than a leaf) as the crossover point
    pub internal_node_probability: f64,
}

impl Default for SubtreeCrossover {
    fn default() -> Self {
        Self { internal_node_probability: 0.9 }
    }
}

impl SubtreeCrossover {
    fn choose_point(&self, rng: &mut dyn RngCore, tree: &ExpressionTree) -> NodePath {
        let paths = tree.prefix_paths();
        let (internal, leaves): (Vec<NodePath>, Vec<NodePath>) = paths
            .into_iter()
            .partition(|p| tree.subtree(p).map_or(false, |n| !n.is_terminal()));

        let pool = if !internal.is_empty() && (leaves.is_empty() || rng.gen_bool(self.internal_node_probability)) {
            internal
        } else {
            leaves
        };
        pool[rng.gen_range(0..pool.len())].clone()
    }
}

impl Crossover for SubtreeCrossover {
    fn name(&self) -> &'static str {
        "SubtreeCrossover"
    }

    fn cross(
        &self,
        rng: &mut dyn RngCore,
        grammar: &Grammar,
        parent_a: &ExpressionTree,
        parent_b: &ExpressionTree,
    ) -> Result<ExpressionTree> {
        let mut offspring = parent_a.clone();
        let point = self.choose_point(rng, &offspring);
        let donors: Vec<&Node> = parent_b.iter_prefix().collect();
        swap_in_donor(rng, grammar, &mut offspring, &point, &donors)?;
        Ok(offspring)
    }
}

/// One-point crossover restricted to the region where both parents have the same shape.
///
/// The crossover point is a path that exists in both parents with every ancestor having equal
/// arity in both; the donor is the subtree of `parent_b` at that same path.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnePointCrossover;

impl OnePointCrossover {
    /// Paths shared by both trees whose ancestors all have matching arity
    pub fn common_region(a: &Node, b: &Node) -> Vec<NodePath> {
        let mut region = Vec::new();
        let mut stack: Vec<(NodePath, &Node, &Node)> = vec![(Vec::new(), a, b)];
        while let Some((path, x, y)) = stack.pop() {
            if x.child_count() == y.child_count() {
                for (i, (cx, cy)) in x.children().iter().zip(y.children()).enumerate().rev() {
                    let mut child_path = path.clone();
                    child_path.push(i);
                    stack.push((child_path, cx, cy));
                }
            }
            region.push(path);
        }
        region
    }
}

impl Crossover for OnePointCrossover {
    fn name(&self) -> &'static str {
        "OnePointCrossover"
    }

    fn cross(
        &self,
        rng: &mut dyn RngCore,
        grammar: &Grammar,
        parent_a: &ExpressionTree,
        parent_b: &ExpressionTree,
    ) -> Result<ExpressionTree> {
        let mut offspring = parent_a.clone();
        let candidates: Vec<(NodePath, &Node)> = Self::common_region(parent_a.root(), parent_b.root())
            .into_iter()
            .filter_map(|path| {
                let donor = parent_b.subtree(&path)?;
                is_legal_donor(grammar, &offspring, &path, donor).then_some((path, donor))
            })
            .collect();

        if candidates.is_empty() {
            log::trace!("one-point crossover found no aligned legal swap");
            return Ok(offspring);
        }

        let (path, donor) = &candidates[rng.gen_range(0..candidates.len())];
        offspring.replace_at(path, (*donor).clone())?;
        Ok(offspring)
    }
}

/// Visits every node of the first parent and, with `swap_probability`, swaps in a legal donor
/// from the second parent. Points without a legal donor are skipped, not retried.
#[derive(Debug, Clone, Copy)]
pub struct UniformCrossover {
    pub swap_probability: f64,
}

impl Default for UniformCrossover {
    fn default() -> Self {
        Self { swap_probability: 0.1 }
    }
}

impl Crossover for UniformCrossover {
    fn name(&self) -> &'static str {
        "UniformCrossover"
    }

    fn cross(
        &self,
        rng: &mut dyn RngCore,
        grammar: &Grammar,
        parent_a: &ExpressionTree,
        parent_b: &ExpressionTree,
    ) -> Result<ExpressionTree> {
        let mut offspring = parent_a.clone();
        let donors: Vec<&Node> = parent_b.iter_prefix().collect();

        // Prefix order; a swapped-in subtree is not visited again
        let mut stack: Vec<NodePath> = vec![Vec::new()];
        while let Some(path) = stack.pop() {
            if rng.gen_bool(self.swap_probability)
                && swap_in_donor(rng, grammar, &mut offspring, &path, &donors)?
            {
                continue;
            }
            let child_count = offspring.subtree(&path).map_or(0, Node::child_count);
            for i in (0..child_count).rev() {
                let mut child_path = path.clone();
                child_path.push(i);
                stack.push(child_path);
            }
        }

        Ok(offspring)
    }
}
