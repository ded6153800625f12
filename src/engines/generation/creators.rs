use crate::error::{GpError, Result};
use crate::functions::symbol::{Symbol, SymbolKind};
use crate::grammar::{Grammar, SelectionTable};
use crate::tree::{ExpressionTree, Node};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use std::sync::Arc;

/// Builds random trees that respect a grammar and a size budget.
pub trait TreeCreator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Build a subtree for `slot` (`None` is the root slot) within the given budget.
    ///
    /// A budget of 0 or 1 in either dimension yields a single terminal.
    fn create_subtree(
        &self,
        rng: &mut dyn RngCore,
        grammar: &Grammar,
        slot: Option<(&Symbol, usize)>,
        max_length: usize,
        max_depth: usize,
    ) -> Result<Node>;

    fn create(
        &self,
        rng: &mut dyn RngCore,
        grammar: &Grammar,
        max_length: usize,
        max_depth: usize,
    ) -> Result<ExpressionTree> {
        let root = self.create_subtree(rng, grammar, None, max_length, max_depth)?;
        Ok(ExpressionTree::new(root))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Grow,
    Full,
}

/// Irregular trees: every node above the depth limit may be a function or a terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrowCreator;

impl TreeCreator for GrowCreator {
    fn name(&self) -> &'static str {
        "Grow"
    }

    fn create_subtree(
        &self,
        rng: &mut dyn RngCore,
        grammar: &Grammar,
        slot: Option<(&Symbol, usize)>,
        max_length: usize,
        max_depth: usize,
    ) -> Result<Node> {
        build_node(rng, grammar, slot, max_length, max_depth, Shape::Grow)
    }
}

/// Trees whose branches all reach the depth limit, as far as the length budget allows.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullCreator;

impl TreeCreator for FullCreator {
    fn name(&self) -> &'static str {
        "Full"
    }

    fn create_subtree(
        &self,
        rng: &mut dyn RngCore,
        grammar: &Grammar,
        slot: Option<(&Symbol, usize)>,
        max_length: usize,
        max_depth: usize,
    ) -> Result<Node> {
        build_node(rng, grammar, slot, max_length, max_depth, Shape::Full)
    }
}

/// Grow or Full with equal probability, depth limit drawn between 2 and the maximum.
#[derive(Debug, Clone, Copy, Default)]
pub struct RampedHalfAndHalfCreator;

impl TreeCreator for RampedHalfAndHalfCreator {
    fn name(&self) -> &'static str {
        "RampedHalfAndHalf"
    }

    fn create_subtree(
        &self,
        rng: &mut dyn RngCore,
        grammar: &Grammar,
        slot: Option<(&Symbol, usize)>,
        max_length: usize,
        max_depth: usize,
    ) -> Result<Node> {
        let depth = if max_depth > 2 {
            rng.gen_range(2..=max_depth)
        } else {
            max_depth
        };
        let shape = if rng.gen_bool(0.5) { Shape::Grow } else { Shape::Full };
        build_node(rng, grammar, slot, max_length, depth, shape)
    }
}

fn describe(slot: Option<(&Symbol, usize)>) -> String {
    match slot {
        None => "for the root".to_string(),
        Some((parent, position)) => format!("below {} at position {}", parent.name(), position),
    }
}

fn build_node(
    rng: &mut dyn RngCore,
    grammar: &Grammar,
    slot: Option<(&Symbol, usize)>,
    max_length: usize,
    max_depth: usize,
    shape: Shape,
) -> Result<Node> {
    let candidates = SelectionTable::new(&grammar.candidates_for(slot));
    if candidates.is_empty() {
        return Err(GpError::NoEnabledSymbols(describe(slot)));
    }
    let terminals = candidates.filtered(|s| s.is_terminal());

    // Leaf level, or no room left for children
    if max_depth <= 1 || max_length <= 1 {
        let symbol = terminals
            .choose(rng)
            .ok_or_else(|| GpError::NoTerminalSymbols(describe(slot)))?;
        return create_terminal(rng, &symbol);
    }

    // A function needs at least one node per required child
    let functions = candidates.filtered(|s| !s.is_terminal() && s.min_arity() < max_length);
    let chosen = match shape {
        Shape::Grow => {
            let fitting = candidates.filtered(|s| s.is_terminal() || s.min_arity() < max_length);
            fitting.choose(rng)
        }
        Shape::Full => functions.choose(rng).or_else(|| terminals.choose(rng)),
    };
    let symbol = chosen.ok_or_else(|| GpError::NoTerminalSymbols(describe(slot)))?;

    if symbol.is_terminal() {
        return create_terminal(rng, &symbol);
    }

    let max_children = symbol.max_arity().min(max_length - 1);
    let arity = rng.gen_range(symbol.min_arity()..=max_children);

    let mut remaining = max_length - 1;
    let mut children = Vec::with_capacity(arity);
    for position in 0..arity {
        let budget = remaining / (arity - position);
        let child = build_node(
            rng,
            grammar,
            Some((symbol.as_ref(), position)),
            budget,
            max_depth - 1,
            shape,
        )?;
        remaining -= child.length();
        children.push(child);
    }

    Ok(Node::function(symbol, children))
}

/// Fresh terminal node for a variable or constant symbol.
pub fn create_terminal(rng: &mut dyn RngCore, symbol: &Arc<Symbol>) -> Result<Node> {
    match symbol.kind() {
        SymbolKind::Variable { variable_names } => {
            let name = variable_names.choose(rng).ok_or_else(|| {
                GpError::InvalidGrammar(format!(
                    "variable symbol {} has no variable names",
                    symbol.name()
                ))
            })?;
            Ok(Node::variable(Arc::clone(symbol), name.clone()))
        }
        SymbolKind::Constant { min_value, max_value } => {
            let value = if min_value < max_value {
                rng.gen_range(*min_value..*max_value)
            } else {
                *min_value
            };
            Ok(Node::constant(Arc::clone(symbol), value))
        }
        SymbolKind::Function(_) => Err(GpError::InvalidGrammar(format!(
            "{} is not a terminal symbol",
            symbol.name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::primitives::{Addition, Cosine, Multiplication, Sine};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn binary_grammar() -> Grammar {
        Grammar::from_symbols(vec![
            Symbol::function(Arc::new(Addition)),
            Symbol::function(Arc::new(Multiplication)),
            Symbol::variable("Variable", vec!["X"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_full_creator_fills_every_level() {
        let grammar = binary_grammar();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let tree = FullCreator.create(&mut rng, &grammar, 100, 4).unwrap();
            assert_eq!(tree.depth(), 4);
            assert_eq!(tree.length(), 15);
        }
    }

    #[test]
    fn test_zero_budget_yields_single_terminal() {
        let grammar = binary_grammar();
        let mut rng = StdRng::seed_from_u64(5);
        for (length, depth) in [(0, 5), (5, 0), (0, 0), (1, 10)] {
            let tree = GrowCreator.create(&mut rng, &grammar, length, depth).unwrap();
            assert_eq!(tree.length(), 1);
            assert!(tree.root().is_terminal());
        }
    }

    #[test]
    fn test_no_enabled_symbols_is_reported() {
        let mut grammar = binary_grammar();
        for name in ["Addition", "Multiplication", "Variable"] {
            grammar.set_enabled(name, false).unwrap();
        }
        let mut rng = StdRng::seed_from_u64(1);
        let err = GrowCreator.create(&mut rng, &grammar, 10, 4).unwrap_err();
        assert!(matches!(err, GpError::NoEnabledSymbols(_)));
    }

    #[test]
    fn test_missing_terminal_is_reported() {
        let mut grammar = Grammar::from_symbols(vec![
            Symbol::function(Arc::new(Sine)),
            Symbol::function(Arc::new(Cosine)),
            Symbol::variable("Variable", vec!["X"]),
        ])
        .unwrap();
        grammar.set_enabled("Variable", false).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let err = FullCreator.create(&mut rng, &grammar, 10, 3).unwrap_err();
        assert!(err.to_string().contains("no terminal symbols"), "{}", err);
    }

    #[test]
    fn test_constants_fall_inside_range() {
        let grammar = Grammar::from_symbols(vec![Symbol::constant("Constant", -2.0, 3.0)]).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..100 {
            match GrowCreator.create(&mut rng, &grammar, 5, 5).unwrap().root() {
                Node::Constant { value, .. } => assert!((-2.0..3.0).contains(value)),
                other => panic!("unexpected node {}", other),
            }
        }
    }
}
