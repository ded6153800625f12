use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use treegp::engines::generation::{FullCreator, GrowCreator, RampedHalfAndHalfCreator, TreeCreator, TreeValidator};
use treegp::functions::primitives::{Addition, Maximum, Negation, Sine, Subtraction};
use treegp::functions::Symbol;
use treegp::grammar::Grammar;
use treegp::tree::Node;
use treegp::GpError;

fn add_sub_grammar() -> Grammar {
    Grammar::from_symbols(vec![
        Symbol::function(Arc::new(Addition)),
        Symbol::function(Arc::new(Subtraction)),
        Symbol::variable("Variable", vec!["X", "Y"]),
    ])
    .unwrap()
}

fn mixed_grammar() -> Grammar {
    Grammar::from_symbols(vec![
        Symbol::function(Arc::new(Addition)),
        Symbol::function(Arc::new(Subtraction)),
        Symbol::function(Arc::new(Maximum)),
        Symbol::function(Arc::new(Negation)),
        Symbol::function(Arc::new(Sine)),
        Symbol::variable("Variable", vec!["X", "Y"]),
        Symbol::constant("Constant", -1.0, 1.0),
    ])
    .unwrap()
}

fn creators() -> Vec<Box<dyn TreeCreator>> {
    vec![
        Box::new(GrowCreator),
        Box::new(FullCreator),
        Box::new(RampedHalfAndHalfCreator),
    ]
}

#[test]
fn single_node_budget_yields_one_terminal() {
    let grammar = add_sub_grammar();
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..50 {
        let tree = GrowCreator.create(&mut rng, &grammar, 1, 1).unwrap();
        assert_eq!(tree.length(), 1);
        match tree.root() {
            Node::Variable { name, .. } => assert!(name == "X" || name == "Y"),
            other => panic!("expected a variable, got {}", other),
        }
    }
}

#[test]
fn grammar_without_terminals_is_reported() {
    let grammar = Grammar::from_symbols(vec![
        Symbol::function(Arc::new(Addition)),
        Symbol::function(Arc::new(Subtraction)),
    ])
    .unwrap();
    assert!(grammar.validate().is_err());
    let err = GrowCreator
        .create(&mut StdRng::seed_from_u64(0), &grammar, 10, 4)
        .unwrap_err();
    assert!(matches!(err, GpError::NoTerminalSymbols(_)), "{}", err);
}

#[test]
fn disabled_symbols_are_never_used() {
    let mut grammar = mixed_grammar();
    grammar.set_enabled("Sine", false).unwrap();
    grammar.set_enabled("Constant", false).unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..100 {
        let tree = RampedHalfAndHalfCreator.create(&mut rng, &grammar, 20, 6).unwrap();
        assert!(tree
            .iter_prefix()
            .all(|n| n.symbol().name() != "Sine" && n.symbol().name() != "Constant"));
    }
}

proptest! {
    #[test]
    fn created_trees_respect_bounds_and_arity(
        seed in any::<u64>(),
        max_length in 1usize..40,
        max_depth in 1usize..8,
    ) {
        let grammar = mixed_grammar();
        let validator = TreeValidator::with_bounds(&grammar, max_length, max_depth);
        let mut rng = StdRng::seed_from_u64(seed);
        for creator in creators() {
            let tree = creator.create(&mut rng, &grammar, max_length, max_depth).unwrap();
            prop_assert!(tree.length() <= max_length);
            prop_assert!(tree.depth() <= max_depth);
            if max_length == 1 || max_depth == 1 {
                prop_assert_eq!(tree.length(), 1);
            }
            prop_assert!(validator.validate(&tree).is_ok(), "{} rejected: {}", creator.name(), tree);
        }
    }
}
