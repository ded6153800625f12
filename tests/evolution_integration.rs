use std::sync::mpsc;
use std::sync::Arc;
use treegp::config::{AppConfig, EvaluationConfig, GrammarConfig, SelectionMethod};
use treegp::engines::evaluation::{build_evaluator, Dataset, EvaluatorMode, FitnessEvaluator};
use treegp::engines::generation::{
    ChannelProgressCallback, EvolutionEngine, NullProgress, ProgressCallback, ProgressMessage, StopHandle,
    TreeValidator,
};
use treegp::grammar::Grammar;
use treegp::{GenerationReport, GpError, RunResult, TerminationReason};

/// Records what the engine reports
#[derive(Default)]
struct TestProgressCallback {
    started: Vec<usize>,
    best: Vec<f64>,
    stop_after: Option<(usize, StopHandle)>,
}

impl ProgressCallback for TestProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        self.started.push(generation);
    }

    fn on_generation_complete(&mut self, report: &GenerationReport, _hall_size: usize) {
        self.best.push(report.metrics.best_fitness);
        if let Some((generation, handle)) = &self.stop_after {
            if report.metrics.generation == *generation {
                handle.stop();
            }
        }
    }
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Samples of x^2 + x
fn dataset() -> Dataset {
    let xs: Vec<f64> = (0..=30).map(|i| -1.5 + i as f64 * 0.1).collect();
    let inputs = xs.iter().map(|&x| vec![x]).collect();
    let targets = xs.iter().map(|&x| x * x + x).collect();
    Dataset::new(inputs, targets, vec!["X"]).unwrap()
}

fn test_config(seed: u64) -> AppConfig {
    let mut config = AppConfig::default();
    config.evolution.population_size = 40;
    config.evolution.max_generations = 8;
    config.evolution.max_tree_length = 20;
    config.evolution.max_tree_depth = 6;
    config.evolution.elite_count = 1;
    config.evolution.tournament_size = 3;
    config.evolution.seed = Some(seed);
    config
}

fn grammar_and_evaluator(config: &AppConfig) -> (Arc<Grammar>, Arc<dyn FitnessEvaluator>) {
    let data = dataset();
    let grammar = config.grammar.build(data.variable_names()).unwrap();
    let evaluator = build_evaluator(&config.evaluation, data).unwrap();
    (Arc::new(grammar), evaluator)
}

fn run(config: &AppConfig) -> RunResult {
    let (grammar, evaluator) = grammar_and_evaluator(config);
    let mut engine = EvolutionEngine::from_app_config(config, grammar, evaluator).unwrap();
    engine.run(NullProgress).unwrap()
}

#[test]
fn test_same_seed_same_trajectory() {
    init_logger();
    let mut config = test_config(42);
    config.evolution.elite_breeding_ratio = 0.2;

    let first = run(&config);
    let second = run(&config);
    let best = |r: &RunResult| r.history.iter().map(|m| m.best_fitness.to_bits()).collect::<Vec<_>>();
    assert_eq!(best(&first), best(&second));
    assert_eq!(first.best_tree, second.best_tree);

    // Parallel and sequential evaluation walk the same path
    config.evolution.parallel_evaluation = false;
    let sequential = run(&config);
    assert_eq!(best(&first), best(&sequential));
}

#[test]
fn test_best_so_far_never_decreases() {
    init_logger();
    for method in [SelectionMethod::Tournament, SelectionMethod::Roulette] {
        let mut config = test_config(7);
        config.evolution.selection_method = method;
        let result = run(&config);

        assert_eq!(result.generations_completed, 8);
        assert_eq!(result.termination, TerminationReason::MaxGenerations);
        for pair in result.history.windows(2) {
            assert!(pair[1].best_so_far >= pair[0].best_so_far, "{:?}", method);
        }
        assert_eq!(result.best_fitness, result.history.last().unwrap().best_so_far);
        assert!(result.best_fitness >= result.initial_best_fitness);
        assert!(!result.hall_of_fame.is_empty());
        assert!(result.hall_of_fame.windows(2).all(|w| w[0].fitness >= w[1].fitness));
    }
}

#[test]
fn test_population_stays_within_grammar_bounds() {
    init_logger();
    let mut config = test_config(5);
    config.grammar.max_length = 20;
    config.grammar.max_depth = 5;
    config.evolution.max_tree_length = 20;
    config.evolution.max_tree_depth = 5;
    config.evolution.max_generations = 40;
    config.evolution.mutation_probability = 0.6;
    config.evolution.elite_breeding_ratio = 0.2;
    config.operators.mutation_max_length = 15;
    config.operators.mutation_max_depth = 4;

    let (grammar, evaluator) = grammar_and_evaluator(&config);
    let mut engine = EvolutionEngine::from_app_config(&config, Arc::clone(&grammar), evaluator).unwrap();
    engine.initialize().unwrap();
    let validator = TreeValidator::new(&grammar);

    for _ in 0..config.evolution.max_generations {
        engine.evaluate().unwrap();
        engine.reproduce().unwrap();
        for tree in engine.population() {
            validator.validate(tree).unwrap();
        }
    }
}

#[test]
fn test_elite_survives_into_next_generation() {
    init_logger();
    let config = test_config(3);
    let (grammar, evaluator) = grammar_and_evaluator(&config);
    let mut engine = EvolutionEngine::from_app_config(&config, grammar, evaluator).unwrap();
    engine.initialize().unwrap();

    for _ in 0..5 {
        let report = engine.evaluate().unwrap();
        engine.reproduce().unwrap();
        assert!(
            engine.population().iter().any(|t| t.to_string() == report.best_tree),
            "best tree {} missing from generation {}",
            report.best_tree,
            engine.generation()
        );
    }
}

#[test]
fn test_stop_predicate_ends_run() {
    init_logger();
    let config = test_config(11);
    let (grammar, evaluator) = grammar_and_evaluator(&config);
    let mut engine = EvolutionEngine::from_app_config(&config, grammar, evaluator)
        .unwrap()
        .with_stop_predicate(|report| report.metrics.generation >= 2);
    let mut progress = TestProgressCallback::default();
    let result = engine.run(&mut progress).unwrap();

    assert_eq!(result.termination, TerminationReason::StopPredicate);
    assert_eq!(result.generations_completed, 3);
    assert_eq!(progress.started, vec![0, 1, 2]);
    assert_eq!(progress.best.len(), 3);
}

#[test]
fn test_stop_handle_is_honoured_between_generations() {
    init_logger();
    let config = test_config(13);
    let (grammar, evaluator) = grammar_and_evaluator(&config);
    let mut engine = EvolutionEngine::from_app_config(&config, grammar, evaluator).unwrap();
    let mut progress = TestProgressCallback {
        stop_after: Some((1, engine.stop_handle())),
        ..Default::default()
    };
    let result = engine.run(&mut progress).unwrap();

    assert_eq!(result.termination, TerminationReason::StopRequested);
    assert_eq!(result.generations_completed, 2);
}

#[test]
fn test_channel_progress_reports_each_generation() {
    init_logger();
    let config = test_config(17);
    let (grammar, evaluator) = grammar_and_evaluator(&config);
    let mut engine = EvolutionEngine::from_app_config(&config, grammar, evaluator).unwrap();
    let (sender, receiver) = mpsc::channel();
    engine.run(ChannelProgressCallback::new(sender)).unwrap();

    let completed: Vec<GenerationReport> = receiver
        .try_iter()
        .filter_map(|message| match message {
            ProgressMessage::GenerationComplete { report, .. } => Some(report),
            ProgressMessage::GenerationStart(_) => None,
        })
        .collect();
    assert_eq!(completed.len(), 8);
    assert!(completed.iter().enumerate().all(|(i, r)| r.metrics.generation == i));
}

#[test]
fn test_missing_components_are_named() {
    init_logger();
    let config = test_config(1);
    let mut engine = EvolutionEngine::new(config.evolution.clone());
    match engine.run(NullProgress) {
        Err(GpError::MissingComponent(name)) => assert_eq!(name, "grammar"),
        other => panic!("expected a missing component error, got {:?}", other.map(|r| r.best_tree)),
    }
}

#[test]
fn test_compiled_mode_runs_without_fallbacks() {
    init_logger();
    let mut config = test_config(5);
    config.evaluation = EvaluationConfig {
        mode: EvaluatorMode::Compiled,
        parallel_row_threshold: 8,
        ..Default::default()
    };
    config.grammar = GrammarConfig {
        functions: vec!["Addition".into(), "Multiplication".into(), "Sine".into()],
        ..Default::default()
    };
    let result = run(&config);
    assert_eq!(result.compiled_fallbacks, 0);
    assert!(result.to_json().unwrap().contains("\"termination\": \"MaxGenerations\""));
}
