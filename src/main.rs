use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use treegp::config::ConfigManager;
use treegp::engines::evaluation::{build_evaluator, Dataset};
use treegp::engines::generation::{ConsoleProgressCallback, EvolutionEngine};

/// Samples of `x^2 + x` on [-2, 2]
fn demo_dataset() -> treegp::Result<Dataset> {
    let xs: Vec<f64> = (0..=40).map(|i| -2.0 + i as f64 * 0.1).collect();
    let inputs = xs.iter().map(|&x| vec![x]).collect();
    let targets = xs.iter().map(|&x| x * x + x).collect();
    Dataset::new(inputs, targets, vec!["X"])
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let manager = ConfigManager::new();
    manager
        .load_layered(config_path.as_deref(), "TREEGP")
        .context("failed to load configuration")?;
    let config = manager.get()?;

    let dataset = demo_dataset()?;
    let grammar = config
        .grammar
        .build(dataset.variable_names())
        .context("failed to build grammar")?;
    let evaluator = build_evaluator(&config.evaluation, dataset)?;

    let mut engine = EvolutionEngine::from_app_config(&config, Arc::new(grammar), evaluator)?;
    let result = engine.run(ConsoleProgressCallback)?;

    println!("{}", result.to_json()?);
    Ok(())
}
