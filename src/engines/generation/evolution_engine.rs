use crate::config::{AppConfig, ConfigSection, EvolutionConfig, SelectionMethod};
use crate::engines::evaluation::FitnessEvaluator;
use crate::engines::generation::{
    creators::TreeCreator,
    crossover::Crossover,
    diversity::{DiversityValidator, PopulationDiversity},
    fitness_cache::FitnessCache,
    hall_of_fame::HallOfFame,
    mutation::Mutator,
    operators::{best_index, compare_fitness, RouletteSelector, Selector, TournamentSelector},
    progress::ProgressCallback,
};
use crate::error::{GpError, Result};
use crate::grammar::Grammar;
use crate::tree::ExpressionTree;
use crate::types::{GenerationMetrics, GenerationReport, RunResult, TerminationReason};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

/// Distinct-tree ratio below which a generation is reported as collapsed
const MIN_DISTINCT_RATIO: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Initializing,
    Evaluating,
    Reporting,
    Reproducing,
    Terminated,
}

/// Cooperative cancellation shared with other threads. Checked between generations only.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, AtomicOrdering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(AtomicOrdering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, AtomicOrdering::SeqCst);
    }
}

pub type StopPredicate = Box<dyn FnMut(&GenerationReport) -> bool + Send>;

struct Components {
    grammar: Arc<Grammar>,
    creator: Arc<dyn TreeCreator>,
    crossover: Arc<dyn Crossover>,
    mutator: Arc<dyn Mutator>,
    selector: Arc<dyn Selector>,
    evaluator: Arc<dyn FitnessEvaluator>,
}

/// Generational GP loop over expression trees.
///
/// Components are installed through the `with_*` builders; [`initialize`](Self::initialize)
/// refuses to start while any of them is missing.
pub struct EvolutionEngine {
    config: EvolutionConfig,
    grammar: Option<Arc<Grammar>>,
    creator: Option<Arc<dyn TreeCreator>>,
    crossover: Option<Arc<dyn Crossover>>,
    mutator: Option<Arc<dyn Mutator>>,
    selector: Option<Arc<dyn Selector>>,
    evaluator: Option<Arc<dyn FitnessEvaluator>>,
    rng: Option<StdRng>,
    stop_predicate: Option<StopPredicate>,
    stop: StopHandle,
    state: EngineState,
    generation: usize,
    population: Vec<ExpressionTree>,
    cache: FitnessCache,
    best: Option<(ExpressionTree, f64)>,
    hall_of_fame: HallOfFame,
    history: Vec<GenerationMetrics>,
    diversity_validator: DiversityValidator,
}

impl EvolutionEngine {
    /// Engine with no components. A configured seed installs a seeded random source.
    pub fn new(config: EvolutionConfig) -> Self {
        let rng = config.seed.map(StdRng::seed_from_u64);
        let hall_of_fame = HallOfFame::new(config.hall_of_fame_size);
        Self {
            config,
            grammar: None,
            creator: None,
            crossover: None,
            mutator: None,
            selector: None,
            evaluator: None,
            rng,
            stop_predicate: None,
            stop: StopHandle::default(),
            state: EngineState::Uninitialized,
            generation: 0,
            population: Vec::new(),
            cache: FitnessCache::new(),
            best: None,
            hall_of_fame,
            history: Vec::new(),
            diversity_validator: DiversityValidator::new(MIN_DISTINCT_RATIO),
        }
    }

    /// Fully wired engine: operators, selector and random source all come from `config`.
    pub fn from_app_config(
        config: &AppConfig,
        grammar: Arc<Grammar>,
        evaluator: Arc<dyn FitnessEvaluator>,
    ) -> Result<Self> {
        config.validate()?;
        let evolution = config.evolution.clone();
        let selector: Arc<dyn Selector> = match evolution.selection_method {
            SelectionMethod::Tournament => Arc::new(TournamentSelector::new(evolution.tournament_size)),
            SelectionMethod::Roulette => Arc::new(RouletteSelector),
        };
        let rng = match evolution.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self::new(evolution)
            .with_grammar(grammar)
            .with_creator(config.operators.build_creator())
            .with_crossover(config.operators.build_crossover())
            .with_mutator(config.operators.build_mutator()?)
            .with_selector(selector)
            .with_evaluator(evaluator)
            .with_rng(rng))
    }

    pub fn with_grammar(mut self, grammar: Arc<Grammar>) -> Self {
        self.grammar = Some(grammar);
        self
    }

    pub fn with_creator(mut self, creator: Arc<dyn TreeCreator>) -> Self {
        self.creator = Some(creator);
        self
    }

    pub fn with_crossover(mut self, crossover: Arc<dyn Crossover>) -> Self {
        self.crossover = Some(crossover);
        self
    }

    pub fn with_mutator(mut self, mutator: Arc<dyn Mutator>) -> Self {
        self.mutator = Some(mutator);
        self
    }

    pub fn with_selector(mut self, selector: Arc<dyn Selector>) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn FitnessEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Some(rng);
        self
    }

    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(StdRng::seed_from_u64(seed))
    }

    /// Called with every generation report; returning `true` ends the run.
    pub fn with_stop_predicate<F>(mut self, predicate: F) -> Self
    where
        F: FnMut(&GenerationReport) -> bool + Send + 'static,
    {
        self.stop_predicate = Some(Box::new(predicate));
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn population(&self) -> &[ExpressionTree] {
        &self.population
    }

    pub fn fitness_cache(&self) -> &FitnessCache {
        &self.cache
    }

    /// All-time best tree and its fitness.
    pub fn current_best(&self) -> Option<(&ExpressionTree, f64)> {
        self.best.as_ref().map(|(tree, fitness)| (tree, *fitness))
    }

    pub fn hall_of_fame(&self) -> &HallOfFame {
        &self.hall_of_fame
    }

    pub fn history(&self) -> &[GenerationMetrics] {
        &self.history
    }

    fn components(&self) -> Result<Components> {
        Ok(Components {
            grammar: self.grammar.clone().ok_or(GpError::MissingComponent("grammar"))?,
            creator: self.creator.clone().ok_or(GpError::MissingComponent("tree creator"))?,
            crossover: self.crossover.clone().ok_or(GpError::MissingComponent("crossover"))?,
            mutator: self.mutator.clone().ok_or(GpError::MissingComponent("mutator"))?,
            selector: self.selector.clone().ok_or(GpError::MissingComponent("selector"))?,
            evaluator: self.evaluator.clone().ok_or(GpError::MissingComponent("evaluator"))?,
        })
    }

    /// Checks every component and builds generation 0.
    pub fn initialize(&mut self) -> Result<()> {
        let parts = self.components()?;
        let rng = self.rng.as_mut().ok_or(GpError::MissingComponent("random source"))?;
        self.config.validate()?;
        parts.grammar.validate()?;

        self.state = EngineState::Initializing;
        self.generation = 0;
        self.cache.clear();
        self.best = None;
        self.hall_of_fame.clear();
        self.history.clear();

        let mut population = Vec::with_capacity(self.config.population_size);
        for _ in 0..self.config.population_size {
            population.push(parts.creator.create(
                rng,
                &parts.grammar,
                self.config.max_tree_length,
                self.config.max_tree_depth,
            )?);
        }
        self.population = population;

        log::info!(
            "Initialized population of {} trees with {} (length <= {}, depth <= {})",
            self.population.len(),
            parts.creator.name(),
            self.config.max_tree_length,
            self.config.max_tree_depth
        );
        Ok(())
    }

    /// Scores the current population and returns the generation report.
    pub fn evaluate(&mut self) -> Result<GenerationReport> {
        let evaluator = self.evaluator.clone().ok_or(GpError::MissingComponent("evaluator"))?;
        if self.population.is_empty() {
            return Err(GpError::Configuration(
                "population is empty; call initialize first".to_string(),
            ));
        }
        self.state = EngineState::Evaluating;
        self.cache.clear();

        let fitness: Vec<f64> = if self.config.parallel_evaluation {
            self.population.par_iter().map(|tree| evaluator.evaluate(tree)).collect()
        } else {
            self.population.iter().map(|tree| evaluator.evaluate(tree)).collect()
        };
        self.cache.store(self.generation, fitness);

        let values = self.cache.values();
        let best_idx = best_index(values)
            .ok_or_else(|| GpError::Configuration("population is empty".to_string()))?;
        let best_fitness = values[best_idx];
        let worst_fitness = values
            .iter()
            .copied()
            .min_by(|a, b| compare_fitness(*a, *b))
            .unwrap_or(f64::NAN);
        let average_fitness = evaluator.average(values);

        let improved = match &self.best {
            Some((_, previous)) => compare_fitness(best_fitness, *previous) == Ordering::Greater,
            None => true,
        };
        if improved {
            log::debug!(
                "Generation {}: new best {:.6} {}",
                self.generation + 1,
                best_fitness,
                self.population[best_idx]
            );
            self.best = Some((self.population[best_idx].clone(), best_fitness));
        }
        let best_so_far = self.best.as_ref().map_or(best_fitness, |(_, f)| *f);

        for (tree, &f) in self.population.iter().zip(self.cache.values()) {
            self.hall_of_fame.try_add(tree, f, self.generation);
        }

        let diversity = PopulationDiversity::measure(&self.population);
        if !self.diversity_validator.validate(&diversity) {
            log::warn!(
                "Generation {}: only {:.1}% of trees are distinct",
                self.generation + 1,
                diversity.distinct_ratio * 100.0
            );
        }

        let metrics = GenerationMetrics {
            generation: self.generation,
            best_fitness,
            average_fitness,
            worst_fitness,
            best_so_far,
            mean_length: diversity.mean_length,
            mean_depth: diversity.mean_depth,
            distinct_ratio: diversity.distinct_ratio,
        };
        self.history.push(metrics.clone());

        let best_tree = &self.population[best_idx];
        self.state = EngineState::Reporting;
        Ok(GenerationReport {
            metrics,
            best_tree: best_tree.to_string(),
            best_math: best_tree.to_math_string(),
            best_length: best_tree.length(),
            best_depth: best_tree.depth(),
        })
    }

    /// Replaces the population with the next generation: elites, elite offspring, then
    /// selected offspring.
    pub fn reproduce(&mut self) -> Result<()> {
        let parts = self.components()?;
        let rng = self.rng.as_mut().ok_or(GpError::MissingComponent("random source"))?;
        if self.cache.len() != self.population.len() {
            return Err(GpError::Configuration(
                "population must be evaluated before reproduction".to_string(),
            ));
        }
        self.state = EngineState::Reproducing;

        let size = self.config.population_size;
        let fitness = self.cache.values();
        let ranking = self.cache.ranking();
        let elite_count = self.config.elite_count.min(self.population.len());
        let mut next = Vec::with_capacity(size);

        for &i in ranking.iter().take(elite_count) {
            next.push(self.population[i].clone());
        }

        let breeding = if elite_count > 0 {
            self.config.elite_breeding_count()
        } else {
            0
        };
        for _ in 0..breeding {
            let a = ranking[rng.gen_range(0..elite_count)];
            let b = ranking[rng.gen_range(0..elite_count)];
            let mut child = parts.crossover.cross(rng, &parts.grammar, &self.population[a], &self.population[b])?;
            if rng.gen::<f64>() < self.config.mutation_probability * 0.5 {
                child = parts.mutator.mutate(rng, &parts.grammar, &child)?;
            }
            next.push(child);
        }

        let mut crossed = 0usize;
        let mut mutated_only = 0usize;
        while next.len() < size {
            if rng.gen::<f64>() < self.config.crossover_probability {
                let first = parts.selector.select(rng, fitness);
                let second = parts.selector.select(rng, fitness);
                let mut child = parts.crossover.cross(
                    rng,
                    &parts.grammar,
                    &self.population[first],
                    &self.population[second],
                )?;
                if rng.gen::<f64>() < self.config.mutation_probability {
                    child = parts.mutator.mutate(rng, &parts.grammar, &child)?;
                }
                crossed += 1;
                next.push(child);
            } else {
                let parent = parts.selector.select(rng, fitness);
                next.push(parts.mutator.mutate(rng, &parts.grammar, &self.population[parent])?);
                mutated_only += 1;
            }
        }
        next.truncate(size);

        log::debug!(
            "Generation {} reproduced: {} elites, {} elite offspring, {} crossovers, {} mutations",
            self.generation + 1,
            elite_count,
            breeding,
            crossed,
            mutated_only
        );

        self.population = next;
        self.cache.clear();
        self.generation += 1;
        Ok(())
    }

    /// Runs until `max_generations`, a stop request or the stop predicate.
    ///
    /// A stop requested before the call ends the run before the first evaluation.
    pub fn run<C: ProgressCallback>(&mut self, mut callback: C) -> Result<RunResult> {
        let started_at = Utc::now();
        self.initialize()?;

        let mut termination = TerminationReason::MaxGenerations;
        let mut final_best = f64::NAN;
        for generation in 0..self.config.max_generations {
            if self.stop.is_stopped() {
                termination = TerminationReason::StopRequested;
                break;
            }

            callback.on_generation_start(generation);
            let report = self.evaluate()?;
            final_best = report.metrics.best_fitness;
            callback.on_generation_complete(&report, self.hall_of_fame.len());

            if let Some(predicate) = self.stop_predicate.as_mut() {
                if predicate(&report) {
                    termination = TerminationReason::StopPredicate;
                    break;
                }
            }
            if generation + 1 == self.config.max_generations {
                break;
            }
            if self.stop.is_stopped() {
                termination = TerminationReason::StopRequested;
                break;
            }
            self.reproduce()?;
        }
        self.state = EngineState::Terminated;

        let (best_tree, best_math, best_fitness) = match &self.best {
            Some((tree, fitness)) => (tree.to_string(), tree.to_math_string(), *fitness),
            None => (String::new(), String::new(), f64::NAN),
        };
        let compiled_fallbacks = self.evaluator.as_ref().map_or(0, |e| e.compiled_fallbacks());
        let result = RunResult {
            best_tree,
            best_math,
            best_fitness,
            initial_best_fitness: self.history.first().map_or(f64::NAN, |m| m.best_fitness),
            final_best_fitness: final_best,
            generations_completed: self.history.len(),
            termination,
            history: self.history.clone(),
            hall_of_fame: self.hall_of_fame.records(),
            compiled_fallbacks,
            started_at,
            finished_at: Utc::now(),
        };

        log::info!(
            "Run finished after {} generations ({:?}); best fitness {:.6}: {}",
            result.generations_completed,
            result.termination,
            result.best_fitness,
            result.best_math
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::evaluation::{Dataset, EvaluatorMode, RegressionEvaluator, RowScorer};
    use crate::engines::generation::creators::GrowCreator;
    use crate::engines::generation::crossover::SubtreeCrossover;
    use crate::engines::generation::mutation::SubtreeMutator;
    use crate::engines::generation::progress::NullProgress;
    use crate::functions::primitives::{Addition, Multiplication, Subtraction};
    use crate::functions::symbol::Symbol;

    fn grammar() -> Arc<Grammar> {
        Arc::new(
            Grammar::from_symbols(vec![
                Symbol::function(Arc::new(Addition)),
                Symbol::function(Arc::new(Subtraction)),
                Symbol::function(Arc::new(Multiplication)),
                Symbol::variable("Variable", vec!["X"]),
            ])
            .unwrap(),
        )
    }

    fn evaluator() -> Arc<dyn FitnessEvaluator> {
        let xs: Vec<f64> = (0..20).map(|i| i as f64 / 4.0 - 2.5).collect();
        let inputs = xs.iter().map(|&x| vec![x]).collect();
        let targets = xs.iter().map(|&x| x * x + x).collect();
        let dataset = Dataset::new(inputs, targets, vec!["X"]).unwrap();
        Arc::new(RegressionEvaluator::new(RowScorer::new(dataset, EvaluatorMode::Interpreted, 1000)))
    }

    fn config() -> EvolutionConfig {
        EvolutionConfig {
            population_size: 20,
            max_generations: 5,
            max_tree_length: 15,
            max_tree_depth: 5,
            seed: Some(7),
            ..Default::default()
        }
    }

    fn engine() -> EvolutionEngine {
        EvolutionEngine::new(config())
            .with_grammar(grammar())
            .with_creator(Arc::new(GrowCreator))
            .with_crossover(Arc::new(SubtreeCrossover::default()))
            .with_mutator(Arc::new(SubtreeMutator::new(5, 3)))
            .with_selector(Arc::new(TournamentSelector::default()))
            .with_evaluator(evaluator())
    }

    #[test]
    fn test_missing_components_fail_fast() {
        let mut bare = EvolutionEngine::new(config());
        let err = bare.initialize().unwrap_err();
        assert!(matches!(err, GpError::MissingComponent("grammar")));

        let mut unseeded = EvolutionEngine::new(EvolutionConfig {
            seed: None,
            ..config()
        })
        .with_grammar(grammar())
        .with_creator(Arc::new(GrowCreator))
        .with_crossover(Arc::new(SubtreeCrossover::default()))
        .with_mutator(Arc::new(SubtreeMutator::new(5, 3)))
        .with_selector(Arc::new(TournamentSelector::default()))
        .with_evaluator(evaluator());
        let err = unseeded.initialize().unwrap_err();
        assert!(matches!(err, GpError::MissingComponent("random source")));
        assert_eq!(unseeded.state(), EngineState::Uninitialized);
    }

    #[test]
    fn test_state_transitions() {
        let mut engine = engine();
        assert_eq!(engine.state(), EngineState::Uninitialized);
        engine.initialize().unwrap();
        assert_eq!(engine.state(), EngineState::Initializing);
        assert_eq!(engine.population().len(), 20);

        engine.evaluate().unwrap();
        assert_eq!(engine.state(), EngineState::Reporting);
        assert_eq!(engine.fitness_cache().len(), 20);

        engine.reproduce().unwrap();
        assert_eq!(engine.state(), EngineState::Reproducing);
        assert_eq!(engine.generation(), 1);
        assert_eq!(engine.population().len(), 20);
        assert!(engine.fitness_cache().is_empty());
    }

    #[test]
    fn test_reproduce_requires_evaluation() {
        let mut engine = engine();
        engine.initialize().unwrap();
        assert!(engine.reproduce().is_err());
    }

    #[test]
    fn test_run_reports_every_generation() {
        let mut engine = engine();
        let result = engine.run(NullProgress).unwrap();
        assert_eq!(result.generations_completed, 5);
        assert_eq!(result.termination, TerminationReason::MaxGenerations);
        assert_eq!(engine.state(), EngineState::Terminated);
        assert_eq!(result.history.len(), 5);
        assert_eq!(result.initial_best_fitness, result.history[0].best_fitness);
        assert!(result.best_fitness >= result.initial_best_fitness);
        assert!(!result.best_tree.is_empty());
    }

    #[test]
    fn test_elite_breeding_fills_population() {
        let mut engine = EvolutionEngine::new(EvolutionConfig {
            elite_count: 3,
            elite_breeding_ratio: 0.5,
            ..config()
        })
        .with_grammar(grammar())
        .with_creator(Arc::new(GrowCreator))
        .with_crossover(Arc::new(SubtreeCrossover::default()))
        .with_mutator(Arc::new(SubtreeMutator::new(5, 3)))
        .with_selector(Arc::new(RouletteSelector))
        .with_evaluator(evaluator());
        engine.initialize().unwrap();
        engine.evaluate().unwrap();
        let elites: Vec<String> = engine
            .fitness_cache()
            .ranking()
            .iter()
            .take(3)
            .map(|&i| engine.population()[i].to_string())
            .collect();
        engine.reproduce().unwrap();
        assert_eq!(engine.population().len(), 20);
        let carried: Vec<String> = engine.population()[..3].iter().map(|t| t.to_string()).collect();
        assert_eq!(carried, elites);
    }
}
