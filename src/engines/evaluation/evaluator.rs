use super::bindings::BindingPool;
use super::classification::{ClassificationEvaluator, ImprovedClassificationEvaluator};
use super::compiler::{CompiledExpression, Compiler};
use super::dataset::Dataset;
use super::interpreter::Interpreter;
use super::regression::RegressionEvaluator;
use crate::config::{ConfigSection, EvaluationConfig, ProblemKind};
use crate::error::{EvalError, Result};
use crate::tree::ExpressionTree;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Rows scored per unit of parallel work. Partial sums are combined in chunk order, so the
/// result does not depend on the number of threads.
pub const ROW_CHUNK_SIZE: usize = 256;

/// Scores a tree; higher is better.
pub trait FitnessEvaluator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Never fails: rows that cannot be evaluated count as worst case.
    fn evaluate(&self, tree: &ExpressionTree) -> f64;

    /// Mean used for generation reports. Non-finite values are left out.
    fn average(&self, values: &[f64]) -> f64 {
        finite_mean(values)
    }

    /// Times a compiled evaluation fell back to the interpreter
    fn compiled_fallbacks(&self) -> u64 {
        0
    }
}

pub fn finite_mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EvaluatorMode {
    #[default]
    Interpreted,
    Compiled,
}

enum Prepared {
    Compiled(CompiledExpression),
    Interpreted,
}

/// Row-wise evaluation shared by the dataset-bound evaluators.
pub struct RowScorer {
    dataset: Dataset,
    mode: EvaluatorMode,
    parallel_row_threshold: usize,
    compiler: Compiler,
    pool: BindingPool,
    fallbacks: AtomicU64,
}

impl RowScorer {
    pub fn new(dataset: Dataset, mode: EvaluatorMode, parallel_row_threshold: usize) -> Self {
        let compiler = Compiler::new(dataset.variable_names());
        Self {
            dataset,
            mode,
            parallel_row_threshold: parallel_row_threshold.max(1),
            compiler,
            pool: BindingPool::new(),
            fallbacks: AtomicU64::new(0),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn mode(&self) -> EvaluatorMode {
        self.mode
    }

    pub fn parallel_row_threshold(&self) -> usize {
        self.parallel_row_threshold
    }

    pub fn fallbacks(&self) -> u64 {
        self.fallbacks.load(Ordering::Relaxed)
    }

    pub fn pool(&self) -> &BindingPool {
        &self.pool
    }

    fn prepare(&self, tree: &ExpressionTree) -> Prepared {
        match self.mode {
            EvaluatorMode::Interpreted => Prepared::Interpreted,
            EvaluatorMode::Compiled => match self.compiler.compile(tree) {
                Ok(compiled) => Prepared::Compiled(compiled),
                Err(err) => {
                    let total = self.fallbacks.fetch_add(1, Ordering::Relaxed) + 1;
                    log::warn!(
                        "compiling {} failed ({}), interpreting instead ({} fallbacks so far)",
                        tree,
                        err,
                        total
                    );
                    Prepared::Interpreted
                }
            },
        }
    }

    /// Raw tree outputs for every row, in row order.
    pub fn predict(&self, tree: &ExpressionTree) -> Vec<std::result::Result<f64, EvalError>> {
        let prepared = self.prepare(tree);
        let mut out = Vec::with_capacity(self.dataset.len());
        self.for_each_row(&prepared, tree, 0..self.dataset.len(), |prediction, _| {
            out.push(prediction);
        });
        out
    }

    /// Sum of `score(prediction, target)` over all rows.
    pub fn sum_scores<F>(&self, tree: &ExpressionTree, score: F) -> f64
    where
        F: Fn(std::result::Result<f64, EvalError>, f64) -> f64 + Sync,
    {
        let prepared = self.prepare(tree);
        let rows = self.dataset.len();
        let chunks = rows.div_ceil(ROW_CHUNK_SIZE);
        let chunk_sum = |chunk: usize| {
            let start = chunk * ROW_CHUNK_SIZE;
            let end = (start + ROW_CHUNK_SIZE).min(rows);
            let mut sum = 0.0;
            self.for_each_row(&prepared, tree, start..end, |prediction, target| {
                sum += score(prediction, target);
            });
            sum
        };

        let partials: Vec<f64> = if rows >= self.parallel_row_threshold {
            (0..chunks).into_par_iter().map(chunk_sum).collect()
        } else {
            (0..chunks).map(chunk_sum).collect()
        };
        partials.iter().sum()
    }

    fn for_each_row<F>(
        &self,
        prepared: &Prepared,
        tree: &ExpressionTree,
        rows: std::ops::Range<usize>,
        mut visit: F,
    ) where
        F: FnMut(std::result::Result<f64, EvalError>, f64),
    {
        let inputs = self.dataset.inputs();
        let targets = self.dataset.targets();
        match prepared {
            Prepared::Compiled(compiled) => {
                for row in rows {
                    visit(compiled.evaluate(&inputs[row]), targets[row]);
                }
            }
            Prepared::Interpreted => {
                // One pooled binding set per chunk, rebound for each row
                let mut bindings = self.pool.acquire();
                let names = self.dataset.variable_names();
                for row in rows {
                    bindings.bind_row(names, &inputs[row]);
                    visit(Interpreter.evaluate(tree, &bindings), targets[row]);
                }
            }
        }
    }
}

/// Evaluator for the configured problem, bound to `dataset`.
pub fn build_evaluator(config: &EvaluationConfig, dataset: Dataset) -> Result<Arc<dyn FitnessEvaluator>> {
    config.validate()?;
    let scorer = RowScorer::new(dataset, config.mode, config.effective_parallel_row_threshold());
    let evaluator: Arc<dyn FitnessEvaluator> = match config.problem {
        ProblemKind::Regression => Arc::new(RegressionEvaluator::new(scorer)),
        ProblemKind::Classification => Arc::new(ClassificationEvaluator::new(
            scorer,
            config.classification_threshold,
        )),
        ProblemKind::ImprovedClassification => Arc::new(ImprovedClassificationEvaluator::new(
            scorer,
            config.parsimony_coefficient,
        )),
    };
    log::debug!(
        "built {} evaluator ({:?} mode, parallel from {} rows)",
        evaluator.name(),
        config.mode,
        config.effective_parallel_row_threshold()
    );
    Ok(evaluator)
}
