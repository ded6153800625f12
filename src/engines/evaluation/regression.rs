use super::evaluator::{FitnessEvaluator, RowScorer};
use crate::tree::ExpressionTree;

/// Negative mean squared error.
///
/// A row whose prediction fails or is not finite adds an infinite error, so such a tree scores
/// `-inf` and loses every comparison against a tree that evaluates cleanly.
pub struct RegressionEvaluator {
    scorer: RowScorer,
}

impl RegressionEvaluator {
    pub fn new(scorer: RowScorer) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &RowScorer {
        &self.scorer
    }

    pub fn mean_squared_error(&self, tree: &ExpressionTree) -> f64 {
        let sse = self.scorer.sum_scores(tree, |prediction, target| match prediction {
            Ok(p) if p.is_finite() => {
                let diff = p - target;
                diff * diff
            }
            _ => f64::INFINITY,
        });
        sse / self.scorer.dataset().len() as f64
    }
}

impl FitnessEvaluator for RegressionEvaluator {
    fn name(&self) -> &'static str {
        "Regression"
    }

    fn evaluate(&self, tree: &ExpressionTree) -> f64 {
        let mse = self.mean_squared_error(tree);
        if mse.is_nan() {
            f64::NEG_INFINITY
        } else {
            -mse
        }
    }

    fn compiled_fallbacks(&self) -> u64 {
        self.scorer.fallbacks()
    }
}
