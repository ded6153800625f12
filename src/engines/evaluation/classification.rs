use super::evaluator::{FitnessEvaluator, RowScorer};
use crate::tree::ExpressionTree;

/// Class label of a target value
fn is_positive(target: f64) -> bool {
    target >= 0.5
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Plain accuracy: an output at or above `threshold` predicts class 1, anything else class 0.
/// Failed or NaN outputs count as wrong.
pub struct ClassificationEvaluator {
    scorer: RowScorer,
    threshold: f64,
}

impl ClassificationEvaluator {
    pub fn new(scorer: RowScorer, threshold: f64) -> Self {
        Self { scorer, threshold }
    }

    pub fn scorer(&self) -> &RowScorer {
        &self.scorer
    }
}

impl FitnessEvaluator for ClassificationEvaluator {
    fn name(&self) -> &'static str {
        "Classification"
    }

    fn evaluate(&self, tree: &ExpressionTree) -> f64 {
        let threshold = self.threshold;
        let correct = self.scorer.sum_scores(tree, |prediction, target| match prediction {
            Ok(p) if !p.is_nan() && (p >= threshold) == is_positive(target) => 1.0,
            _ => 0.0,
        });
        correct / self.scorer.dataset().len() as f64
    }

    fn compiled_fallbacks(&self) -> u64 {
        self.scorer.fallbacks()
    }
}

/// Smooth classification score.
///
/// Each row earns `sigmoid(output)` for class 1 and `1 - sigmoid(output)` for class 0, so
/// trees that are "almost right" still rank above trees that are far off. The mean is reduced
/// by `parsimony_coefficient * tree length`.
pub struct ImprovedClassificationEvaluator {
    scorer: RowScorer,
    parsimony_coefficient: f64,
}

impl ImprovedClassificationEvaluator {
    pub fn new(scorer: RowScorer, parsimony_coefficient: f64) -> Self {
        Self {
            scorer,
            parsimony_coefficient,
        }
    }

    pub fn scorer(&self) -> &RowScorer {
        &self.scorer
    }
}

impl FitnessEvaluator for ImprovedClassificationEvaluator {
    fn name(&self) -> &'static str {
        "ImprovedClassification"
    }

    fn evaluate(&self, tree: &ExpressionTree) -> f64 {
        let total = self.scorer.sum_scores(tree, |prediction, target| match prediction {
            Ok(p) if !p.is_nan() => {
                let s = sigmoid(p);
                if is_positive(target) {
                    s
                } else {
                    1.0 - s
                }
            }
            _ => 0.0,
        });
        let mean = total / self.scorer.dataset().len() as f64;
        mean - self.parsimony_coefficient * tree.length() as f64
    }

    fn compiled_fallbacks(&self) -> u64 {
        self.scorer.fallbacks()
    }
}
