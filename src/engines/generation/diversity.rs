use crate::tree::ExpressionTree;
use std::collections::HashSet;

/// Structural spread of a population
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationDiversity {
    pub distinct_ratio: f64,
    pub mean_length: f64,
    pub mean_depth: f64,
}

impl PopulationDiversity {
    pub fn measure(population: &[ExpressionTree]) -> Self {
        if population.is_empty() {
            return Self {
                distinct_ratio: 0.0,
                mean_length: 0.0,
                mean_depth: 0.0,
            };
        }

        let n = population.len() as f64;
        let distinct: HashSet<String> = population.iter().map(|t| t.to_string()).collect();
        let total_length: usize = population.iter().map(ExpressionTree::length).sum();
        let total_depth: usize = population.iter().map(ExpressionTree::depth).sum();

        Self {
            distinct_ratio: distinct.len() as f64 / n,
            mean_length: total_length as f64 / n,
            mean_depth: total_depth as f64 / n,
        }
    }
}

/// Flags populations whose distinct-tree ratio has collapsed below a floor.
pub struct DiversityValidator {
    min_distinct_ratio: f64,
}

impl DiversityValidator {
    pub fn new(min_distinct_ratio: f64) -> Self {
        Self { min_distinct_ratio }
    }

    pub fn validate(&self, diversity: &PopulationDiversity) -> bool {
        diversity.distinct_ratio >= self.min_distinct_ratio
    }
}
