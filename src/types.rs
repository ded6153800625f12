use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Population statistics for one completed generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetrics {
    pub generation: usize,
    pub best_fitness: f64,
    pub average_fitness: f64, // finite values only, NaN when none are finite
    pub worst_fitness: f64,
    pub best_so_far: f64,
    pub mean_length: f64,
    pub mean_depth: f64,
    pub distinct_ratio: f64, // distinct renderings / population size
}

/// Payload of the generation-completed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub metrics: GenerationMetrics,
    pub best_tree: String,
    pub best_math: String,
    pub best_length: usize,
    pub best_depth: usize,
}

/// Hall-of-fame entry as plain data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EliteRecord {
    pub tree: String,
    pub math: String,
    pub fitness: f64,
    pub length: usize,
    pub depth: usize,
    pub generation: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    MaxGenerations,
    StopRequested,
    StopPredicate,
}

/// Outcome of a full run, detached from any live engine object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub best_tree: String,
    pub best_math: String,
    pub best_fitness: f64,
    pub initial_best_fitness: f64,
    pub final_best_fitness: f64,
    pub generations_completed: usize,
    pub termination: TerminationReason,
    pub history: Vec<GenerationMetrics>,
    pub hall_of_fame: Vec<EliteRecord>,
    pub compiled_fallbacks: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunResult {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
