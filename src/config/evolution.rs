use super::traits::{check_at_least, check_probability, ConfigManifest, ConfigSection, FieldManifest};
use crate::error::{GpError, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub max_generations: usize,
    pub max_tree_length: usize,
    pub max_tree_depth: usize,
    pub crossover_probability: f64,
    pub mutation_probability: f64,
    pub elite_count: usize,
    pub elite_breeding_ratio: f64,
    pub tournament_size: usize,
    pub selection_method: SelectionMethod,
    pub hall_of_fame_size: usize,
    pub parallel_evaluation: bool,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionMethod {
    Tournament,
    Roulette,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 50,
            max_tree_length: 50,
            max_tree_depth: 10,
            crossover_probability: 0.9,
            mutation_probability: 0.15,
            elite_count: 1,
            elite_breeding_ratio: 0.0,
            tournament_size: 4,
            selection_method: SelectionMethod::Tournament,
            hall_of_fame_size: 10,
            parallel_evaluation: true,
            seed: None,
        }
    }
}

impl EvolutionConfig {
    /// Individuals produced by crossing elites, capped by the room left after elitism
    pub fn elite_breeding_count(&self) -> usize {
        let requested = (self.population_size as f64 * self.elite_breeding_ratio).floor() as usize;
        requested.min(self.population_size.saturating_sub(self.elite_count))
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<()> {
        check_at_least("population_size", self.population_size, 1)?;
        check_at_least("max_generations", self.max_generations, 1)?;
        check_at_least("max_tree_length", self.max_tree_length, 1)?;
        check_at_least("max_tree_depth", self.max_tree_depth, 1)?;
        check_at_least("tournament_size", self.tournament_size, 1)?;
        check_probability("crossover_probability", self.crossover_probability)?;
        check_probability("mutation_probability", self.mutation_probability)?;
        check_probability("elite_breeding_ratio", self.elite_breeding_ratio)?;
        if self.elite_count > self.population_size {
            return Err(GpError::Configuration(format!(
                "elite_count ({}) exceeds population_size ({})",
                self.elite_count, self.population_size
            )));
        }
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        ConfigManifest {
            section: "Evolution".to_string(),
            fields: vec![
                FieldManifest::new(
                    "population_size",
                    "integer",
                    json!(100),
                    Some((1.0, 100_000.0)),
                    "Number of trees in the population",
                ),
                FieldManifest::new(
                    "max_generations",
                    "integer",
                    json!(50),
                    Some((1.0, 100_000.0)),
                    "Generations to run unless stopped earlier",
                ),
                FieldManifest::new(
                    "max_tree_length",
                    "integer",
                    json!(50),
                    Some((1.0, 10_000.0)),
                    "Node budget for initial trees",
                ),
                FieldManifest::new(
                    "max_tree_depth",
                    "integer",
                    json!(10),
                    Some((1.0, 100.0)),
                    "Depth budget for initial trees",
                ),
                FieldManifest::new(
                    "crossover_probability",
                    "float",
                    json!(0.9),
                    Some((0.0, 1.0)),
                    "Chance that an offspring comes from crossover rather than mutation only",
                ),
                FieldManifest::new(
                    "mutation_probability",
                    "float",
                    json!(0.15),
                    Some((0.0, 1.0)),
                    "Chance that a crossover offspring is also mutated",
                ),
                FieldManifest::new(
                    "elite_count",
                    "integer",
                    json!(1),
                    Some((0.0, 100_000.0)),
                    "Best trees copied unchanged into the next generation",
                ),
                FieldManifest::new(
                    "elite_breeding_ratio",
                    "float",
                    json!(0.0),
                    Some((0.0, 1.0)),
                    "Share of the population bred from elites only",
                ),
                FieldManifest::new(
                    "tournament_size",
                    "integer",
                    json!(4),
                    Some((1.0, 1_000.0)),
                    "Contestants per tournament",
                ),
                FieldManifest::new(
                    "selection_method",
                    "enum",
                    json!("Tournament"),
                    None,
                    "Tournament or Roulette",
                ),
                FieldManifest::new(
                    "hall_of_fame_size",
                    "integer",
                    json!(10),
                    Some((0.0, 10_000.0)),
                    "Distinct best trees kept over the run",
                ),
                FieldManifest::new(
                    "parallel_evaluation",
                    "bool",
                    json!(true),
                    None,
                    "Evaluate individuals in parallel",
                ),
                FieldManifest::new(
                    "seed",
                    "integer",
                    serde_json::Value::Null,
                    None,
                    "Random seed; unset draws one from the OS",
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EvolutionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let config = EvolutionConfig {
            elite_count: 12,
            population_size: 10,
            ..Default::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("elite_count (12) exceeds population_size (10)"), "{}", err);

        let config = EvolutionConfig {
            mutation_probability: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EvolutionConfig {
            population_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_elite_breeding_count_is_capped() {
        let config = EvolutionConfig {
            population_size: 10,
            elite_count: 8,
            elite_breeding_ratio: 0.5,
            ..Default::default()
        };
        assert_eq!(config.elite_breeding_count(), 2);
    }

    #[test]
    fn test_manifest_lists_every_field() {
        let config = EvolutionConfig::default();
        let manifest = config.to_manifest();
        let serialized = serde_json::to_value(&config).unwrap();
        let fields = serialized.as_object().unwrap();
        assert_eq!(manifest.fields.len(), fields.len());
        for name in fields.keys() {
            assert!(manifest.field(name).is_some(), "missing {}", name);
        }
    }
}
