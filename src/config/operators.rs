use super::traits::{check_at_least, check_probability, ConfigManifest, ConfigSection, FieldManifest};
use crate::engines::generation::creators::{FullCreator, GrowCreator, RampedHalfAndHalfCreator, TreeCreator};
use crate::engines::generation::crossover::{Crossover, OnePointCrossover, SubtreeCrossover, UniformCrossover};
use crate::engines::generation::mutation::{
    ChangeNodeTypeMutator, ChangeTerminalMutator, MultiMutator, Mutator, SubtreeMutator,
};
use crate::error::{GpError, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreatorKind {
    Grow,
    Full,
    RampedHalfAndHalf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrossoverKind {
    Subtree,
    OnePoint,
    Uniform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutatorKind {
    Subtree,
    ChangeNodeType,
    ChangeTerminal,
    /// One of the three above, chosen per call
    Multi,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    pub creator: CreatorKind,
    pub crossover: CrossoverKind,
    pub swap_probability: f64,
    pub internal_crossover_probability: f64,
    pub mutator: MutatorKind,
    pub mutation_max_length: usize,
    pub mutation_max_depth: usize,
    pub constant_shift_range: f64,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            creator: CreatorKind::RampedHalfAndHalf,
            crossover: CrossoverKind::Subtree,
            swap_probability: 0.1,
            internal_crossover_probability: 0.9,
            mutator: MutatorKind::Multi,
            mutation_max_length: 15,
            mutation_max_depth: 4,
            constant_shift_range: 1.0,
        }
    }
}

impl OperatorConfig {
    pub fn build_creator(&self) -> Arc<dyn TreeCreator> {
        match self.creator {
            CreatorKind::Grow => Arc::new(GrowCreator),
            CreatorKind::Full => Arc::new(FullCreator),
            CreatorKind::RampedHalfAndHalf => Arc::new(RampedHalfAndHalfCreator),
        }
    }

    pub fn build_crossover(&self) -> Arc<dyn Crossover> {
        match self.crossover {
            CrossoverKind::Subtree => Arc::new(SubtreeCrossover {
                internal_node_probability: self.internal_crossover_probability,
            }),
            CrossoverKind::OnePoint => Arc::new(OnePointCrossover),
            CrossoverKind::Uniform => Arc::new(UniformCrossover {
                swap_probability: self.swap_probability,
            }),
        }
    }

    pub fn build_mutator(&self) -> Result<Arc<dyn Mutator>> {
        let subtree = || SubtreeMutator::new(self.mutation_max_length, self.mutation_max_depth);
        let change_terminal = || ChangeTerminalMutator {
            shift_range: self.constant_shift_range,
        };
        let mutator: Arc<dyn Mutator> = match self.mutator {
            MutatorKind::Subtree => Arc::new(subtree()),
            MutatorKind::ChangeNodeType => Arc::new(ChangeNodeTypeMutator),
            MutatorKind::ChangeTerminal => Arc::new(change_terminal()),
            MutatorKind::Multi => {
                let members: Vec<Box<dyn Mutator>> = vec![
                    Box::new(subtree()),
                    Box::new(ChangeNodeTypeMutator),
                    Box::new(change_terminal()),
                ];
                Arc::new(MultiMutator::new(members)?)
            }
        };
        Ok(mutator)
    }
}

impl ConfigSection for OperatorConfig {
    fn section_name() -> &'static str {
        "operators"
    }

    fn validate(&self) -> Result<()> {
        check_probability("swap_probability", self.swap_probability)?;
        check_probability("internal_crossover_probability", self.internal_crossover_probability)?;
        check_at_least("mutation_max_length", self.mutation_max_length, 1)?;
        check_at_least("mutation_max_depth", self.mutation_max_depth, 1)?;
        if !self.constant_shift_range.is_finite() || self.constant_shift_range < 0.0 {
            return Err(GpError::Configuration(format!(
                "constant_shift_range must be finite and non-negative, got {}",
                self.constant_shift_range
            )));
        }
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        ConfigManifest {
            section: "Operators".to_string(),
            fields: vec![
                FieldManifest::new(
                    "creator",
                    "enum",
                    json!("RampedHalfAndHalf"),
                    None,
                    "Grow, Full or RampedHalfAndHalf",
                ),
                FieldManifest::new("crossover", "enum", json!("Subtree"), None, "Subtree, OnePoint or Uniform"),
                FieldManifest::new(
                    "swap_probability",
                    "float",
                    json!(0.1),
                    Some((0.0, 1.0)),
                    "Per-node swap chance for uniform crossover",
                ),
                FieldManifest::new(
                    "internal_crossover_probability",
                    "float",
                    json!(0.9),
                    Some((0.0, 1.0)),
                    "Chance that subtree crossover cuts at a function node",
                ),
                FieldManifest::new(
                    "mutator",
                    "enum",
                    json!("Multi"),
                    None,
                    "Subtree, ChangeNodeType, ChangeTerminal or Multi",
                ),
                FieldManifest::new(
                    "mutation_max_length",
                    "integer",
                    json!(15),
                    Some((1.0, 1_000.0)),
                    "Node budget of a fragment grown by subtree mutation",
                ),
                FieldManifest::new(
                    "mutation_max_depth",
                    "integer",
                    json!(4),
                    Some((1.0, 100.0)),
                    "Depth budget of a fragment grown by subtree mutation",
                ),
                FieldManifest::new(
                    "constant_shift_range",
                    "float",
                    json!(1.0),
                    Some((0.0, f64::MAX)),
                    "Largest shift applied to a constant by terminal mutation",
                ),
            ],
        }
    }
}
