use super::traits::{ConfigManifest, ConfigSection, FieldManifest};
use crate::engines::evaluation::EvaluatorMode;
use crate::error::{GpError, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProblemKind {
    Regression,
    Classification,
    ImprovedClassification,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub problem: ProblemKind,
    pub mode: EvaluatorMode,
    pub parallel_row_threshold: usize,
    pub parsimony_coefficient: f64,
    pub classification_threshold: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            problem: ProblemKind::Regression,
            mode: EvaluatorMode::Interpreted,
            parallel_row_threshold: 1000,
            parsimony_coefficient: 0.001,
            classification_threshold: 0.5,
        }
    }
}

impl EvaluationConfig {
    /// Row count from which rows are scored in parallel; 0 is treated as 1
    pub fn effective_parallel_row_threshold(&self) -> usize {
        self.parallel_row_threshold.max(1)
    }
}

impl ConfigSection for EvaluationConfig {
    fn section_name() -> &'static str {
        "evaluation"
    }

    fn validate(&self) -> Result<()> {
        if !self.parsimony_coefficient.is_finite() || self.parsimony_coefficient < 0.0 {
            return Err(GpError::Configuration(format!(
                "parsimony_coefficient must be finite and non-negative, got {}",
                self.parsimony_coefficient
            )));
        }
        if !self.classification_threshold.is_finite() {
            return Err(GpError::Configuration(format!(
                "classification_threshold must be finite, got {}",
                self.classification_threshold
            )));
        }
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        ConfigManifest {
            section: "Evaluation".to_string(),
            fields: vec![
                FieldManifest::new(
                    "problem",
                    "enum",
                    json!("Regression"),
                    None,
                    "Regression, Classification or ImprovedClassification",
                ),
                FieldManifest::new("mode", "enum", json!("Interpreted"), None, "Interpreted or Compiled"),
                FieldManifest::new(
                    "parallel_row_threshold",
                    "integer",
                    json!(1000),
                    Some((1.0, f64::MAX)),
                    "Datasets with at least this many rows are scored in parallel",
                ),
                FieldManifest::new(
                    "parsimony_coefficient",
                    "float",
                    json!(0.001),
                    Some((0.0, f64::MAX)),
                    "Penalty per node for improved classification",
                ),
                FieldManifest::new(
                    "classification_threshold",
                    "float",
                    json!(0.5),
                    None,
                    "Outputs at or above this value predict class 1",
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_threshold_clamps_to_one() {
        let config = EvaluationConfig {
            parallel_row_threshold: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.effective_parallel_row_threshold(), 1);
    }

    #[test]
    fn test_rejects_negative_parsimony() {
        let config = EvaluationConfig {
            parsimony_coefficient: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
