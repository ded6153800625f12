use super::{
    evaluation::EvaluationConfig, evolution::EvolutionConfig, grammar::GrammarConfig,
    operators::OperatorConfig, traits::ConfigSection,
};
use crate::error::{GpError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub evolution: EvolutionConfig,
    pub operators: OperatorConfig,
    pub evaluation: EvaluationConfig,
    pub grammar: GrammarConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.evolution.validate()?;
        self.operators.validate()?;
        self.evaluation.validate()?;
        self.grammar.validate()?;
        if self.evolution.max_tree_length > self.grammar.max_length {
            return Err(GpError::Configuration(format!(
                "evolution.max_tree_length ({}) exceeds grammar.max_length ({})",
                self.evolution.max_tree_length, self.grammar.max_length
            )));
        }
        if self.evolution.max_tree_depth > self.grammar.max_depth {
            return Err(GpError::Configuration(format!(
                "evolution.max_tree_depth ({}) exceeds grammar.max_depth ({})",
                self.evolution.max_tree_depth, self.grammar.max_depth
            )));
        }
        Ok(())
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn poisoned<T>(_: T) -> GpError {
    GpError::Configuration("configuration lock poisoned".to_string())
}

/// Shared, validated application configuration.
#[derive(Clone, Default)]
pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AppConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
        })
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = AppConfig::from_toml_str(&contents)?;
        log::info!("Loaded configuration from {}", path.display());
        *self.config.write().map_err(poisoned)? = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_str = self.config.read().map_err(poisoned)?.to_toml_string()?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// Defaults, overlaid by an optional TOML file, overlaid by environment variables
    /// named `{prefix}_{SECTION}__{FIELD}` (for example `TREEGP_EVOLUTION__POPULATION_SIZE`).
    pub fn load_layered<P: AsRef<Path>>(&self, path: Option<P>, env_prefix: &str) -> Result<()> {
        let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path.as_ref()).required(false));
        }
        let config: AppConfig = builder
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        log::debug!("Layered configuration resolved with prefix {}", env_prefix);
        *self.config.write().map_err(poisoned)? = config;
        Ok(())
    }

    pub fn get(&self) -> Result<AppConfig> {
        Ok(self.config.read().map_err(poisoned)?.clone())
    }

    /// Applies `f` to a copy and stores it only if the result validates.
    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut guard = self.config.write().map_err(poisoned)?;
        let mut candidate = guard.clone();
        f(&mut candidate);
        candidate.validate()?;
        *guard = candidate;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_cross_section_bounds() {
        let mut config = AppConfig::default();
        config.evolution.max_tree_depth = 12;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_tree_depth (12) exceeds grammar.max_depth (10)"), "{}", err);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = AppConfig::from_toml_str(
            "[evolution]\npopulation_size = 30\n\n[evaluation]\nproblem = \"Classification\"\n",
        )
        .unwrap();
        assert_eq!(config.evolution.population_size, 30);
        assert_eq!(config.evolution.max_generations, 50);
        assert_eq!(config.evaluation.problem, crate::config::ProblemKind::Classification);
        assert_eq!(config.grammar.functions.len(), 4);
    }

    #[test]
    fn test_rejected_update_keeps_previous_config() {
        let manager = ConfigManager::new();
        let result = manager.update(|c| c.evolution.population_size = 0);
        assert!(result.is_err());
        assert_eq!(manager.get().unwrap().evolution.population_size, 100);

        manager.update(|c| c.evolution.population_size = 20).unwrap();
        assert_eq!(manager.get().unwrap().evolution.population_size, 20);
    }
}
