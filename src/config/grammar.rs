use super::traits::{check_at_least, ConfigManifest, ConfigSection, FieldManifest};
use crate::error::{GpError, Result};
use crate::functions::{Symbol, SymbolRegistry};
use crate::grammar::{ChildFallback, Grammar};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const VARIABLE_SYMBOL: &str = "Variable";
pub const CONSTANT_SYMBOL: &str = "Constant";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarConfig {
    pub functions: Vec<String>,
    pub include_constants: bool,
    pub constant_min: f64,
    pub constant_max: f64,
    pub min_length: usize,
    pub max_length: usize,
    pub min_depth: usize,
    pub max_depth: usize,
    pub allow_self_recursion: bool,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            functions: ["Addition", "Subtraction", "Multiplication", "ProtectedDivision"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            include_constants: true,
            constant_min: -1.0,
            constant_max: 1.0,
            min_length: 1,
            max_length: 50,
            min_depth: 1,
            max_depth: 10,
            allow_self_recursion: false,
        }
    }
}

impl GrammarConfig {
    /// Grammar over the configured functions plus a variable symbol for `variable_names`.
    pub fn build(&self, variable_names: &[String]) -> Result<Grammar> {
        self.build_with(&SymbolRegistry::new(), variable_names)
    }

    /// Same as [`build`](Self::build), resolving function names through `registry`.
    pub fn build_with(&self, registry: &SymbolRegistry, variable_names: &[String]) -> Result<Grammar> {
        self.validate()?;
        if variable_names.is_empty() {
            return Err(GpError::Configuration(
                "grammar needs at least one variable name".to_string(),
            ));
        }

        let mut symbols = Vec::with_capacity(self.functions.len() + 2);
        for name in &self.functions {
            let symbol = registry.get_symbol(name).ok_or_else(|| {
                GpError::Configuration(format!(
                    "unknown function {} (known: {})",
                    name,
                    registry.names().join(", ")
                ))
            })?;
            symbols.push(symbol);
        }
        symbols.push(Symbol::variable(VARIABLE_SYMBOL, variable_names.to_vec()));
        if self.include_constants {
            symbols.push(Symbol::constant(CONSTANT_SYMBOL, self.constant_min, self.constant_max));
        }

        let mut grammar = Grammar::from_symbols(symbols)?;
        grammar.set_length_bounds(self.min_length, self.max_length);
        grammar.set_depth_bounds(self.min_depth, self.max_depth);
        if self.allow_self_recursion {
            grammar.set_child_fallback(ChildFallback::AllSymbols);
        }
        grammar.validate()?;
        Ok(grammar)
    }
}

impl ConfigSection for GrammarConfig {
    fn section_name() -> &'static str {
        "grammar"
    }

    fn validate(&self) -> Result<()> {
        check_at_least("max_length", self.max_length, 1)?;
        check_at_least("max_depth", self.max_depth, 1)?;
        if self.min_length > self.max_length {
            return Err(GpError::Configuration(format!(
                "min_length ({}) exceeds max_length ({})",
                self.min_length, self.max_length
            )));
        }
        if self.min_depth > self.max_depth {
            return Err(GpError::Configuration(format!(
                "min_depth ({}) exceeds max_depth ({})",
                self.min_depth, self.max_depth
            )));
        }
        if self.include_constants
            && !(self.constant_min.is_finite()
                && self.constant_max.is_finite()
                && self.constant_min <= self.constant_max)
        {
            return Err(GpError::Configuration(format!(
                "constant range [{}, {}] is not a finite, ordered interval",
                self.constant_min, self.constant_max
            )));
        }
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        ConfigManifest {
            section: "Grammar".to_string(),
            fields: vec![
                FieldManifest::new(
                    "functions",
                    "list",
                    json!(["Addition", "Subtraction", "Multiplication", "ProtectedDivision"]),
                    None,
                    "Function symbols by name",
                ),
                FieldManifest::new("include_constants", "bool", json!(true), None, "Add a random constant terminal"),
                FieldManifest::new("constant_min", "float", json!(-1.0), None, "Lower bound of new constants"),
                FieldManifest::new("constant_max", "float", json!(1.0), None, "Upper bound of new constants"),
                FieldManifest::new("min_length", "integer", json!(1), Some((0.0, 10_000.0)), "Smallest tree length"),
                FieldManifest::new(
                    "max_length",
                    "integer",
                    json!(50),
                    Some((1.0, 10_000.0)),
                    "Largest tree length produced by crossover",
                ),
                FieldManifest::new("min_depth", "integer", json!(1), Some((0.0, 100.0)), "Smallest tree depth"),
                FieldManifest::new(
                    "max_depth",
                    "integer",
                    json!(10),
                    Some((1.0, 100.0)),
                    "Largest tree depth produced by crossover",
                ),
                FieldManifest::new(
                    "allow_self_recursion",
                    "bool",
                    json!(false),
                    None,
                    "Let a function appear directly below itself",
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["X".to_string(), "Y".to_string()]
    }

    #[test]
    fn test_builds_valid_grammar() {
        let grammar = GrammarConfig::default().build(&names()).unwrap();
        assert!(grammar.get_symbol("ProtectedDivision").is_some());
        assert!(grammar.get_symbol(CONSTANT_SYMBOL).is_some());
        assert_eq!(grammar.variable_names(), names());
        assert_eq!(grammar.max_length(), 50);
    }

    #[test]
    fn test_unknown_function_is_reported() {
        let config = GrammarConfig {
            functions: vec!["Frobnicate".to_string()],
            ..Default::default()
        };
        let err = config.build(&names()).unwrap_err().to_string();
        assert!(err.contains("unknown function Frobnicate"), "{}", err);
    }

    #[test]
    fn test_self_recursion_switch() {
        let config = GrammarConfig {
            allow_self_recursion: true,
            ..Default::default()
        };
        let grammar = config.build(&names()).unwrap();
        let add = grammar.get_symbol("Addition").unwrap();
        assert!(grammar.is_allowed_child_symbol(add, add, 0));
    }
}
