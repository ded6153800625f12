use crate::functions::traits::Primitive;
use std::sync::Arc;

/// What a symbol produces when it labels a tree node.
#[derive(Debug, Clone)]
pub enum SymbolKind {
    /// Operation applied to the evaluated children
    Function(Arc<dyn Primitive>),
    /// Resolved by name against the run-time binding; nodes pick one of `variable_names`
    Variable { variable_names: Vec<String> },
    /// Literal value stored on each node, initialised uniformly in `[min_value, max_value]`
    Constant { min_value: f64, max_value: f64 },
}

/// A vocabulary item of the grammar.
///
/// Symbols are shared through `Arc` between the grammar and every tree that uses them;
/// two symbols are the same symbol when their names match.
#[derive(Debug, Clone)]
pub struct Symbol {
    name: String,
    description: String,
    min_arity: usize,
    max_arity: usize,
    enabled: bool,
    frequency: f64,
    kind: SymbolKind,
}

impl Symbol {
    pub fn function(primitive: Arc<dyn Primitive>) -> Self {
        Self {
            name: primitive.name().to_string(),
            description: primitive.description().to_string(),
            min_arity: primitive.min_arity(),
            max_arity: primitive.max_arity(),
            enabled: true,
            frequency: 1.0,
            kind: SymbolKind::Function(primitive),
        }
    }

    pub fn variable<S: Into<String>>(name: impl Into<String>, variable_names: Vec<S>) -> Self {
        Self {
            name: name.into(),
            description: "Input variable".to_string(),
            min_arity: 0,
            max_arity: 0,
            enabled: true,
            frequency: 1.0,
            kind: SymbolKind::Variable {
                variable_names: variable_names.into_iter().map(Into::into).collect(),
            },
        }
    }

    pub fn constant(name: impl Into<String>, min_value: f64, max_value: f64) -> Self {
        Self {
            name: name.into(),
            description: "Numeric constant".to_string(),
            min_arity: 0,
            max_arity: 0,
            enabled: true,
            frequency: 1.0,
            kind: SymbolKind::Constant { min_value, max_value },
        }
    }

    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn min_arity(&self) -> usize {
        self.min_arity
    }

    pub fn max_arity(&self) -> usize {
        self.max_arity
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn kind(&self) -> &SymbolKind {
        &self.kind
    }

    pub fn is_terminal(&self) -> bool {
        self.max_arity == 0
    }

    pub fn accepts_arity(&self, arity: usize) -> bool {
        self.min_arity <= arity && arity <= self.max_arity
    }

    pub fn primitive(&self) -> Option<&Arc<dyn Primitive>> {
        match &self.kind {
            SymbolKind::Function(primitive) => Some(primitive),
            _ => None,
        }
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn set_frequency(&mut self, frequency: f64) {
        self.frequency = frequency;
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Symbol {}
