use crate::functions::primitives::{
    Absolute, Addition, Cosine, Division, Exponential, Logarithm, Maximum, Minimum, Multiplication,
    Negation, ProtectedDivision, ProtectedLogarithm, ProtectedSquareRoot, Sine, Square, SquareRoot,
    Subtraction, Tangent, Tanh,
};
use std::{collections::HashMap, sync::Arc};

use super::{symbol::Symbol, traits::Primitive};

/// Library of primitives addressable by name, used to build grammars from configuration.
pub struct SymbolRegistry {
    functions: HashMap<String, Arc<dyn Primitive>>,
}

impl SymbolRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };
        registry.register_builtins();
        registry
    }

    pub fn get_primitive(&self, name: &str) -> Option<Arc<dyn Primitive>> {
        self.functions.get(name).cloned()
    }

    pub fn get_symbol(&self, name: &str) -> Option<Symbol> {
        self.get_primitive(name).map(Symbol::function)
    }

    /// Register a primitive, replacing any previous one with the same name.
    pub fn register(&mut self, primitive: Arc<dyn Primitive>) {
        self.functions.insert(primitive.name().to_string(), primitive);
    }

    /// Registered names in alphabetical order
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }

    fn register_builtins(&mut self) {
        let primitives: Vec<Arc<dyn Primitive>> = vec![
            Arc::new(Addition),
            Arc::new(Subtraction),
            Arc::new(Multiplication),
            Arc::new(Division),
            Arc::new(ProtectedDivision),
            Arc::new(Maximum),
            Arc::new(Minimum),
            Arc::new(Negation),
            Arc::new(Absolute),
            Arc::new(Square),
            Arc::new(Sine),
            Arc::new(Cosine),
            Arc::new(Tangent),
            Arc::new(Tanh),
            Arc::new(Exponential),
            Arc::new(Logarithm),
            Arc::new(ProtectedLogarithm),
            Arc::new(SquareRoot),
            Arc::new(ProtectedSquareRoot),
        ];

        for primitive in primitives {
            self.register(primitive);
        }
    }
}

impl Default for SymbolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::primitives::ClosurePrimitive;

    #[test]
    fn test_registry_primitive_retrieval() {
        let registry = SymbolRegistry::new();
        let addition = registry.get_primitive("Addition");
        assert!(addition.is_some());
        assert_eq!(addition.unwrap().name(), "Addition");
    }

    #[test]
    fn test_registry_symbol_carries_arity() {
        let registry = SymbolRegistry::new();
        let sine = registry.get_symbol("Sine").unwrap();
        assert_eq!(sine.min_arity(), 1);
        assert_eq!(sine.max_arity(), 1);
        assert!(!sine.is_terminal());
    }

    #[test]
    fn test_primitive_not_found() {
        let registry = SymbolRegistry::new();
        assert!(registry.get_primitive("NonExistent").is_none());
    }

    #[test]
    fn test_register_custom_primitive() {
        let mut registry = SymbolRegistry::new();
        registry.register(Arc::new(ClosurePrimitive::new("Cube", 1, 1, |a| a[0] * a[0] * a[0])));
        assert!(registry.names().contains(&"Cube".to_string()));
    }
}
