use crate::error::EvalError;

/// How a primitive is written in the math-string rendering of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notation {
    /// `(a + b)`
    Infix(&'static str),
    /// `-a`
    Prefix(&'static str),
    /// `sin(a)`, `max(a, b)`
    Call(&'static str),
}

/// Operation carried by a function symbol.
///
/// `apply` receives the already evaluated values of the node's children in child order.
pub trait Primitive: Send + Sync {
    /// Symbol name used in tree renderings, e.g. `Addition`
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn min_arity(&self) -> usize;
    fn max_arity(&self) -> usize;
    fn notation(&self) -> Notation;

    /// Execute the operation
    fn apply(&self, args: &[f64]) -> Result<f64, EvalError>;

    fn check_arity(&self, args: &[f64]) -> Result<(), EvalError> {
        if args.len() < self.min_arity() || args.len() > self.max_arity() {
            return Err(EvalError::Arity {
                operation: self.name().to_string(),
                expected_min: self.min_arity(),
                expected_max: self.max_arity(),
                actual: args.len(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for dyn Primitive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Primitive")
            .field("name", &self.name())
            .field("min_arity", &self.min_arity())
            .field("max_arity", &self.max_arity())
            .finish()
    }
}
