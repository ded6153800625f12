use super::bindings::Bindings;
use crate::error::EvalError;
use crate::tree::{ExpressionTree, Node};

/// Tree-walking evaluator. Errors are returned to the caller untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpreter;

impl Interpreter {
    pub fn evaluate(&self, tree: &ExpressionTree, bindings: &Bindings) -> Result<f64, EvalError> {
        self.evaluate_node(tree.root(), bindings)
    }

    /// Post-order: children first, then the node's own operation.
    pub fn evaluate_node(&self, node: &Node, bindings: &Bindings) -> Result<f64, EvalError> {
        match node {
            Node::Constant { value, .. } => Ok(*value),
            Node::Variable { name, .. } => bindings.get(name),
            Node::Function { symbol, children } => {
                let primitive = symbol.primitive().ok_or_else(|| {
                    EvalError::Compilation(format!("{} has no operation", symbol.name()))
                })?;
                let args = children
                    .iter()
                    .map(|child| self.evaluate_node(child, bindings))
                    .collect::<Result<Vec<f64>, EvalError>>()?;
                primitive.apply(&args)
            }
        }
    }
}
