use crate::error::EvalError;
use crate::functions::traits::Primitive;
use crate::tree::{ExpressionTree, Node};
use std::sync::Arc;

type RowFn = Box<dyn Fn(&[f64]) -> Result<f64, EvalError> + Send + Sync>;

/// A tree translated once into nested closures over a dataset row.
///
/// Variable names are resolved to column indices at compile time, so evaluating a row does no
/// name lookups and allocates nothing for unary and binary operations.
pub struct CompiledExpression {
    func: RowFn,
    columns: usize,
}

impl CompiledExpression {
    pub fn evaluate(&self, row: &[f64]) -> Result<f64, EvalError> {
        (self.func)(row)
    }

    /// Number of columns the expression was compiled against
    pub fn columns(&self) -> usize {
        self.columns
    }
}

impl std::fmt::Debug for CompiledExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledExpression")
            .field("columns", &self.columns)
            .finish()
    }
}

/// Translates trees against a fixed variable ordering.
#[derive(Debug, Clone)]
pub struct Compiler {
    variable_names: Vec<String>,
}

impl Compiler {
    pub fn new(variable_names: &[String]) -> Self {
        Self {
            variable_names: variable_names.to_vec(),
        }
    }

    pub fn compile(&self, tree: &ExpressionTree) -> Result<CompiledExpression, EvalError> {
        Ok(CompiledExpression {
            func: self.compile_node(tree.root())?,
            columns: self.variable_names.len(),
        })
    }

    fn compile_node(&self, node: &Node) -> Result<RowFn, EvalError> {
        match node {
            Node::Constant { value, .. } => {
                let value = *value;
                let f: RowFn = Box::new(move |_: &[f64]| Ok(value));
                Ok(f)
            }
            Node::Variable { name, .. } => {
                let index = self
                    .variable_names
                    .iter()
                    .position(|n| n == name)
                    .ok_or_else(|| EvalError::Compilation(format!("unknown variable {}", name)))?;
                let name = name.clone();
                let f: RowFn = Box::new(move |row: &[f64]| {
                    row.get(index)
                        .copied()
                        .ok_or_else(|| EvalError::UnknownVariable(name.clone()))
                });
                Ok(f)
            }
            Node::Function { symbol, children } => {
                let primitive: Arc<dyn Primitive> = symbol
                    .primitive()
                    .cloned()
                    .ok_or_else(|| EvalError::Compilation(format!("{} has no operation", symbol.name())))?;
                if children.len() < primitive.min_arity() || children.len() > primitive.max_arity() {
                    return Err(EvalError::Compilation(format!(
                        "{} compiled with {} children",
                        symbol.name(),
                        children.len()
                    )));
                }

                let mut compiled = children
                    .iter()
                    .map(|child| self.compile_node(child))
                    .collect::<Result<Vec<RowFn>, EvalError>>()?;

                let f: RowFn = match compiled.len() {
                    1 => {
                        let a = compiled.remove(0);
                        Box::new(move |row: &[f64]| primitive.apply(&[a(row)?]))
                    }
                    2 => {
                        let b = compiled.remove(1);
                        let a = compiled.remove(0);
                        Box::new(move |row: &[f64]| {
                            let left = a(row)?;
                            let right = b(row)?;
                            primitive.apply(&[left, right])
                        })
                    }
                    _ => Box::new(move |row: &[f64]| {
                        let args = compiled
                            .iter()
                            .map(|f| f(row))
                            .collect::<Result<Vec<f64>, EvalError>>()?;
                        primitive.apply(&args)
                    }),
                };
                Ok(f)
            }
        }
    }
}
