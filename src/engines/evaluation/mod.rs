pub mod bindings;
pub mod classification;
pub mod compiler;
pub mod dataset;
pub mod evaluator;
pub mod interpreter;
pub mod regression;

pub use bindings::{BindingPool, Bindings, PooledBindings};
pub use classification::{ClassificationEvaluator, ImprovedClassificationEvaluator};
pub use compiler::{CompiledExpression, Compiler};
pub use dataset::Dataset;
pub use evaluator::{build_evaluator, finite_mean, EvaluatorMode, FitnessEvaluator, RowScorer};
pub use interpreter::Interpreter;
pub use regression::RegressionEvaluator;
