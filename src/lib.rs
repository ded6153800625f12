//! Grammar-guided genetic programming over symbolic expression trees.
//!
//! A [`grammar::Grammar`] decides which [`functions::Symbol`]s may appear where, the creators
//! and operators in [`engines::generation`] build and recombine [`tree::ExpressionTree`]s under
//! it, and the evaluators in [`engines::evaluation`] score trees against a dataset. The
//! [`engines::generation::EvolutionEngine`] ties them into a generational loop.

pub mod config;
pub mod engines;
pub mod error;
pub mod functions;
pub mod grammar;
pub mod tree;
pub mod types;

pub use error::{EvalError, GpError, Result};
pub use types::{EliteRecord, GenerationMetrics, GenerationReport, RunResult, TerminationReason};
