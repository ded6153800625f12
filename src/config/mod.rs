pub mod evaluation;
pub mod evolution;
pub mod grammar;
pub mod manager;
pub mod operators;
pub mod traits;

pub use evaluation::{EvaluationConfig, ProblemKind};
pub use evolution::{EvolutionConfig, SelectionMethod};
pub use grammar::GrammarConfig;
pub use manager::{AppConfig, ConfigManager};
pub use operators::{CreatorKind, CrossoverKind, MutatorKind, OperatorConfig};
pub use traits::{ConfigManifest, ConfigSection, FieldManifest};
