pub mod rules;
pub mod selection_table;

pub use rules::{ChildFallback, Grammar, GrammarEvent};
pub use selection_table::SelectionTable;
