pub mod primitives;
pub mod registry;
pub mod symbol;
pub mod traits;

pub use registry::SymbolRegistry;
pub use symbol::{Symbol, SymbolKind};
pub use traits::{Notation, Primitive};
