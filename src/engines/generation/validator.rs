use crate::error::{GpError, Result};
use crate::grammar::Grammar;
use crate::tree::{ExpressionTree, Node};

/// Checks trees against the structural rules of a grammar.
pub struct TreeValidator<'g> {
    grammar: &'g Grammar,
    max_length: usize,
    max_depth: usize,
}

impl<'g> TreeValidator<'g> {
    /// Validator using the grammar's own length/depth limits
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            max_length: grammar.max_length(),
            max_depth: grammar.max_depth(),
        }
    }

    pub fn with_bounds(grammar: &'g Grammar, max_length: usize, max_depth: usize) -> Self {
        Self { grammar, max_length, max_depth }
    }

    /// Validate bounds, arity, root legality and every parent/child pairing
    pub fn validate(&self, tree: &ExpressionTree) -> Result<()> {
        let length = tree.length();
        if length > self.max_length {
            return Err(GpError::InvalidTree(format!(
                "tree length {} exceeds maximum {}",
                length, self.max_length
            )));
        }
        let depth = tree.depth();
        if depth > self.max_depth {
            return Err(GpError::InvalidTree(format!(
                "tree depth {} exceeds maximum {}",
                depth, self.max_depth
            )));
        }

        let root = tree.root();
        if !self.grammar.is_start_symbol(root.symbol()) {
            return Err(GpError::InvalidTree(format!(
                "{} is not a start symbol",
                root.symbol().name()
            )));
        }
        self.validate_structure(root)
    }

    /// Arity and child legality only, no bounds and no root check
    pub fn validate_structure(&self, node: &Node) -> Result<()> {
        let symbol = node.symbol();

        if !symbol.accepts_arity(node.child_count()) {
            return Err(GpError::InvalidTree(format!(
                "{} expects {}..={} children, got {}",
                symbol.name(),
                symbol.min_arity(),
                symbol.max_arity(),
                node.child_count()
            )));
        }

        for (position, child) in node.children().iter().enumerate() {
            if !self.grammar.is_allowed_child_symbol(symbol, child.symbol(), position) {
                return Err(GpError::InvalidTree(format!(
                    "{} is not allowed as child {} of {}",
                    child.symbol().name(),
                    position,
                    symbol.name()
                )));
            }
            self.validate_structure(child)?;
        }

        Ok(())
    }
}
