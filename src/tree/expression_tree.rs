use super::node::{parent_path, Node, NodePath, PrefixIter};
use super::render::math_string;
use crate::error::{GpError, Result};
use std::fmt;

/// An individual: a tree owning exactly one root node.
///
/// Length and depth are computed on demand since operators edit trees structurally
/// between queries.
#[derive(Debug, Clone)]
pub struct ExpressionTree {
    root: Node,
}

impl ExpressionTree {
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    pub fn length(&self) -> usize {
        self.root.length()
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn subtree(&self, path: &[usize]) -> Option<&Node> {
        self.root.subtree(path)
    }

    pub fn subtree_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        self.root.subtree_mut(path)
    }

    /// Parent node of `path` and the child slot it occupies; `None` for the root.
    pub fn parent_of(&self, path: &[usize]) -> Option<(&Node, usize)> {
        let parent = self.root.subtree(parent_path(path)?)?;
        path.last().map(|&index| (parent, index))
    }

    /// Swap in `replacement` at `path` (the whole tree for the root path) and return what was there.
    pub fn replace_at(&mut self, path: &[usize], replacement: Node) -> Result<Node> {
        match path.split_last() {
            None => Ok(std::mem::replace(&mut self.root, replacement)),
            Some((&index, parent)) => {
                let parent = self.root.subtree_mut(parent).ok_or_else(|| {
                    GpError::InvalidTree(format!("path {:?} does not exist", path))
                })?;
                parent.replace_subtree(index, replacement)
            }
        }
    }

    pub fn iter_prefix(&self) -> PrefixIter<'_> {
        self.root.iter_prefix()
    }

    pub fn nodes_postfix(&self) -> Vec<&Node> {
        self.root.nodes_postfix()
    }

    pub fn nodes_breadth(&self) -> Vec<&Node> {
        self.root.nodes_breadth()
    }

    pub fn prefix_paths(&self) -> Vec<NodePath> {
        self.root.prefix_paths()
    }

    pub fn to_math_string(&self) -> String {
        math_string(&self.root)
    }
}

impl fmt::Display for ExpressionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::primitives::Subtraction;
    use crate::functions::symbol::Symbol;
    use std::sync::Arc;

    fn tree() -> ExpressionTree {
        let sub = Arc::new(Symbol::function(Arc::new(Subtraction)));
        let var = Arc::new(Symbol::variable("Variable", vec!["X", "Y"]));
        ExpressionTree::new(Node::function(
            sub,
            vec![Node::variable(var.clone(), "X"), Node::variable(var, "Y")],
        ))
    }

    #[test]
    fn test_replace_root_and_child() {
        let mut t = tree();
        let y = t.subtree(&[1]).unwrap().clone();
        let old = t.replace_at(&[0], y.clone()).unwrap();
        assert_eq!(old.to_string(), "X");
        assert_eq!(t.to_string(), "Subtraction(Y, Y)");

        let old_root = t.replace_at(&[], y).unwrap();
        assert_eq!(old_root.length(), 3);
        assert_eq!(t.length(), 1);
        assert_eq!(t.depth(), 1);
    }

    #[test]
    fn test_parent_of() {
        let t = tree();
        let (parent, index) = t.parent_of(&[1]).unwrap();
        assert_eq!(parent.symbol().name(), "Subtraction");
        assert_eq!(index, 1);
        assert!(t.parent_of(&[]).is_none());
    }

    #[test]
    fn test_clone_does_not_alias() {
        let original = tree();
        let mut copy = original.clone();
        copy.replace_at(&[0], original.subtree(&[1]).unwrap().clone()).unwrap();
        assert_eq!(original.to_string(), "Subtraction(X, Y)");
        assert_ne!(copy.to_string(), original.to_string());
        assert_eq!(copy.to_math_string(), "(Y - Y)");
    }
}
