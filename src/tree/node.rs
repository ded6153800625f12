use crate::error::{GpError, Result};
use crate::functions::symbol::{Symbol, SymbolKind};
use std::collections::VecDeque;
use std::sync::Arc;

/// Child indices leading from the root to a node. The root is the empty path.
pub type NodePath = Vec<usize>;

/// Path of the parent of `path`, `None` for the root.
pub fn parent_path(path: &[usize]) -> Option<&[usize]> {
    path.split_last().map(|(_, parent)| parent)
}

/// A node of a symbolic expression tree.
///
/// Children are owned exclusively by their parent. A node's parent and its index within
/// the parent are derived from its [`NodePath`], so there is no back-pointer to keep in sync.
#[derive(Debug, Clone)]
pub enum Node {
    Function { symbol: Arc<Symbol>, children: Vec<Node> },
    Variable { symbol: Arc<Symbol>, name: String },
    Constant { symbol: Arc<Symbol>, value: f64 },
}

impl Node {
    pub fn function(symbol: Arc<Symbol>, children: Vec<Node>) -> Self {
        Node::Function { symbol, children }
    }

    pub fn variable(symbol: Arc<Symbol>, name: impl Into<String>) -> Self {
        Node::Variable { symbol, name: name.into() }
    }

    pub fn constant(symbol: Arc<Symbol>, value: f64) -> Self {
        Node::Constant { symbol, value }
    }

    pub fn symbol(&self) -> &Arc<Symbol> {
        match self {
            Node::Function { symbol, .. }
            | Node::Variable { symbol, .. }
            | Node::Constant { symbol, .. } => symbol,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Function { children, .. } => children,
            _ => &[],
        }
    }

    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Node::Function { .. })
    }

    /// Number of nodes in this subtree
    pub fn length(&self) -> usize {
        1 + self.children().iter().map(Node::length).sum::<usize>()
    }

    /// Nodes on the longest path from this node to a leaf, a single node has depth 1
    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(Node::depth).max().unwrap_or(0)
    }

    pub fn subtree(&self, path: &[usize]) -> Option<&Node> {
        let mut current = self;
        for &index in path {
            current = current.children().get(index)?;
        }
        Some(current)
    }

    pub fn subtree_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let mut current = self;
        for &index in path {
            current = match current {
                Node::Function { children, .. } => children.get_mut(index)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Position of `child` among this node's children, compared by identity.
    pub fn index_of_subtree(&self, child: &Node) -> Option<usize> {
        self.children().iter().position(|c| std::ptr::eq(c, child))
    }

    // --- Structural edits. Arity is the caller's responsibility. ---

    pub fn add_subtree(&mut self, child: Node) -> Result<()> {
        self.children_vec_mut()?.push(child);
        Ok(())
    }

    pub fn insert_subtree(&mut self, index: usize, child: Node) -> Result<()> {
        let children = self.children_vec_mut()?;
        if index > children.len() {
            return Err(GpError::InvalidTree(format!(
                "insert position {} is past the {} existing children",
                index,
                children.len()
            )));
        }
        children.insert(index, child);
        Ok(())
    }

    pub fn remove_subtree(&mut self, index: usize) -> Result<Node> {
        let children = self.children_vec_mut()?;
        if index >= children.len() {
            return Err(GpError::InvalidTree(format!(
                "no child at position {} ({} children)",
                index,
                children.len()
            )));
        }
        Ok(children.remove(index))
    }

    /// Replace the child at `index`, returning the detached subtree.
    pub fn replace_subtree(&mut self, index: usize, child: Node) -> Result<Node> {
        let children = self.children_vec_mut()?;
        match children.get_mut(index) {
            Some(slot) => Ok(std::mem::replace(slot, child)),
            None => Err(GpError::InvalidTree(format!(
                "no child at position {} ({} children)",
                index,
                children.len()
            ))),
        }
    }

    /// Relabel a function node, keeping its children.
    pub fn set_function_symbol(&mut self, new_symbol: Arc<Symbol>) -> Result<()> {
        match (self, new_symbol.kind()) {
            (Node::Function { symbol, .. }, SymbolKind::Function(_)) => {
                *symbol = new_symbol;
                Ok(())
            }
            _ => Err(GpError::InvalidTree(format!(
                "cannot relabel node with non-function symbol {}",
                new_symbol.name()
            ))),
        }
    }

    fn children_vec_mut(&mut self) -> Result<&mut Vec<Node>> {
        match self {
            Node::Function { children, .. } => Ok(children),
            Node::Variable { symbol, .. } | Node::Constant { symbol, .. } => Err(
                GpError::InvalidTree(format!("terminal {} cannot hold subtrees", symbol.name())),
            ),
        }
    }

    // --- Traversals ---

    /// Node before its children, children in index order
    pub fn iter_prefix(&self) -> PrefixIter<'_> {
        PrefixIter { stack: vec![self] }
    }

    /// Children in index order before the node
    pub fn nodes_postfix(&self) -> Vec<&Node> {
        let mut out = Vec::with_capacity(self.length());
        fn walk<'a>(node: &'a Node, out: &mut Vec<&'a Node>) {
            for child in node.children() {
                walk(child, out);
            }
            out.push(node);
        }
        walk(self, &mut out);
        out
    }

    /// Increasing depth, ties in discovery order
    pub fn nodes_breadth(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut queue = VecDeque::from([self]);
        while let Some(node) = queue.pop_front() {
            out.push(node);
            queue.extend(node.children());
        }
        out
    }

    /// Paths of all nodes in prefix order
    pub fn prefix_paths(&self) -> Vec<NodePath> {
        let mut out = Vec::new();
        let mut stack: Vec<(NodePath, &Node)> = vec![(Vec::new(), self)];
        while let Some((path, node)) = stack.pop() {
            for (i, child) in node.children().iter().enumerate().rev() {
                let mut child_path = path.clone();
                child_path.push(i);
                stack.push((child_path, child));
            }
            out.push(path);
        }
        out
    }
}

pub struct PrefixIter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for PrefixIter<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::primitives::{Addition, Negation};
    use crate::functions::symbol::Symbol;

    fn sample() -> Node {
        // Addition(Negation(X), 2)
        let add = Arc::new(Symbol::function(Arc::new(Addition)));
        let neg = Arc::new(Symbol::function(Arc::new(Negation)));
        let var = Arc::new(Symbol::variable("Variable", vec!["X"]));
        let constant = Arc::new(Symbol::constant("Constant", -1.0, 1.0));
        Node::function(
            add,
            vec![
                Node::function(neg, vec![Node::variable(var, "X")]),
                Node::constant(constant, 2.0),
            ],
        )
    }

    fn names(nodes: impl IntoIterator<Item = String>) -> Vec<String> {
        nodes.into_iter().collect()
    }

    #[test]
    fn test_length_and_depth() {
        let node = sample();
        assert_eq!(node.length(), 4);
        assert_eq!(node.depth(), 3);
    }

    #[test]
    fn test_traversal_orders() {
        let node = sample();
        let label = |n: &Node| n.to_string();
        assert_eq!(
            names(node.iter_prefix().map(label)),
            vec!["Addition(Negation(X), 2)", "Negation(X)", "X", "2"]
        );
        assert_eq!(
            names(node.nodes_postfix().into_iter().map(label)),
            vec!["X", "Negation(X)", "2", "Addition(Negation(X), 2)"]
        );
        assert_eq!(
            names(node.nodes_breadth().into_iter().map(label)),
            vec!["Addition(Negation(X), 2)", "Negation(X)", "2", "X"]
        );
        assert_eq!(node.prefix_paths(), vec![vec![], vec![0], vec![0, 0], vec![1]]);
    }

    #[test]
    fn test_structural_edits() {
        let mut node = sample();
        let removed = node.remove_subtree(1).unwrap();
        assert_eq!(removed.to_string(), "2");
        assert_eq!(node.child_count(), 1);

        node.insert_subtree(0, removed).unwrap();
        assert_eq!(node.to_string(), "Addition(2, Negation(X))");

        let detached = node.replace_subtree(1, sample()).unwrap();
        assert_eq!(detached.to_string(), "Negation(X)");
        assert_eq!(node.length(), 6);

        let child = &node.children()[1];
        assert_eq!(node.index_of_subtree(child), Some(1));
    }

    #[test]
    fn test_terminals_reject_subtrees() {
        let mut node = sample();
        let leaf = node.subtree_mut(&[1]).unwrap();
        assert!(leaf.add_subtree(sample()).is_err());
        assert!(node.remove_subtree(5).is_err());
    }

    #[test]
    fn test_parent_path() {
        assert_eq!(parent_path(&[0, 2, 1]), Some(&[0, 2][..]));
        assert_eq!(parent_path(&[]), None);
    }
}
