pub mod expression_tree;
pub mod node;
pub mod render;

pub use expression_tree::ExpressionTree;
pub use node::{parent_path, Node, NodePath};
pub use render::math_string;
