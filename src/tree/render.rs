use super::node::Node;
use crate::functions::traits::Notation;
use std::fmt;

/// `Name(child, child, ...)` for functions, the variable name for variables and the
/// literal for constants. Stable for a given structure, used as the persisted form.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Function { symbol, children } => {
                write!(f, "{}(", symbol.name())?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", child)?;
                }
                f.write_str(")")
            }
            Node::Variable { name, .. } => f.write_str(name),
            Node::Constant { value, .. } => write!(f, "{}", value),
        }
    }
}

/// Conventional math notation, e.g. `(X + sin(Y))`.
pub fn math_string(node: &Node) -> String {
    match node {
        Node::Variable { name, .. } => name.clone(),
        Node::Constant { value, .. } => value.to_string(),
        Node::Function { symbol, children } => {
            let args: Vec<String> = children.iter().map(math_string).collect();
            let notation = symbol
                .primitive()
                .map(|p| p.notation())
                .unwrap_or(Notation::Call(""));
            match notation {
                Notation::Infix(token) if args.len() >= 2 => {
                    format!("({})", args.join(&format!(" {} ", token)))
                }
                Notation::Prefix(token) if args.len() == 1 => format!("({}{})", token, args[0]),
                Notation::Call(name) if !name.is_empty() => format!("{}({})", name, args.join(", ")),
                _ => format!("{}({})", symbol.name(), args.join(", ")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::primitives::{Addition, ClosurePrimitive, Negation, Sine};
    use crate::functions::symbol::Symbol;
    use std::sync::Arc;

    #[test]
    fn test_math_string() {
        let add = Arc::new(Symbol::function(Arc::new(Addition)));
        let sin = Arc::new(Symbol::function(Arc::new(Sine)));
        let neg = Arc::new(Symbol::function(Arc::new(Negation)));
        let var = Arc::new(Symbol::variable("Variable", vec!["X", "Y"]));
        let node = Node::function(
            add,
            vec![
                Node::function(neg, vec![Node::variable(var.clone(), "X")]),
                Node::function(sin, vec![Node::variable(var, "Y")]),
            ],
        );
        assert_eq!(node.to_string(), "Addition(Negation(X), Sine(Y))");
        assert_eq!(math_string(&node), "((-X) + sin(Y))");
    }

    #[test]
    fn test_custom_primitive_uses_symbol_name() {
        let cube = Arc::new(Symbol::function(Arc::new(ClosurePrimitive::new(
            "Cube",
            1,
            1,
            |a| a[0].powi(3),
        ))));
        let constant = Arc::new(Symbol::constant("Constant", 0.0, 1.0));
        let node = Node::function(cube, vec![Node::constant(constant, 1.5)]);
        assert_eq!(math_string(&node), "Cube(1.5)");
    }
}
