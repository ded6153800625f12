use crate::error::EvalError;
use crate::functions::traits::{Notation, Primitive};
use std::sync::Arc;

/// Denominators smaller than this are treated as zero by protected division.
pub const PROTECTED_DIVISION_EPSILON: f64 = 1e-12;

// --- Arithmetic ---

pub struct Addition;

impl Primitive for Addition {
    fn name(&self) -> &str { "Addition" }
    fn description(&self) -> &str { "Sum of both arguments" }
    fn min_arity(&self) -> usize { 2 }
    fn max_arity(&self) -> usize { 2 }
    fn notation(&self) -> Notation { Notation::Infix("+") }
    fn apply(&self, args: &[f64]) -> Result<f64, EvalError> {
        self.check_arity(args)?;
        Ok(args.iter().sum())
    }
}

pub struct Subtraction;

impl Primitive for Subtraction {
    fn name(&self) -> &str { "Subtraction" }
    fn description(&self) -> &str { "First argument minus the second" }
    fn min_arity(&self) -> usize { 2 }
    fn max_arity(&self) -> usize { 2 }
    fn notation(&self) -> Notation { Notation::Infix("-") }
    fn apply(&self, args: &[f64]) -> Result<f64, EvalError> {
        self.check_arity(args)?;
        Ok(args[1..].iter().fold(args[0], |acc, v| acc - v))
    }
}

pub struct Multiplication;

impl Primitive for Multiplication {
    fn name(&self) -> &str { "Multiplication" }
    fn description(&self) -> &str { "Product of both arguments" }
    fn min_arity(&self) -> usize { 2 }
    fn max_arity(&self) -> usize { 2 }
    fn notation(&self) -> Notation { Notation::Infix("*") }
    fn apply(&self, args: &[f64]) -> Result<f64, EvalError> {
        self.check_arity(args)?;
        Ok(args.iter().product())
    }
}

/// Unprotected division, fails on a zero denominator.
pub struct Division;

impl Primitive for Division {
    fn name(&self) -> &str { "Division" }
    fn description(&self) -> &str { "First argument divided by the second" }
    fn min_arity(&self) -> usize { 2 }
    fn max_arity(&self) -> usize { 2 }
    fn notation(&self) -> Notation { Notation::Infix("/") }
    fn apply(&self, args: &[f64]) -> Result<f64, EvalError> {
        self.check_arity(args)?;
        if args[1] == 0.0 {
            return Err(EvalError::Domain { operation: "Division", argument: args[1] });
        }
        Ok(args[0] / args[1])
    }
}

/// Division returning 1 when the denominator is (close to) zero.
pub struct ProtectedDivision;

impl Primitive for ProtectedDivision {
    fn name(&self) -> &str { "ProtectedDivision" }
    fn description(&self) -> &str { "Division that yields 1 for a zero denominator" }
    fn min_arity(&self) -> usize { 2 }
    fn max_arity(&self) -> usize { 2 }
    fn notation(&self) -> Notation { Notation::Infix("/") }
    fn apply(&self, args: &[f64]) -> Result<f64, EvalError> {
        self.check_arity(args)?;
        if args[1].abs() < PROTECTED_DIVISION_EPSILON {
            Ok(1.0)
        } else {
            Ok(args[0] / args[1])
        }
    }
}

pub struct Maximum;

impl Primitive for Maximum {
    fn name(&self) -> &str { "Maximum" }
    fn description(&self) -> &str { "Larger of both arguments" }
    fn min_arity(&self) -> usize { 2 }
    fn max_arity(&self) -> usize { 2 }
    fn notation(&self) -> Notation { Notation::Call("max") }
    fn apply(&self, args: &[f64]) -> Result<f64, EvalError> {
        self.check_arity(args)?;
        Ok(args[1..].iter().fold(args[0], |acc, v| acc.max(*v)))
    }
}

pub struct Minimum;

impl Primitive for Minimum {
    fn name(&self) -> &str { "Minimum" }
    fn description(&self) -> &str { "Smaller of both arguments" }
    fn min_arity(&self) -> usize { 2 }
    fn max_arity(&self) -> usize { 2 }
    fn notation(&self) -> Notation { Notation::Call("min") }
    fn apply(&self, args: &[f64]) -> Result<f64, EvalError> {
        self.check_arity(args)?;
        Ok(args[1..].iter().fold(args[0], |acc, v| acc.min(*v)))
    }
}

// --- Unary ---

pub struct Negation;

impl Primitive for Negation {
    fn name(&self) -> &str { "Negation" }
    fn description(&self) -> &str { "Additive inverse" }
    fn min_arity(&self) -> usize { 1 }
    fn max_arity(&self) -> usize { 1 }
    fn notation(&self) -> Notation { Notation::Prefix("-") }
    fn apply(&self, args: &[f64]) -> Result<f64, EvalError> {
        self.check_arity(args)?;
        Ok(-args[0])
    }
}

pub struct Absolute;

impl Primitive for Absolute {
    fn name(&self) -> &str { "Absolute" }
    fn description(&self) -> &str { "Absolute value" }
    fn min_arity(&self) -> usize { 1 }
    fn max_arity(&self) -> usize { 1 }
    fn notation(&self) -> Notation { Notation::Call("abs") }
    fn apply(&self, args: &[f64]) -> Result<f64, EvalError> {
        self.check_arity(args)?;
        Ok(args[0].abs())
    }
}

pub struct Square;

impl Primitive for Square {
    fn name(&self) -> &str { "Square" }
    fn description(&self) -> &str { "Argument multiplied by itself" }
    fn min_arity(&self) -> usize { 1 }
    fn max_arity(&self) -> usize { 1 }
    fn notation(&self) -> Notation { Notation::Call("sqr") }
    fn apply(&self, args: &[f64]) -> Result<f64, EvalError> {
        self.check_arity(args)?;
        Ok(args[0] * args[0])
    }
}

pub struct Sine;

impl Primitive for Sine {
    fn name(&self) -> &str { "Sine" }
    fn description(&self) -> &str { "Sine (radians)" }
    fn min_arity(&self) -> usize { 1 }
    fn max_arity(&self) -> usize { 1 }
    fn notation(&self) -> Notation { Notation::Call("sin") }
    fn apply(&self, args: &[f64]) -> Result<f64, EvalError> {
        self.check_arity(args)?;
        Ok(args[0].sin())
    }
}

pub struct Cosine;

impl Primitive for Cosine {
    fn name(&self) -> &str { "Cosine" }
    fn description(&self) -> &str { "Cosine (radians)" }
    fn min_arity(&self) -> usize { 1 }
    fn max_arity(&self) -> usize { 1 }
    fn notation(&self) -> Notation { Notation::Call("cos") }
    fn apply(&self, args: &[f64]) -> Result<f64, EvalError> {
        self.check_arity(args)?;
        Ok(args[0].cos())
    }
}

pub struct Tangent;

impl Primitive for Tangent {
    fn name(&self) -> &str { "Tangent" }
    fn description(&self) -> &str { "Tangent (radians)" }
    fn min_arity(&self) -> usize { 1 }
    fn max_arity(&self) -> usize { 1 }
    fn notation(&self) -> Notation { Notation::Call("tan") }
    fn apply(&self, args: &[f64]) -> Result<f64, EvalError> {
        self.check_arity(args)?;
        Ok(args[0].tan())
    }
}

pub struct Tanh;

impl Primitive for Tanh {
    fn name(&self) -> &str { "Tanh" }
    fn description(&self) -> &str { "Hyperbolic tangent" }
    fn min_arity(&self) -> usize { 1 }
    fn max_arity(&self) -> usize { 1 }
    fn notation(&self) -> Notation { Notation::Call("tanh") }
    fn apply(&self, args: &[f64]) -> Result<f64, EvalError> {
        self.check_arity(args)?;
        Ok(args[0].tanh())
    }
}

pub struct Exponential;

impl Primitive for Exponential {
    fn name(&self) -> &str { "Exponential" }
    fn description(&self) -> &str { "e raised to the argument" }
    fn min_arity(&self) -> usize { 1 }
    fn max_arity(&self) -> usize { 1 }
    fn notation(&self) -> Notation { Notation::Call("exp") }
    fn apply(&self, args: &[f64]) -> Result<f64, EvalError> {
        self.check_arity(args)?;
        Ok(args[0].exp())
    }
}

/// Natural logarithm, fails for arguments <= 0.
pub struct Logarithm;

impl Primitive for Logarithm {
    fn name(&self) -> &str { "Logarithm" }
    fn description(&self) -> &str { "Natural logarithm" }
    fn min_arity(&self) -> usize { 1 }
    fn max_arity(&self) -> usize { 1 }
    fn notation(&self) -> Notation { Notation::Call("log") }
    fn apply(&self, args: &[f64]) -> Result<f64, EvalError> {
        self.check_arity(args)?;
        if args[0] <= 0.0 {
            return Err(EvalError::Domain { operation: "Logarithm", argument: args[0] });
        }
        Ok(args[0].ln())
    }
}

/// `ln(|x|)`, with `ln(0)` defined as 0.
pub struct ProtectedLogarithm;

impl Primitive for ProtectedLogarithm {
    fn name(&self) -> &str { "ProtectedLogarithm" }
    fn description(&self) -> &str { "Natural logarithm of the absolute value, 0 at 0" }
    fn min_arity(&self) -> usize { 1 }
    fn max_arity(&self) -> usize { 1 }
    fn notation(&self) -> Notation { Notation::Call("plog") }
    fn apply(&self, args: &[f64]) -> Result<f64, EvalError> {
        self.check_arity(args)?;
        if args[0] == 0.0 {
            Ok(0.0)
        } else {
            Ok(args[0].abs().ln())
        }
    }
}

/// Square root, fails for negative arguments.
pub struct SquareRoot;

impl Primitive for SquareRoot {
    fn name(&self) -> &str { "SquareRoot" }
    fn description(&self) -> &str { "Square root" }
    fn min_arity(&self) -> usize { 1 }
    fn max_arity(&self) -> usize { 1 }
    fn notation(&self) -> Notation { Notation::Call("sqrt") }
    fn apply(&self, args: &[f64]) -> Result<f64, EvalError> {
        self.check_arity(args)?;
        if args[0] < 0.0 {
            return Err(EvalError::Domain { operation: "SquareRoot", argument: args[0] });
        }
        Ok(args[0].sqrt())
    }
}

pub struct ProtectedSquareRoot;

impl Primitive for ProtectedSquareRoot {
    fn name(&self) -> &str { "ProtectedSquareRoot" }
    fn description(&self) -> &str { "Square root of the absolute value" }
    fn min_arity(&self) -> usize { 1 }
    fn max_arity(&self) -> usize { 1 }
    fn notation(&self) -> Notation { Notation::Call("psqrt") }
    fn apply(&self, args: &[f64]) -> Result<f64, EvalError> {
        self.check_arity(args)?;
        Ok(args[0].abs().sqrt())
    }
}

// --- User supplied ---

type ClosureFn = dyn Fn(&[f64]) -> f64 + Send + Sync;

/// Wraps an arbitrary closure so it can be used as a function symbol.
pub struct ClosurePrimitive {
    name: String,
    description: String,
    min_arity: usize,
    max_arity: usize,
    func: Arc<ClosureFn>,
}

impl ClosurePrimitive {
    pub fn new<F>(name: impl Into<String>, min_arity: usize, max_arity: usize, func: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: String::new(),
            min_arity,
            max_arity,
            func: Arc::new(func),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl Primitive for ClosurePrimitive {
    fn name(&self) -> &str { &self.name }
    fn description(&self) -> &str { &self.description }
    fn min_arity(&self) -> usize { self.min_arity }
    fn max_arity(&self) -> usize { self.max_arity }
    fn notation(&self) -> Notation { Notation::Call("") }
    fn apply(&self, args: &[f64]) -> Result<f64, EvalError> {
        self.check_arity(args)?;
        Ok((self.func)(args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unprotected_operations_report_domain_errors() {
        assert!(matches!(
            Division.apply(&[1.0, 0.0]),
            Err(EvalError::Domain { operation: "Division", .. })
        ));
        assert!(Logarithm.apply(&[-1.0]).is_err());
        assert!(SquareRoot.apply(&[-4.0]).is_err());
    }

    #[test]
    fn test_protected_operations_stay_defined() {
        assert_eq!(ProtectedDivision.apply(&[3.0, 0.0]).unwrap(), 1.0);
        assert_eq!(ProtectedLogarithm.apply(&[0.0]).unwrap(), 0.0);
        assert!((ProtectedLogarithm.apply(&[-1.0]).unwrap()).abs() < 1e-12);
        assert_eq!(ProtectedSquareRoot.apply(&[-4.0]).unwrap(), 2.0);
    }

    #[test]
    fn test_arity_is_checked() {
        let err = Addition.apply(&[1.0]).unwrap_err();
        assert!(matches!(err, EvalError::Arity { actual: 1, .. }));
    }

    #[test]
    fn test_closure_primitive() {
        let cube = ClosurePrimitive::new("Cube", 1, 1, |args| args[0].powi(3));
        assert_eq!(cube.apply(&[2.0]).unwrap(), 8.0);
        assert_eq!(cube.name(), "Cube");
    }
}
