//! Type-safe wrappers for formula variables and operators.
use std::fmt;

/// A variable identifier (1-indexed).
///
/// Variables are assigned by the parser in first-occurrence order and are never
/// created during compilation, only referenced.
///
/// # Invariants
///
/// - Variable IDs must be >= 1 (0 is reserved)
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(u32);

impl Var {
    /// Creates a new variable with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if `id == 0`. Variables must be 1-indexed.
    pub fn new(id: u32) -> Self {
        assert_ne!(id, 0, "Variable IDs must be >= 1");
        Var(id)
    }

    /// Returns the raw variable ID as a `u32`.
    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.0
    }
}

/// Boolean combinator of an internal formula node.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Operator {
    And,
    Or,
}

impl Operator {
    /// The constant that decides the node as soon as one child takes it.
    pub fn absorbing(self) -> bool {
        match self {
            Operator::And => false,
            Operator::Or => true,
        }
    }

    /// The value of the operator applied to no children.
    pub fn identity(self) -> bool {
        !self.absorbing()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::And => write!(f, "AND"),
            Operator::Or => write!(f, "OR"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_creation() {
        let v1 = Var::new(1);
        let v2 = Var::new(2);
        assert_eq!(v1.id(), 1);
        assert_eq!(v2.id(), 2);
        assert!(v1 < v2);
        assert_eq!(v2.to_string(), "x2");
    }

    #[test]
    #[should_panic(expected = "Variable IDs must be >= 1")]
    fn test_var_zero_panics() {
        Var::new(0);
    }

    #[test]
    fn test_operator_constants() {
        assert!(Operator::Or.absorbing());
        assert!(!Operator::Or.identity());
        assert!(!Operator::And.absorbing());
        assert!(Operator::And.identity());
    }
}
