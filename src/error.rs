use std::fmt;
use std::time::Duration;

use crate::types::Var;
use crate::value::ValueId;

/// Errors raised while parsing formulas or compiling circuits.
#[derive(Debug)]
pub enum Error {
    /// Circuit construction exceeded its wall-clock budget.
    Timeout { elapsed: Duration, budget: Duration },
    /// Input structure that does not describe a formula.
    MalformedFormula(String),
    /// Input text is not valid JSON.
    Syntax(serde_json::Error),
    /// A probability or gradient left the finite domain.
    NumericDegeneracy(String),
    /// A variable has no terminal value in the current compilation.
    UnresolvedVariable(Var),
    /// Only terminal values carry a settable probability.
    NotALeaf(ValueId),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Syntax(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Timeout { elapsed, budget } => write!(
                f,
                "Compilation timed out after {:.3}s (budget {:.3}s)",
                elapsed.as_secs_f64(),
                budget.as_secs_f64()
            ),
            Error::MalformedFormula(msg) => write!(f, "Malformed formula: {}", msg),
            Error::Syntax(e) => write!(f, "Syntax error: {}", e),
            Error::NumericDegeneracy(msg) => write!(f, "Numeric degeneracy: {}", msg),
            Error::UnresolvedVariable(var) => write!(f, "No terminal value for variable {}", var),
            Error::NotALeaf(id) => write!(f, "Value #{} is derived, not a leaf", id.index()),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Syntax(e) => Some(e),
            _ => None,
        }
    }
}
