//! Monotone Boolean formulas over AND/OR.
//!
//! A [`Formula`] is either a constant, a single variable, or a gate combining
//! child formulas with one [`Operator`]. Gates are reference-counted and never
//! mutated: [`Formula::condition`] builds a new formula and shares every
//! untouched sub-formula with its input, so the same node can be conditioned
//! on `true` and on `false` without one result leaking into the other.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::types::{Operator, Var};

#[derive(Debug, Clone, PartialEq)]
pub enum Formula {
    Const(bool),
    Var(Var),
    Gate(Rc<Gate>),
}

/// Internal node: an operator over a non-empty list of children.
#[derive(Debug, PartialEq)]
pub struct Gate {
    op: Operator,
    children: Vec<Formula>,
    /// Union of the children's variables.
    vars: BTreeSet<Var>,
}

impl Gate {
    pub fn op(&self) -> Operator {
        self.op
    }

    pub fn children(&self) -> &[Formula] {
        &self.children
    }

    pub fn vars(&self) -> &BTreeSet<Var> {
        &self.vars
    }
}

// Constructors
impl Formula {
    pub const TRUE: Formula = Formula::Const(true);
    pub const FALSE: Formula = Formula::Const(false);

    pub fn var(var: Var) -> Formula {
        Formula::Var(var)
    }

    /// Build a gate, rejecting an empty child list.
    pub fn gate(op: Operator, children: Vec<Formula>) -> Result<Formula> {
        if children.is_empty() {
            return Err(Error::MalformedFormula(format!(
                "{} node without sub-formulas",
                op
            )));
        }
        Ok(Formula::mk_gate(op, children))
    }

    /// # Panics
    ///
    /// Panics if `children` is empty.
    pub fn and(children: Vec<Formula>) -> Formula {
        assert!(!children.is_empty(), "AND node requires sub-formulas");
        Formula::mk_gate(Operator::And, children)
    }

    /// # Panics
    ///
    /// Panics if `children` is empty.
    pub fn or(children: Vec<Formula>) -> Formula {
        assert!(!children.is_empty(), "OR node requires sub-formulas");
        Formula::mk_gate(Operator::Or, children)
    }

    /// Build a gate with constant children folded away.
    ///
    /// An absorbing constant decides the gate, identity constants are dropped,
    /// no remaining children give the identity and a single one is returned
    /// as is. The result never holds a constant child.
    pub(crate) fn mk_gate(op: Operator, children: Vec<Formula>) -> Formula {
        let absorbing = op.absorbing();
        let mut survivors = Vec::with_capacity(children.len());
        let mut vars = BTreeSet::new();
        for child in children {
            match &child {
                Formula::Const(c) if *c == absorbing => return Formula::Const(absorbing),
                Formula::Const(_) => continue,
                Formula::Var(v) => {
                    vars.insert(*v);
                }
                Formula::Gate(g) => vars.extend(g.vars.iter().copied()),
            }
            survivors.push(child);
        }
        match survivors.len() {
            0 => Formula::Const(op.identity()),
            1 => survivors.swap_remove(0),
            _ => Formula::Gate(Rc::new(Gate {
                op,
                children: survivors,
                vars,
            })),
        }
    }
}

// Getters
impl Formula {
    /// Variables the formula depends on.
    pub fn variables(&self) -> Cow<'_, BTreeSet<Var>> {
        match self {
            Formula::Const(_) => Cow::Owned(BTreeSet::new()),
            Formula::Var(v) => Cow::Owned(BTreeSet::from([*v])),
            Formula::Gate(g) => Cow::Borrowed(&g.vars),
        }
    }

    pub fn var_count(&self) -> usize {
        match self {
            Formula::Const(_) => 0,
            Formula::Var(_) => 1,
            Formula::Gate(g) => g.vars.len(),
        }
    }

    pub fn contains(&self, var: Var) -> bool {
        match self {
            Formula::Const(_) => false,
            Formula::Var(v) => *v == var,
            Formula::Gate(g) => g.vars.contains(&var),
        }
    }

    /// The first (lowest) variable, if any.
    pub fn first_var(&self) -> Option<Var> {
        match self {
            Formula::Const(_) => None,
            Formula::Var(v) => Some(*v),
            Formula::Gate(g) => g.vars.first().copied(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self, Formula::Gate(_))
    }

    pub fn as_const(&self) -> Option<bool> {
        match self {
            Formula::Const(b) => Some(*b),
            _ => None,
        }
    }

    pub fn operator(&self) -> Option<Operator> {
        match self {
            Formula::Gate(g) => Some(g.op),
            _ => None,
        }
    }

    /// Direct sub-formulas; empty for leaves.
    pub fn children(&self) -> &[Formula] {
        match self {
            Formula::Gate(g) => &g.children,
            _ => &[],
        }
    }
}

impl Formula {
    /// Fix `var` to `value` and simplify.
    ///
    /// A collapsed result is a [`Formula::Const`]. A child that collapses to the
    /// operator's absorbing constant decides the whole gate; a child that
    /// collapses to the identity constant is dropped. A gate left without
    /// children becomes its identity (`true` for AND, `false` for OR), and a
    /// gate left with one child is replaced by that child.
    ///
    /// Formulas not containing `var` are returned unchanged.
    pub fn condition(&self, var: Var, value: bool) -> Formula {
        match self {
            Formula::Const(_) => self.clone(),
            Formula::Var(v) if *v == var => Formula::Const(value),
            Formula::Var(_) => self.clone(),
            Formula::Gate(gate) => {
                if !gate.vars.contains(&var) {
                    return self.clone();
                }
                let absorbing = gate.op.absorbing();
                let mut children = Vec::with_capacity(gate.children.len());
                for child in &gate.children {
                    match child.condition(var, value) {
                        Formula::Const(c) if c == absorbing => return Formula::Const(absorbing),
                        rest => children.push(rest),
                    }
                }
                Formula::mk_gate(gate.op, children)
            }
        }
    }

    /// Evaluate under a total assignment.
    pub fn eval<F>(&self, assignment: &F) -> bool
    where
        F: Fn(Var) -> bool,
    {
        match self {
            Formula::Const(b) => *b,
            Formula::Var(v) => assignment(*v),
            Formula::Gate(g) => match g.op {
                Operator::And => g.children.iter().all(|c| c.eval(assignment)),
                Operator::Or => g.children.iter().any(|c| c.eval(assignment)),
            },
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::Const(true) => write!(f, "TRUE"),
            Formula::Const(false) => write!(f, "FALSE"),
            Formula::Var(v) => write!(f, "{}", v),
            Formula::Gate(g) => {
                write!(f, "(")?;
                for (i, child) in g.children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", g.op)?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}
