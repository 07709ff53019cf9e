//! Circuit driver: formula in, power indices out.
//!
//! [`BooleanCircuit::new`] compiles a [`Formula`] into a tree of
//! [`CircuitNode`]s whose values live in a [`ValueArena`]:
//!
//! - a leaf, a constant, or a node over one variable becomes that variable's
//!   terminal (or the constant);
//! - a node whose children split into variable-disjoint parts becomes a union
//!   (OR) or product (AND) of the compiled parts;
//! - any other node is conditioned on a pivot variable and becomes a mux of the
//!   two compiled branches, selected by the pivot's terminal.
//!
//! One reverse pass from the root then gives every terminal its gradient, and
//! the power index of a variable is `gradient × probability` of its terminal.
//!
//! # Example
//!
//! ```
//! use banzhaf_rs::circuit::{BooleanCircuit, CircuitConfig};
//! use banzhaf_rs::formula::Formula;
//! use banzhaf_rs::types::Var;
//!
//! let (a, b, c) = (Var::new(1), Var::new(2), Var::new(3));
//! // (a AND b) OR (a AND c)
//! let f = Formula::or(vec![
//!     Formula::and(vec![Formula::var(a), Formula::var(b)]),
//!     Formula::and(vec![Formula::var(a), Formula::var(c)]),
//! ]);
//!
//! let circuit = BooleanCircuit::new(&f, &CircuitConfig::default()).unwrap();
//! assert!((circuit.probability() - 0.375).abs() < 1e-12);
//! assert!((circuit.power_index(a).unwrap() - 3.0).abs() < 1e-12);
//! assert!((circuit.power_index(b).unwrap() - 1.0).abs() < 1e-12);
//! ```

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::decompose::{expand, Expansion};
use crate::error::{Error, Result};
use crate::formula::Formula;
use crate::parse::VarMap;
use crate::types::{Operator, Var};
use crate::value::{ValueArena, ValueId};

/// Compilation settings.
#[derive(Debug, Clone)]
pub struct CircuitConfig {
    /// Wall-clock budget for circuit construction (default: 200 s).
    pub timeout: Duration,
    /// Probability assigned to every variable terminal (default: 0.5).
    pub default_probability: f64,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(200),
            default_probability: 0.5,
        }
    }
}

impl CircuitConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_default_probability(mut self, prob: f64) -> Self {
        self.default_probability = prob;
        self
    }
}

/// How a circuit node combines its children.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CircuitOp {
    Union,
    Product,
    /// Children are `[high, low]`, the node conditioned on the variable.
    Conditioned(Var),
}

#[derive(Debug, Clone)]
pub struct CircuitNode {
    pub formula: Formula,
    /// `None` for base-case nodes.
    pub op: Option<CircuitOp>,
    pub children: Vec<CircuitNode>,
    pub value: ValueId,
}

impl CircuitNode {
    /// Number of nodes in this subtree.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(|c| c.size()).sum::<usize>()
    }

    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(|c| c.depth()).max().unwrap_or(0)
    }
}

/// State of one compilation run.
struct Compiler<'a> {
    config: &'a CircuitConfig,
    arena: ValueArena,
    terminals: BTreeMap<Var, ValueId>,
    start: Instant,
}

impl<'a> Compiler<'a> {
    fn new(config: &'a CircuitConfig) -> Self {
        Self {
            config,
            arena: ValueArena::new(),
            terminals: BTreeMap::new(),
            start: Instant::now(),
        }
    }

    fn add_terminals(&mut self, formula: &Formula) -> Result<()> {
        for &var in formula.variables().iter() {
            let id = self.arena.terminal(var, self.config.default_probability)?;
            self.terminals.insert(var, id);
        }
        Ok(())
    }

    fn check_budget(&self) -> Result<()> {
        let elapsed = self.start.elapsed();
        if elapsed >= self.config.timeout {
            return Err(Error::Timeout {
                elapsed,
                budget: self.config.timeout,
            });
        }
        Ok(())
    }

    fn terminal(&self, var: Var) -> Result<ValueId> {
        self.terminals
            .get(&var)
            .copied()
            .ok_or(Error::UnresolvedVariable(var))
    }

    fn build(&mut self, formula: &Formula) -> Result<CircuitNode> {
        self.check_budget()?;

        let (op, children, value) = match expand(formula) {
            Expansion::Base => {
                let value = match formula.first_var() {
                    Some(var) => self.terminal(var)?,
                    // No variables left: the formula is a constant.
                    None => self.arena.constant(formula.eval(&|_| false)),
                };
                (None, Vec::new(), value)
            }
            Expansion::Independent { op, parts } => {
                let children = parts
                    .iter()
                    .map(|part| self.build(part))
                    .collect::<Result<Vec<_>>>()?;
                let operands: Vec<ValueId> = children.iter().map(|c| c.value).collect();
                let (op, value) = match op {
                    Operator::Or => (CircuitOp::Union, self.arena.union(&operands)),
                    Operator::And => (CircuitOp::Product, self.arena.product(&operands)),
                };
                (Some(op), children, value)
            }
            Expansion::Shannon { pivot, high, low } => {
                let high = self.build(&high)?;
                let low = self.build(&low)?;
                let selector = self.terminal(pivot)?;
                let value = self.arena.mux(high.value, low.value, selector);
                (Some(CircuitOp::Conditioned(pivot)), vec![high, low], value)
            }
        };

        debug!("build: {:?} -> {:?} for {}", op, value, formula);
        Ok(CircuitNode {
            formula: formula.clone(),
            op,
            children,
            value,
        })
    }
}

/// A compiled formula with its propagated gradients.
#[derive(Debug, Clone)]
pub struct BooleanCircuit {
    formula: Formula,
    arena: ValueArena,
    terminals: BTreeMap<Var, ValueId>,
    root: CircuitNode,
    elapsed: Duration,
}

impl BooleanCircuit {
    /// Compile `formula` and run the reverse pass.
    ///
    /// Fails with [`Error::Timeout`] once construction has used up
    /// `config.timeout`; no partial circuit is returned.
    pub fn new(formula: &Formula, config: &CircuitConfig) -> Result<Self> {
        let mut compiler = Compiler::new(config);
        compiler.add_terminals(formula)?;
        let root = compiler.build(formula)?;
        let elapsed = compiler.start.elapsed();

        info!(
            "Compiled {} variables into {} circuit nodes ({} values) in {:.3}s",
            compiler.terminals.len(),
            root.size(),
            compiler.arena.len(),
            elapsed.as_secs_f64()
        );

        let mut circuit = Self {
            formula: formula.clone(),
            arena: compiler.arena,
            terminals: compiler.terminals,
            root,
            elapsed,
        };
        circuit.backward()?;
        Ok(circuit)
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    pub fn root(&self) -> &CircuitNode {
        &self.root
    }

    pub fn arena(&self) -> &ValueArena {
        &self.arena
    }

    /// Number of values in the arena.
    pub fn size(&self) -> usize {
        self.arena.len()
    }

    /// Time spent building the circuit.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn terminal(&self, var: Var) -> Option<ValueId> {
        self.terminals.get(&var).copied()
    }

    pub fn variables(&self) -> impl Iterator<Item = Var> + '_ {
        self.terminals.keys().copied()
    }

    /// Probability of the root.
    pub fn probability(&self) -> f64 {
        self.arena.prob(self.root.value)
    }

    /// Set the probability of a variable's terminal.
    ///
    /// Derived values are stale until [`BooleanCircuit::forward`] runs.
    pub fn set_probability(&mut self, var: Var, prob: f64) -> Result<()> {
        let id = self.terminal(var).ok_or(Error::UnresolvedVariable(var))?;
        self.arena.set_prob(id, prob)
    }

    pub fn forward(&mut self) -> Result<()> {
        self.arena.forward()
    }

    pub fn backward(&mut self) -> Result<()> {
        self.arena.backward(self.root.value)
    }

    pub fn gradient(&self, var: Var) -> Option<f64> {
        self.terminal(var).map(|id| self.arena.grad(id))
    }

    /// `gradient × probability` of the variable's terminal.
    pub fn power_index(&self, var: Var) -> Option<f64> {
        self.terminal(var).map(|id| self.arena.grad(id) * self.arena.prob(id))
    }

    pub fn power_indices(&self) -> Vec<(Var, f64)> {
        self.terminals
            .iter()
            .map(|(&var, &id)| (var, self.arena.grad(id) * self.arena.prob(id)))
            .collect()
    }

    /// `(label, index)` for every variable of the formula.
    pub fn banzhaf_values(&self) -> Vec<(String, f64)> {
        self.terminals
            .iter()
            .map(|(var, &id)| {
                let value = self.arena.get(id);
                let label = value.label.clone().unwrap_or_else(|| var.to_string());
                (label, value.grad * value.prob)
            })
            .collect()
    }

    /// Label terminals with the names they were parsed from.
    pub fn label_with(&mut self, names: &VarMap) {
        for (&var, &id) in &self.terminals {
            if let Some(name) = names.name(var) {
                self.arena.set_label(id, name);
            }
        }
    }
}
