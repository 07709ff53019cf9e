//! Differentiable probability values.
//!
//! Values live in a [`ValueArena`] and are addressed by [`ValueId`]. Every
//! derived value records the operands it was built from and the
//! [`Combinator`] that produced it, so a single reverse pass over the arena
//! yields the derivative of the root probability with respect to every
//! terminal.
//!
//! # Combinators
//!
//! | combinator | forward                 | backward (into operand `i`)          |
//! |------------|-------------------------|--------------------------------------|
//! | union      | `1 − Π(1 − pᵢ)`         | `Π_{j≠i}(1 − pⱼ) · g`                |
//! | product    | `Π pᵢ`                  | `Π_{j≠i} pⱼ · g`                     |
//! | mux        | `a·s + b·(1 − s)`       | `a: s·g`, `b: (1 − s)·g`, `s: (a − b)·g` |
//!
//! The union and product rules use the product of the *other* operands, which
//! agrees with `(1 − p_out)/(1 − pᵢ)` and `p_out/pᵢ` wherever those are
//! defined and stays exact when an operand is 0 or 1.
//!
//! Operands are always created before the values that use them, so arena
//! order is a valid evaluation order.

use std::collections::BTreeSet;

use log::debug;

use crate::error::{Error, Result};
use crate::types::Var;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ValueId(usize);

impl ValueId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Combinator {
    /// Variable terminal or constant.
    Leaf,
    Union(Vec<ValueId>),
    Product(Vec<ValueId>),
    /// `high` when `selector` holds, `low` otherwise.
    Mux {
        high: ValueId,
        low: ValueId,
        selector: ValueId,
    },
}

impl Combinator {
    pub fn operands(&self) -> Vec<ValueId> {
        match self {
            Combinator::Leaf => Vec::new(),
            Combinator::Union(ops) | Combinator::Product(ops) => ops.clone(),
            Combinator::Mux {
                high,
                low,
                selector,
            } => vec![*high, *low, *selector],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Value {
    pub prob: f64,
    pub grad: f64,
    /// Variables this value depends on.
    pub vars: BTreeSet<Var>,
    pub op: Combinator,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ValueArena {
    values: Vec<Value>,
}

fn check_probability(p: f64) -> Result<f64> {
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(Error::NumericDegeneracy(format!(
            "probability {} outside [0, 1]",
            p
        )))
    }
}

/// For each position, the product of all other factors.
fn products_of_others(factors: &[f64]) -> Vec<f64> {
    let n = factors.len();
    let mut result = vec![1.0; n];
    let mut prefix = 1.0;
    for i in 0..n {
        result[i] = prefix;
        prefix *= factors[i];
    }
    let mut suffix = 1.0;
    for i in (0..n).rev() {
        result[i] *= suffix;
        suffix *= factors[i];
    }
    result
}

impl ValueArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, id: ValueId) -> &Value {
        &self.values[id.0]
    }

    pub fn prob(&self, id: ValueId) -> f64 {
        self.values[id.0].prob
    }

    pub fn grad(&self, id: ValueId) -> f64 {
        self.values[id.0].grad
    }

    pub fn iter(&self) -> impl Iterator<Item = (ValueId, &Value)> {
        self.values.iter().enumerate().map(|(i, v)| (ValueId(i), v))
    }

    pub fn set_label(&mut self, id: ValueId, label: impl Into<String>) {
        self.values[id.0].label = Some(label.into());
    }

    /// Change the probability of a leaf. Call [`ValueArena::forward`] afterwards.
    pub fn set_prob(&mut self, id: ValueId, prob: f64) -> Result<()> {
        let value = &mut self.values[id.0];
        if value.op != Combinator::Leaf {
            return Err(Error::NotALeaf(id));
        }
        value.prob = check_probability(prob)?;
        Ok(())
    }

    fn push(&mut self, prob: f64, vars: BTreeSet<Var>, op: Combinator, label: Option<String>) -> ValueId {
        let id = ValueId(self.values.len());
        self.values.push(Value {
            prob,
            grad: 0.0,
            vars,
            op,
            label,
        });
        id
    }

    fn vars_of(&self, operands: &[ValueId]) -> BTreeSet<Var> {
        let mut vars = BTreeSet::new();
        for &op in operands {
            vars.extend(self.values[op.0].vars.iter().copied());
        }
        vars
    }
}

// Constructors
impl ValueArena {
    /// Terminal for a variable with the given probability.
    pub fn terminal(&mut self, var: Var, prob: f64) -> Result<ValueId> {
        let prob = check_probability(prob)?;
        Ok(self.push(
            prob,
            BTreeSet::from([var]),
            Combinator::Leaf,
            Some(var.to_string()),
        ))
    }

    pub fn constant(&mut self, value: bool) -> ValueId {
        let (prob, label) = if value { (1.0, "TRUE") } else { (0.0, "FALSE") };
        self.push(prob, BTreeSet::new(), Combinator::Leaf, Some(label.to_string()))
    }

    /// Probability that at least one of the independent operands holds.
    pub fn union(&mut self, operands: &[ValueId]) -> ValueId {
        let op = Combinator::Union(operands.to_vec());
        let prob = self.eval(&op);
        let vars = self.vars_of(operands);
        self.push(prob, vars, op, None)
    }

    /// Probability that all of the independent operands hold.
    pub fn product(&mut self, operands: &[ValueId]) -> ValueId {
        let op = Combinator::Product(operands.to_vec());
        let prob = self.eval(&op);
        let vars = self.vars_of(operands);
        self.push(prob, vars, op, None)
    }

    /// Select between `high` and `low` by the probability of `selector`.
    pub fn mux(&mut self, high: ValueId, low: ValueId, selector: ValueId) -> ValueId {
        let op = Combinator::Mux {
            high,
            low,
            selector,
        };
        let prob = self.eval(&op);
        let vars = self.vars_of(&[high, low, selector]);
        let label = self.values[selector.0].label.as_ref().map(|s| format!("mux({})", s));
        self.push(prob, vars, op, label)
    }
}

// Propagation
impl ValueArena {
    fn eval(&self, op: &Combinator) -> f64 {
        match op {
            Combinator::Leaf => unreachable!("leaves carry their own probability"),
            Combinator::Union(ops) => {
                1.0 - ops.iter().map(|&i| 1.0 - self.prob(i)).product::<f64>()
            }
            Combinator::Product(ops) => ops.iter().map(|&i| self.prob(i)).product(),
            Combinator::Mux {
                high,
                low,
                selector,
            } => {
                let s = self.prob(*selector);
                self.prob(*high) * s + self.prob(*low) * (1.0 - s)
            }
        }
    }

    /// Recompute every derived probability from the current leaf probabilities.
    pub fn forward(&mut self) -> Result<()> {
        for i in 0..self.values.len() {
            if self.values[i].op == Combinator::Leaf {
                continue;
            }
            let prob = self.eval(&self.values[i].op);
            if !prob.is_finite() {
                return Err(Error::NumericDegeneracy(format!(
                    "non-finite probability at value {}",
                    i
                )));
            }
            self.values[i].prob = prob;
        }
        Ok(())
    }

    /// Values reachable from `root`, operands before users (DFS post-order).
    pub fn topo_order(&self, root: ValueId) -> Vec<ValueId> {
        let mut order = Vec::new();
        let mut visited = vec![false; self.values.len()];
        let mut stack = vec![(root, false)];

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            if visited[id.0] {
                continue;
            }
            visited[id.0] = true;
            stack.push((id, true));
            for op in self.values[id.0].op.operands().into_iter().rev() {
                if !visited[op.0] {
                    stack.push((op, false));
                }
            }
        }

        order
    }

    /// Gradient contributions of `id` to its operands.
    fn local_gradients(&self, id: ValueId) -> Vec<(ValueId, f64)> {
        let value = &self.values[id.0];
        let g = value.grad;
        match &value.op {
            Combinator::Leaf => Vec::new(),
            Combinator::Union(ops) => {
                let complements: Vec<f64> = ops.iter().map(|&i| 1.0 - self.prob(i)).collect();
                let others = products_of_others(&complements);
                ops.iter().zip(others).map(|(&i, d)| (i, d * g)).collect()
            }
            Combinator::Product(ops) => {
                let probs: Vec<f64> = ops.iter().map(|&i| self.prob(i)).collect();
                let others = products_of_others(&probs);
                ops.iter().zip(others).map(|(&i, d)| (i, d * g)).collect()
            }
            Combinator::Mux {
                high,
                low,
                selector,
            } => {
                let s = self.prob(*selector);
                let (a, b) = (self.prob(*high), self.prob(*low));
                vec![(*high, s * g), (*low, (1.0 - s) * g), (*selector, (a - b) * g)]
            }
        }
    }

    /// Reverse-mode pass from `root`.
    ///
    /// All gradients are reset, then the root is seeded with `2^k`, where `k`
    /// is the number of variables feeding it (`1` once `k` reaches 100).
    pub fn backward(&mut self, root: ValueId) -> Result<()> {
        for value in &mut self.values {
            value.grad = 0.0;
        }

        let k = self.values[root.0].vars.len();
        let seed = if k < 100 { 2f64.powi(k as i32) } else { 1.0 };
        self.values[root.0].grad = seed;
        debug!("backward: root {:?} over {} vars, seed = {}", root, k, seed);

        let order = self.topo_order(root);
        for &id in order.iter().rev() {
            for (operand, delta) in self.local_gradients(id) {
                self.values[operand.0].grad += delta;
            }
        }

        for &id in &order {
            let grad = self.values[id.0].grad;
            if !grad.is_finite() {
                return Err(Error::NumericDegeneracy(format!(
                    "non-finite gradient {} at value {}",
                    grad, id.0
                )));
            }
        }
        Ok(())
    }
}
