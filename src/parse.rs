//! Reading formulas from nested JSON structures.
//!
//! A formula is either a variable token (a JSON string) or an object with an
//! operator tag and a non-empty list of sub-formulas:
//!
//! ```text
//! {"operator": "or", "subformula": [
//!     {"operator": "and", "subformula": ["a", "b"]},
//!     {"operator": "and", "subformula": ["a", "c"]}
//! ]}
//! ```
//!
//! Variables are numbered from 1 in order of first occurrence.

use std::collections::HashMap;
use std::io::Read;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::formula::Formula;
use crate::types::{Operator, Var};

/// Raw input shape, before variables are interned.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FormulaSpec {
    Var(String),
    Node {
        operator: String,
        #[serde(default, alias = "subformulas")]
        subformula: Vec<FormulaSpec>,
    },
}

/// Bidirectional mapping between variable names and [`Var`]s.
#[derive(Debug, Clone, Default)]
pub struct VarMap {
    ids: HashMap<String, Var>,
    names: Vec<String>,
}

impl VarMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The variable for `name`, allocating the next ID on first use.
    pub fn intern(&mut self, name: &str) -> Var {
        if let Some(&var) = self.ids.get(name) {
            return var;
        }
        self.names.push(name.to_string());
        let var = Var::new(self.names.len() as u32);
        self.ids.insert(name.to_string(), var);
        var
    }

    pub fn get(&self, name: &str) -> Option<Var> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, var: Var) -> Option<&str> {
        self.names.get(var.id() as usize - 1).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Variables with their names, in ID order.
    pub fn iter(&self) -> impl Iterator<Item = (Var, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (Var::new(i as u32 + 1), name.as_str()))
    }
}

fn parse_operator(tag: &str) -> Result<Operator> {
    if tag.eq_ignore_ascii_case("and") {
        Ok(Operator::And)
    } else if tag.eq_ignore_ascii_case("or") {
        Ok(Operator::Or)
    } else {
        Err(Error::MalformedFormula(format!("unknown operator '{}'", tag)))
    }
}

impl FormulaSpec {
    /// Convert to a [`Formula`], interning variable names into `vars`.
    pub fn to_formula(&self, vars: &mut VarMap) -> Result<Formula> {
        match self {
            FormulaSpec::Var(name) => Ok(Formula::var(vars.intern(name))),
            FormulaSpec::Node {
                operator,
                subformula,
            } => {
                let op = parse_operator(operator)?;
                let children = subformula
                    .iter()
                    .map(|sub| sub.to_formula(vars))
                    .collect::<Result<Vec<_>>>()?;
                Formula::gate(op, children)
            }
        }
    }
}

fn finish(spec: FormulaSpec) -> Result<(Formula, VarMap)> {
    let mut vars = VarMap::new();
    let formula = spec.to_formula(&mut vars)?;
    Ok((formula, vars))
}

/// Parse an already decoded JSON value.
pub fn parse_formula(value: &serde_json::Value) -> Result<(Formula, VarMap)> {
    finish(FormulaSpec::deserialize(value)?)
}

pub fn parse_str(input: &str) -> Result<(Formula, VarMap)> {
    finish(serde_json::from_str(input)?)
}

pub fn parse_reader<R: Read>(reader: R) -> Result<(Formula, VarMap)> {
    finish(serde_json::from_reader(reader)?)
}
