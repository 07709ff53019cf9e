//! Independence decomposition and pivot expansion.
//!
//! For every gate the compiler first tries to split the children into
//! variable-disjoint groups ([`decompose_independent`]). Groups are the
//! connected components of the hypergraph whose hyperedges are the children's
//! variable sets. When the gate is fully entangled, it is instead conditioned
//! on a pivot variable, akin to Shannon expansion ([`expand`]).

use std::collections::{BTreeMap, HashMap};

use log::debug;

use crate::formula::Formula;
use crate::types::{Operator, Var};
use crate::union_find::UnionFind;

/// How the compiler proceeds with a formula node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expansion {
    /// Leaf, constant, or a node over a single variable.
    Base,
    /// Variable-disjoint parts combined with the node's operator.
    Independent { op: Operator, parts: Vec<Formula> },
    /// The node conditioned on `pivot` being true (`high`) and false (`low`).
    Shannon {
        pivot: Var,
        high: Formula,
        low: Formula,
    },
}

/// Split the children of a gate into variable-disjoint groups.
///
/// Groups with several children are wrapped in a new gate with the original
/// operator. Returns `None` when all children end up in one component.
pub fn decompose_independent(formula: &Formula) -> Option<Vec<Formula>> {
    let Formula::Gate(gate) = formula else {
        return None;
    };

    let mut uf = UnionFind::new();
    for child in gate.children() {
        let vars = child.variables();
        let mut iter = vars.iter();
        if let Some(&rep) = iter.next() {
            for &v in iter {
                uf.union(v, rep);
            }
        }
    }

    // Groups keep the order in which their first child appears.
    let mut index: HashMap<Option<Var>, usize> = HashMap::new();
    let mut groups: Vec<Vec<Formula>> = Vec::new();
    for child in gate.children() {
        let key = child.first_var().map(|v| uf.find(v));
        let i = *index.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[i].push(child.clone());
    }

    if groups.len() <= 1 {
        return None;
    }

    debug!("decompose: {} independent parts of {}", groups.len(), formula);
    Some(
        groups
            .into_iter()
            .map(|mut group| {
                if group.len() == 1 {
                    group.swap_remove(0)
                } else {
                    Formula::mk_gate(gate.op(), group)
                }
            })
            .collect(),
    )
}

/// Number of direct children each variable occurs in.
pub fn occurrences(formula: &Formula) -> BTreeMap<Var, usize> {
    let mut counts = BTreeMap::new();
    for child in formula.children() {
        for &v in child.variables().iter() {
            *counts.entry(v).or_insert(0) += 1;
        }
    }
    counts
}

/// The variable occurring in the most direct children.
///
/// Ties go to the lowest variable ID.
pub fn select_pivot(formula: &Formula) -> Option<Var> {
    let mut best: Option<(Var, usize)> = None;
    for (var, count) in occurrences(formula) {
        match best {
            Some((_, c)) if c >= count => {}
            _ => best = Some((var, count)),
        }
    }
    best.map(|(var, _)| var)
}

/// Decide how to compile `formula`.
pub fn expand(formula: &Formula) -> Expansion {
    let Formula::Gate(gate) = formula else {
        return Expansion::Base;
    };
    if formula.var_count() <= 1 {
        // AND/OR over copies of one variable is that variable.
        return Expansion::Base;
    }

    if let Some(parts) = decompose_independent(formula) {
        return Expansion::Independent {
            op: gate.op(),
            parts,
        };
    }

    let Some(pivot) = select_pivot(formula) else {
        return Expansion::Base;
    };
    debug!("expand: pivot {} for {}", pivot, formula);

    Expansion::Shannon {
        pivot,
        high: formula.condition(pivot, true),
        low: formula.condition(pivot, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    fn x(id: u32) -> Formula {
        Formula::var(Var::new(id))
    }

    #[test]
    fn test_decompose_disjoint() {
        let f = Formula::or(vec![Formula::and(vec![x(1), x(2)]), Formula::and(vec![x(3), x(4)])]);
        let parts = decompose_independent(&f).unwrap();
        assert_eq!(parts, vec![Formula::and(vec![x(1), x(2)]), Formula::and(vec![x(3), x(4)])]);
    }

    #[test]
    fn test_decompose_regroups_shared() {
        let f = Formula::or(vec![
            Formula::and(vec![x(1), x(2)]),
            x(4),
            Formula::and(vec![x(1), x(3)]),
        ]);
        let parts = decompose_independent(&f).unwrap();
        assert_eq!(
            parts,
            vec![
                Formula::or(vec![Formula::and(vec![x(1), x(2)]), Formula::and(vec![x(1), x(3)])]),
                x(4),
            ]
        );
    }

    #[test]
    fn test_decompose_transitive_chain() {
        // x1-x2, x2-x3, x3-x4 form one component
        let f = Formula::and(vec![
            Formula::or(vec![x(1), x(2)]),
            Formula::or(vec![x(3), x(4)]),
            Formula::or(vec![x(2), x(3)]),
        ]);
        assert_eq!(decompose_independent(&f), None);
    }

    #[test]
    fn test_decompose_leaf() {
        assert_eq!(decompose_independent(&x(1)), None);
    }

    #[test]
    fn test_select_pivot_max_count() {
        let f = Formula::or(vec![Formula::and(vec![x(2), x(1)]), Formula::and(vec![x(2), x(3)])]);
        assert_eq!(select_pivot(&f), Some(Var::new(2)));
        assert_eq!(occurrences(&f)[&Var::new(2)], 2);
        assert_eq!(occurrences(&f)[&Var::new(3)], 1);
    }

    #[test]
    fn test_select_pivot_tie_lowest() {
        let f = Formula::or(vec![
            Formula::and(vec![x(3), x(2)]),
            Formula::and(vec![x(2), x(1)]),
            Formula::and(vec![x(1), x(3)]),
        ]);
        assert_eq!(select_pivot(&f), Some(Var::new(1)));
    }

    #[test]
    fn test_expand_base_cases() {
        assert_eq!(expand(&x(1)), Expansion::Base);
        assert_eq!(expand(&Formula::TRUE), Expansion::Base);
        let f = Formula::and(vec![x(1), Formula::or(vec![x(1), x(1)])]);
        assert_eq!(expand(&f), Expansion::Base);
    }

    #[test]
    fn test_expand_independent() {
        let f = Formula::and(vec![x(1), x(2), x(3)]);
        match expand(&f) {
            Expansion::Independent { op, parts } => {
                assert_eq!(op, Operator::And);
                assert_eq!(parts, vec![x(1), x(2), x(3)]);
            }
            other => panic!("unexpected expansion: {:?}", other),
        }
    }

    #[test]
    fn test_expand_shannon() {
        let f = Formula::or(vec![Formula::and(vec![x(1), x(2)]), Formula::and(vec![x(1), x(3)])]);
        match expand(&f) {
            Expansion::Shannon { pivot, high, low } => {
                assert_eq!(pivot, Var::new(1));
                assert_eq!(high, Formula::or(vec![x(2), x(3)]));
                assert_eq!(low, Formula::FALSE);
            }
            other => panic!("unexpected expansion: {:?}", other),
        }
    }
}
