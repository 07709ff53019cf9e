//! Reference computations by enumerating all assignments.
//!
//! Exponential in the number of variables; meant for checking compiled
//! circuits on small formulas. Every function returns `None` for formulas
//! over more than [`MAX_VARS`] variables.

use std::collections::BTreeMap;

use num_bigint::BigUint;

use crate::formula::Formula;
use crate::types::Var;

/// Largest number of variables enumerated.
pub const MAX_VARS: usize = 30;

fn indexed_vars(formula: &Formula) -> Option<Vec<Var>> {
    if formula.var_count() > MAX_VARS {
        return None;
    }
    Some(formula.variables().iter().copied().collect())
}

fn bit_of(vars: &[Var], mask: u64) -> impl Fn(Var) -> bool + '_ {
    move |v| match vars.binary_search(&v) {
        Ok(i) => mask >> i & 1 == 1,
        Err(_) => false,
    }
}

/// Probability that `formula` holds when each variable is independently true
/// with probability `prob(var)`.
pub fn probability<P>(formula: &Formula, prob: P) -> Option<f64>
where
    P: Fn(Var) -> f64,
{
    let vars = indexed_vars(formula)?;
    let mut total = 0.0;
    for mask in 0..1u64 << vars.len() {
        if !formula.eval(&bit_of(&vars, mask)) {
            continue;
        }
        let weight: f64 = vars
            .iter()
            .enumerate()
            .map(|(i, &v)| if mask >> i & 1 == 1 { prob(v) } else { 1.0 - prob(v) })
            .product();
        total += weight;
    }
    Some(total)
}

/// Number of satisfying assignments over the formula's own variables.
pub fn model_count(formula: &Formula) -> Option<BigUint> {
    let vars = indexed_vars(formula)?;
    let mut count = BigUint::ZERO;
    for mask in 0..1u64 << vars.len() {
        if formula.eval(&bit_of(&vars, mask)) {
            count += 1u32;
        }
    }
    Some(count)
}

/// For each variable, the number of assignments of the other variables under
/// which flipping it flips the formula (the raw Banzhaf count).
pub fn swing_counts(formula: &Formula) -> Option<BTreeMap<Var, BigUint>> {
    let vars = indexed_vars(formula)?;
    let mut counts: BTreeMap<Var, BigUint> =
        vars.iter().map(|&v| (v, BigUint::ZERO)).collect();

    for mask in 0..1u64 << vars.len() {
        for (i, &v) in vars.iter().enumerate() {
            if mask >> i & 1 == 1 {
                continue;
            }
            let low = formula.eval(&bit_of(&vars, mask));
            let high = formula.eval(&bit_of(&vars, mask | 1 << i));
            if low != high {
                if let Some(count) = counts.get_mut(&v) {
                    *count += 1u32;
                }
            }
        }
    }
    Some(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x(id: u32) -> Formula {
        Formula::var(Var::new(id))
    }

    #[test]
    fn test_probability_example() {
        let f = Formula::or(vec![Formula::and(vec![x(1), x(2)]), Formula::and(vec![x(1), x(3)])]);
        assert!((probability(&f, |_| 0.5).unwrap() - 0.375).abs() < 1e-12);
        assert_eq!(model_count(&f), Some(BigUint::from(3u32)));
    }

    #[test]
    fn test_probability_constant() {
        assert_eq!(probability(&Formula::TRUE, |_| 0.5), Some(1.0));
        assert_eq!(probability(&Formula::FALSE, |_| 0.5), Some(0.0));
    }

    #[test]
    fn test_swing_counts_majority() {
        // maj(x1, x2, x3): each voter decides when the others split
        let f = Formula::or(vec![
            Formula::and(vec![x(1), x(2)]),
            Formula::and(vec![x(2), x(3)]),
            Formula::and(vec![x(1), x(3)]),
        ]);
        let counts = swing_counts(&f).unwrap();
        for v in 1..=3 {
            assert_eq!(counts[&Var::new(v)], BigUint::from(2u32));
        }
    }

    #[test]
    fn test_too_many_variables() {
        let wide = Formula::or((1..=MAX_VARS as u32 + 1).map(x).collect());
        assert_eq!(probability(&wide, |_| 0.5), None);
        assert_eq!(model_count(&wide), None);
        assert_eq!(swing_counts(&wide), None);
    }
}
