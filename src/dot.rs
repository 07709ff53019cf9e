//! Circuit to DOT (Graphviz) conversion.
//!
//! Renders the value DAG reachable from the root of a [`BooleanCircuit`]:
//! - **Terminals** (variables and constants) are boxes at the bottom (sink rank)
//! - **Combinators** are labelled `∨` (union), `∧` (product) or `mux(x)`
//! - **Edges** of a mux: solid to the high branch, dashed to the low branch,
//!   dotted to the selector
//!
//! ```
//! use banzhaf_rs::circuit::{BooleanCircuit, CircuitConfig};
//! use banzhaf_rs::formula::Formula;
//! use banzhaf_rs::types::Var;
//!
//! let f = Formula::and(vec![Formula::var(Var::new(1)), Formula::var(Var::new(2))]);
//! let circuit = BooleanCircuit::new(&f, &CircuitConfig::default()).unwrap();
//! let dot = circuit.to_dot().unwrap();
//! assert!(dot.starts_with("digraph"));
//! // Render with: dot -Tpng circuit.dot -o circuit.png
//! ```

use std::fmt::Write as _;

use crate::circuit::BooleanCircuit;
use crate::value::{Combinator, Value};

fn node_label(value: &Value) -> String {
    match &value.op {
        Combinator::Leaf => value.label.clone().unwrap_or_else(|| "?".to_string()),
        Combinator::Union(_) => "∨".to_string(),
        Combinator::Product(_) => "∧".to_string(),
        Combinator::Mux { .. } => value.label.clone().unwrap_or_else(|| "mux".to_string()),
    }
}

impl BooleanCircuit {
    /// DOT representation of the value DAG, annotated with `p` and `grad`.
    pub fn to_dot(&self) -> Result<String, std::fmt::Error> {
        let arena = self.arena();
        let order = arena.topo_order(self.root().value);

        let mut dot = String::new();
        writeln!(dot, "digraph {{")?;
        writeln!(dot, "node [shape=ellipse];")?;

        writeln!(dot, "{{ rank=sink")?;
        for &id in &order {
            let value = arena.get(id);
            if value.op == Combinator::Leaf {
                writeln!(
                    dot,
                    "{} [shape=box, label=\"{}\\np={:.4}\\ngrad={:.4}\"];",
                    id.index(),
                    node_label(value),
                    value.prob,
                    value.grad
                )?;
            }
        }
        writeln!(dot, "}}")?;

        for &id in &order {
            let value = arena.get(id);
            match &value.op {
                Combinator::Leaf => continue,
                Combinator::Union(ops) | Combinator::Product(ops) => {
                    for op in ops {
                        writeln!(dot, "{} -> {};", id.index(), op.index())?;
                    }
                }
                Combinator::Mux {
                    high,
                    low,
                    selector,
                } => {
                    writeln!(dot, "{} -> {} [style=solid];", id.index(), high.index())?;
                    writeln!(dot, "{} -> {} [style=dashed];", id.index(), low.index())?;
                    writeln!(dot, "{} -> {} [style=dotted];", id.index(), selector.index())?;
                }
            }
            writeln!(
                dot,
                "{} [label=\"{}\\np={:.4}\"];",
                id.index(),
                node_label(value),
                value.prob
            )?;
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}

#[cfg(test)]
mod tests {
    use crate::circuit::{BooleanCircuit, CircuitConfig};
    use crate::formula::Formula;
    use crate::types::Var;

    #[test]
    fn test_dot_mux() {
        let x = |i| Formula::var(Var::new(i));
        let f = Formula::or(vec![Formula::and(vec![x(1), x(2)]), Formula::and(vec![x(1), x(3)])]);
        let circuit = BooleanCircuit::new(&f, &CircuitConfig::default()).unwrap();
        let dot = circuit.to_dot().unwrap();
        println!("{}", dot);
        assert!(dot.contains("mux(x1)"));
        assert!(dot.contains("style=dotted"));
        assert!(dot.contains("FALSE"));
        assert!(dot.contains("∨"));
        assert!(dot.trim_end().ends_with('}'));
    }
}
