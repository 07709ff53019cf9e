//! # banzhaf-rs: power indices of monotone Boolean formulas
//!
//! **`banzhaf-rs`** computes a Banzhaf-style power index for every variable of
//! a monotone Boolean formula built from AND/OR. Instead of enumerating all
//! assignments, it compiles the formula into a decomposable arithmetic circuit
//! and runs a single reverse-mode pass over it.
//!
//! ## How it works
//!
//! - **Independence decomposition**: children of a gate that share no
//!   variables are compiled separately and combined with closed-form
//!   union/product rules.
//! - **Expansion**: a gate whose children are all entangled is conditioned on
//!   the variable occurring in the most children, giving a mux of two smaller
//!   sub-circuits.
//! - **Reverse mode**: one backward pass over the value arena yields the
//!   derivative of the root probability with respect to every variable at
//!   once.
//!
//! Compilation is time-boxed: fully entangled formulas can need exponentially
//! many expansions, and construction aborts once the configured budget is used.
//!
//! ## Basic Usage
//!
//! ```rust
//! use banzhaf_rs::circuit::{BooleanCircuit, CircuitConfig};
//! use banzhaf_rs::parse::parse_str;
//!
//! let (formula, names) = parse_str(
//!     r#"{"operator": "or", "subformula": [
//!         {"operator": "and", "subformula": ["a", "b"]},
//!         {"operator": "and", "subformula": ["a", "c"]}
//!     ]}"#,
//! )
//! .unwrap();
//!
//! let mut circuit = BooleanCircuit::new(&formula, &CircuitConfig::default()).unwrap();
//! circuit.label_with(&names);
//!
//! for (label, index) in circuit.banzhaf_values() {
//!     println!("{label}: {index}");
//! }
//! ```
//!
//! ## Core Components
//!
//! - **[`formula`]**: formulas and conditioning.
//! - **[`decompose`]**: independence decomposition and pivot expansion.
//! - **[`value`]**: the differentiable probability arena.
//! - **[`circuit`]**: the compilation driver, [`BooleanCircuit`][crate::circuit::BooleanCircuit].
//! - **[`brute`]**: enumeration-based reference results.

pub mod brute;
pub mod circuit;
pub mod decompose;
pub mod dot;
pub mod error;
pub mod formula;
pub mod parse;
pub mod types;
pub mod union_find;
pub mod value;
