//! QCheck Solver - model-guided checking of quantified formulas
//!
//! This crate decides universally quantified formulas against a candidate
//! model and produces the instantiation lemmas that refute them:
//! - Symbolic evaluation of quantifier bodies over condition/value tables
//! - Heuristic search over the model's function tables
//! - Exhaustive instantiation over small finite domains
//!
//! # Examples
//!
//! ```
//! use qcheck_core::ast::{TermManager, traversal};
//! use qcheck_solver::mbqi::{CheckResult, EvalCtx, QuantifiedFormula, TableModel};
//! use num_bigint::BigInt;
//!
//! let mut tm = TermManager::new();
//! let int = tm.sorts.int_sort;
//!
//! // f = { 1 -> -1, else -> 5 }
//! let mut model = TableModel::new();
//! let f = model.declare_function(&mut tm, "f", 1);
//! let one = tm.mk_int(BigInt::from(1));
//! let minus_one = tm.mk_int(BigInt::from(-1));
//! let five = tm.mk_int(BigInt::from(5));
//! model.add_entry(&tm, f, &[one], minus_one).unwrap();
//! model.set_else(&tm, f, five).unwrap();
//!
//! // forall x. f(x) >= 0
//! let x = tm.mk_bound_var(0, int);
//! let fx = tm.mk_apply("f", [x], int);
//! let zero = tm.mk_int(BigInt::from(0));
//! let body = tm.mk_ge(fx, zero);
//! let term = tm.mk_forall([("x", int)], body);
//! let q = QuantifiedFormula::from_term(&tm, term).unwrap();
//!
//! let mut ctx = EvalCtx::new(&tm);
//! let result = ctx.check(&mut tm, &mut model, &q).unwrap();
//! let lemma = traversal::instantiate(&mut tm, term, &[one]).unwrap();
//! assert_eq!(result, CheckResult::Refuted(vec![lemma]));
//! ```

#![deny(unsafe_code)]

pub mod mbqi;

pub use mbqi::{CheckResult, EvalCheck, EvalCtx, MbqiConfig, QuantifiedFormula, TableModel};
