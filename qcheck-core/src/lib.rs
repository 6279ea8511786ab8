//! QCheck Core - terms, sorts and errors for the quantifier model checker
//!
//! This crate provides the term layer the model checker in `qcheck-solver`
//! is written against:
//! - Hash-consed terms with cheap [`TermId`] handles
//! - A small sort system (Bool, Int, bit-vectors, uninterpreted sorts)
//! - Bound-variable substitution for building instantiation lemmas
//!
//! # Examples
//!
//! ```
//! use qcheck_core::ast::{TermManager, traversal};
//! use num_bigint::BigInt;
//!
//! let mut tm = TermManager::new();
//! let int = tm.sorts.int_sort;
//!
//! // forall x. f(x) >= 0
//! let x = tm.mk_bound_var(0, int);
//! let fx = tm.mk_apply("f", [x], int);
//! let zero = tm.mk_int(BigInt::from(0));
//! let body = tm.mk_ge(fx, zero);
//! let q = tm.mk_forall([("x", int)], body);
//!
//! let five = tm.mk_int(BigInt::from(5));
//! let lemma = traversal::instantiate(&mut tm, q, &[five]).unwrap();
//! assert!(tm.is_ground(lemma));
//! ```

#![deny(unsafe_code)]

pub mod ast;
pub mod error;
pub mod sort;

pub use ast::{Op, Term, TermId, TermKind, TermManager};
pub use error::{QcheckError, Result};
pub use sort::{Sort, SortId, SortKind, SortManager};
