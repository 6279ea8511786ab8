//! Property-based tests for terms and substitution
//!
//! Tests:
//! - Structurally equal terms share an id
//! - Substituting every variable yields a ground term
//! - The identity substitution is a no-op
//! - Collected variables are exactly the substituted ones

use num_bigint::BigInt;
use proptest::prelude::*;
use qcheck_core::ast::traversal::{bound_vars, instantiate, substitute_bound};
use qcheck_core::{TermId, TermManager};

const NUM_VARS: u32 = 3;

#[derive(Debug, Clone)]
enum Expr {
    Const(i64),
    Var(u32),
    Add(Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Apply(Box<Expr>),
}

fn expr() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        (-10i64..10).prop_map(Expr::Const),
        (0..NUM_VARS).prop_map(Expr::Var),
    ];
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Expr::Add(Box::new(a), Box::new(b))),
            inner.clone().prop_map(|a| Expr::Neg(Box::new(a))),
            inner.prop_map(|a| Expr::Apply(Box::new(a))),
        ]
    })
}

fn build(tm: &mut TermManager, e: &Expr) -> TermId {
    let int = tm.sorts.int_sort;
    match e {
        Expr::Const(n) => tm.mk_int(BigInt::from(*n)),
        Expr::Var(i) => tm.mk_bound_var(*i, int),
        Expr::Add(a, b) => {
            let (a, b) = (build(tm, a), build(tm, b));
            tm.mk_add([a, b])
        }
        Expr::Neg(a) => {
            let a = build(tm, a);
            tm.mk_neg(a)
        }
        Expr::Apply(a) => {
            let a = build(tm, a);
            tm.mk_apply("f", [a], int)
        }
    }
}

fn vars_of(e: &Expr, out: &mut Vec<u32>) {
    match e {
        Expr::Const(_) => {}
        Expr::Var(i) => out.push(*i),
        Expr::Add(a, b) => {
            vars_of(a, out);
            vars_of(b, out);
        }
        Expr::Neg(a) | Expr::Apply(a) => vars_of(a, out),
    }
}

#[cfg(test)]
mod substitution_properties {
    use super::*;

    proptest! {
        #[test]
        fn hash_consing_shares_ids(e in expr()) {
            let mut tm = TermManager::new();
            let first = build(&mut tm, &e);
            let count = tm.term_count();
            let second = build(&mut tm, &e);
            prop_assert_eq!(first, second);
            prop_assert_eq!(tm.term_count(), count);
        }

        #[test]
        fn full_substitution_is_ground(e in expr(), values in proptest::collection::vec(-5i64..5, 3)) {
            let mut tm = TermManager::new();
            let t = build(&mut tm, &e);
            let subst: Vec<TermId> = values.iter().map(|&v| tm.mk_int(BigInt::from(v))).collect();
            let g = substitute_bound(&mut tm, t, &subst).unwrap();
            prop_assert!(tm.is_ground(g));
            prop_assert!(bound_vars(&tm, g).is_empty());
        }

        #[test]
        fn identity_substitution_is_noop(e in expr()) {
            let mut tm = TermManager::new();
            let int = tm.sorts.int_sort;
            let t = build(&mut tm, &e);
            let ids: Vec<TermId> = (0..NUM_VARS).map(|i| tm.mk_bound_var(i, int)).collect();
            prop_assert_eq!(substitute_bound(&mut tm, t, &ids).unwrap(), t);
        }

        #[test]
        fn bound_vars_match_structure(e in expr()) {
            let mut tm = TermManager::new();
            let t = build(&mut tm, &e);
            let mut expected = Vec::new();
            vars_of(&e, &mut expected);
            expected.sort_unstable();
            expected.dedup();
            let mut found: Vec<u32> = bound_vars(&tm, t).into_iter().collect();
            found.sort_unstable();
            prop_assert_eq!(found, expected.clone());
            prop_assert_eq!(tm.is_ground(t), expected.is_empty());
        }

        #[test]
        fn instantiate_checks_arity(e in expr(), n in 0usize..5) {
            let mut tm = TermManager::new();
            let int = tm.sorts.int_sort;
            let body = build(&mut tm, &e);
            let zero = tm.mk_int(BigInt::from(0));
            let prop = tm.mk_ge(body, zero);
            let q = tm.mk_forall([("x", int), ("y", int), ("z", int)], prop);
            let witnesses = vec![zero; n];
            let result = instantiate(&mut tm, q, &witnesses);
            prop_assert_eq!(result.is_ok(), n == NUM_VARS as usize);
        }
    }
}
