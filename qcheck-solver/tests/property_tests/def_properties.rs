//! Property-based tests for definitions and their combinators
//!
//! Tests:
//! - No entry is generalized by an earlier one
//! - Products agree with both factors at every point
//! - Composition with and without early exit agree at every point
//! - Indexed lookup agrees with a linear scan

use super::{AbsShape, SAMPLE_POINTS, abs_shape, build, first_match};
use num_bigint::BigInt;
use proptest::prelude::*;
use qcheck_core::{TermId, TermManager};
use qcheck_solver::mbqi::{Def, DefId, EvalCtx, IndexedDef};

fn entries() -> impl Strategy<Value = Vec<(AbsShape, i64)>> {
    proptest::collection::vec((abs_shape(), -5i64..5), 0..8)
}

/// One-variable definition from generated entries
fn mk_def(ctx: &mut EvalCtx, rows: &[(AbsShape, i64)]) -> DefId {
    let mut def = Def::new();
    for (shape, value) in rows {
        let a = build(ctx, shape);
        let c = ctx.mk_cond([a]);
        let v = ctx.mk_int(BigInt::from(*value));
        let t = ctx.mk_value_tuple(v);
        def.append_entry(ctx.lattice(), c, t);
    }
    ctx.alloc_def(def)
}

#[cfg(test)]
mod subsumption_properties {
    use super::*;

    proptest! {
        #[test]
        fn no_entry_generalized_by_earlier(rows in proptest::collection::vec((abs_shape(), abs_shape()), 0..10)) {
            let tm = TermManager::new();
            let mut ctx = EvalCtx::new(&tm);
            let zero = ctx.mk_int(BigInt::from(0));
            let t = ctx.mk_value_tuple(zero);
            let mut def = Def::new();
            let mut rejected = Vec::new();
            for (x, y) in &rows {
                let (a, b) = (build(&mut ctx, x), build(&mut ctx, y));
                let c = ctx.mk_cond([a, b]);
                if !def.append_entry(ctx.lattice(), c, t) {
                    rejected.push(c);
                }
            }
            for i in 0..def.len() {
                for j in i + 1..def.len() {
                    prop_assert!(!ctx.is_generalization_cond(def.condition(i), def.condition(j)));
                }
            }
            for c in rejected {
                prop_assert!(def.entries().iter().any(|&(k, _)| ctx.is_generalization_cond(k, c)));
            }
        }
    }
}

#[cfg(test)]
mod combinator_properties {
    use super::*;

    proptest! {
        #[test]
        fn product_agrees_pointwise(left in entries(), right in entries()) {
            let tm = TermManager::new();
            let mut ctx = EvalCtx::new(&tm);
            let (d1, d2) = (mk_def(&mut ctx, &left), mk_def(&mut ctx, &right));
            let p = ctx.mk_product(d1, d2);
            let (def1, def2, prod) = (ctx.def(d1).clone(), ctx.def(d2).clone(), ctx.def(p).clone());
            for n in SAMPLE_POINTS {
                let expected = match (first_match(&mut ctx, &def1, &[n]), first_match(&mut ctx, &def2, &[n])) {
                    (Some(mut a), Some(b)) => {
                        a.extend(b);
                        Some(a)
                    }
                    _ => None,
                };
                prop_assert_eq!(first_match(&mut ctx, &prod, &[n]), expected);
            }
        }

        #[test]
        fn compose_early_exit_agrees(
            callee in entries(),
            args in proptest::collection::vec((abs_shape(), proptest::option::of(-5i64..5), -3i64..3), 0..6),
        ) {
            let tm = TermManager::new();
            let mut ctx = EvalCtx::new(&tm);
            let df = mk_def(&mut ctx, &callee);
            // argument entries: a fixed value, or x + k
            let mut arg_def = Def::new();
            for (shape, fixed, k) in &args {
                let a = build(&mut ctx, shape);
                let c = ctx.mk_cond([a]);
                let v = match fixed {
                    Some(n) => ctx.mk_int(BigInt::from(*n)),
                    None => {
                        let k = ctx.mk_int(BigInt::from(*k));
                        ctx.mk_var_offset_val(0, Some(k), false)
                    }
                };
                let t = ctx.mk_value_tuple(v);
                arg_def.append_entry(ctx.lattice(), c, t);
            }
            let da = ctx.alloc_def(arg_def);
            let eager = ctx.mk_compose_with(df, da, true);
            let full = ctx.mk_compose_with(df, da, false);
            let (eager, full) = (ctx.def(eager).clone(), ctx.def(full).clone());
            for n in SAMPLE_POINTS {
                prop_assert_eq!(first_match(&mut ctx, &eager, &[n]), first_match(&mut ctx, &full, &[n]));
            }
        }
    }
}

#[cfg(test)]
mod index_properties {
    use super::*;

    proptest! {
        #[test]
        fn binary_search_matches_linear(rows in proptest::collection::vec((0u32..6, 0u32..6, 100u32..200), 0..30)) {
            let mut def = IndexedDef::new(2);
            let mut first = std::collections::HashMap::new();
            for &(a, b, r) in &rows {
                let added = def.append_entry(&[TermId(a), TermId(b)], TermId(r));
                prop_assert_eq!(added, !first.contains_key(&(a, b)));
                first.entry((a, b)).or_insert(r);
            }
            def.set_else(TermId(1));
            for a in 0..7 {
                for b in 0..7 {
                    let key = [TermId(a), TermId(b)];
                    prop_assert_eq!(def.evaluate(&key), def.evaluate_linear(&key));
                    let expected = first.get(&(a, b)).map(|&r| TermId(r)).unwrap_or(TermId(1));
                    prop_assert_eq!(def.evaluate(&key), Some(expected));
                }
            }
        }
    }
}
