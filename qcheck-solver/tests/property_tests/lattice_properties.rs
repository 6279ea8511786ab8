//! Property-based tests for the abstract value lattice
//!
//! Tests:
//! - Compatibility and meet agree with set intersection
//! - Meet is commutative
//! - Star is the top element
//! - Canonical forms are fixed points

use super::{AbsShape, SAMPLE_POINTS, abs_shape, build, point};
use proptest::prelude::*;
use qcheck_core::TermManager;
use qcheck_solver::mbqi::{AbsId, EvalCtx, Lattice};

fn contains(lat: &mut Lattice, a: AbsId, n: i64) -> bool {
    let p = point(lat, n);
    lat.is_generalization(a, p)
}

#[cfg(test)]
mod meet_properties {
    use super::*;

    proptest! {
        #[test]
        fn compatibility_is_symmetric(a in abs_shape(), b in abs_shape()) {
            let mut lat = Lattice::new();
            let (a, b) = (build(&mut lat, &a), build(&mut lat, &b));
            prop_assert_eq!(lat.is_compatible(a, b), lat.is_compatible(b, a));
        }

        #[test]
        fn meet_commutes(a in abs_shape(), b in abs_shape()) {
            let mut lat = Lattice::new();
            let (a, b) = (build(&mut lat, &a), build(&mut lat, &b));
            prop_assume!(lat.is_compatible(a, b));
            let ab = lat.mk_meet(a, b);
            let ba = lat.mk_meet(b, a);
            prop_assert!(lat.is_eq_abs(ab, ba));
        }

        #[test]
        fn meet_is_intersection(a in abs_shape(), b in abs_shape()) {
            let mut lat = Lattice::new();
            let (a, b) = (build(&mut lat, &a), build(&mut lat, &b));
            let mut shared = false;
            for n in SAMPLE_POINTS {
                shared |= contains(&mut lat, a, n) && contains(&mut lat, b, n);
            }
            prop_assert_eq!(lat.is_compatible(a, b), shared);
            if shared {
                let m = lat.mk_meet(a, b);
                prop_assert!(lat.is_generalization(a, m));
                prop_assert!(lat.is_generalization(b, m));
                for n in SAMPLE_POINTS {
                    let both = contains(&mut lat, a, n) && contains(&mut lat, b, n);
                    prop_assert_eq!(contains(&mut lat, m, n), both);
                }
            }
        }

        #[test]
        fn star_is_top(a in abs_shape()) {
            let mut lat = Lattice::new();
            let a = build(&mut lat, &a);
            let star = lat.mk_star();
            prop_assert!(lat.is_compatible(star, a));
            prop_assert!(lat.is_compatible(a, star));
            prop_assert!(lat.is_generalization(star, a));
            prop_assert_eq!(lat.mk_meet(star, a), a);
            prop_assert_eq!(lat.mk_meet(a, star), a);
        }

        #[test]
        fn generalization_is_containment(a in abs_shape(), b in abs_shape()) {
            let mut lat = Lattice::new();
            let (a, b) = (build(&mut lat, &a), build(&mut lat, &b));
            if lat.is_generalization(a, b) {
                for n in SAMPLE_POINTS {
                    if contains(&mut lat, b, n) {
                        prop_assert!(contains(&mut lat, a, n));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod canon_properties {
    use super::*;

    proptest! {
        #[test]
        fn canon_is_idempotent(slots in proptest::collection::vec(abs_shape(), 1..4)) {
            let mut tm = TermManager::new();
            let mut ctx = EvalCtx::new(&tm);
            let abs: Vec<AbsId> = slots.iter().map(|s: &AbsShape| build(&mut ctx, s)).collect();
            let c = ctx.mk_cond(abs);
            let once = ctx.mk_canon(&mut tm, c);
            let twice = ctx.mk_canon(&mut tm, once);
            prop_assert_eq!(once, twice);
            // integer conditions are already canonical
            prop_assert_eq!(once, c);
        }
    }
}
