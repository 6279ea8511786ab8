//! Property-based tests for qcheck-solver
//!
//! Laws of the abstract value lattice and invariants of the definition
//! combinators, checked against concrete integer points.

mod def_properties;
mod lattice_properties;

use num_bigint::BigInt;
use proptest::prelude::*;
use qcheck_solver::mbqi::{AbsId, CondId, Def, Lattice};

/// Shape of an abstract value over small integers
#[derive(Debug, Clone)]
pub enum AbsShape {
    Star,
    Point(i64),
    Range(Option<i64>, Option<i64>),
}

pub fn abs_shape() -> impl Strategy<Value = AbsShape> {
    let bound = || proptest::option::of(-20i64..20);
    prop_oneof![
        Just(AbsShape::Star),
        (-20i64..20).prop_map(AbsShape::Point),
        (bound(), bound()).prop_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) => AbsShape::Range(Some(a.min(b)), Some(a.max(b))),
            (a, b) => AbsShape::Range(a, b),
        }),
    ]
}

pub fn build(lat: &mut Lattice, shape: &AbsShape) -> AbsId {
    match *shape {
        AbsShape::Star => lat.mk_star(),
        AbsShape::Point(n) => {
            let v = lat.mk_int(BigInt::from(n));
            lat.mk_value(v)
        }
        AbsShape::Range(l, u) => {
            let l = l.map(|l| lat.mk_int(BigInt::from(l)));
            let u = u.map(|u| lat.mk_int(BigInt::from(u)));
            lat.mk_interval(l, u)
        }
    }
}

pub fn point(lat: &mut Lattice, n: i64) -> AbsId {
    let v = lat.mk_int(BigInt::from(n));
    lat.mk_value(v)
}

/// Points the properties sample; every non-empty intersection of
/// generated values contains one of them
pub const SAMPLE_POINTS: std::ops::RangeInclusive<i64> = -25..=25;

/// Value tuple of the first entry whose condition contains the point
pub fn first_match(lat: &mut Lattice, def: &Def, n: &[i64]) -> Option<Vec<BigInt>> {
    let slots: Vec<AbsId> = n.iter().map(|&n| point(lat, n)).collect();
    let at: CondId = lat.mk_cond(slots);
    def.entries()
        .iter()
        .find(|&&(c, _)| lat.is_generalization_cond(c, at))
        .map(|&(_, t)| {
            lat.tuple(t)
                .iter()
                .map(|&v| lat.val(v).as_int().cloned().unwrap_or_default())
                .collect()
        })
}
