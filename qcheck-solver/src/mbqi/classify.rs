//! Model-checkable fragment of a quantifier body
//!
//! The definition-based evaluator can only keep a bound variable symbolic in
//! a few positions: directly under an uninterpreted application, as the
//! variable side of a comparison, or inside a variable-offset argument of an
//! uninterpreted application. A body is split into disjuncts and only the
//! disjuncts using variables in those positions are handed to `do_check`.

use qcheck_core::{Op, TermId, TermKind, TermManager};
use smallvec::SmallVec;

/// `op(x, other)`, or `op(other, x)` when `flipped`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarRelation {
    pub var: u32,
    pub op: Op,
    pub other: TermId,
    pub flipped: bool,
}

/// `x + t`, `t + x`, `x - t`, `t - x` or `-x`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarOffsetPattern {
    pub var: u32,
    /// The offset term; `None` for a bare negation
    pub other: Option<TermId>,
    /// The variable occurs negated (`t - x`, `-x`)
    pub negated: bool,
    /// The offset is subtracted (`x - t`)
    pub subtract: bool,
}

/// The part of a body handed to the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Checkable disjunction, if any disjunct is checkable
    pub fragment: Option<TermId>,
    /// Every disjunct is checkable, so the fragment is the whole body
    pub fully_checkable: bool,
}

fn bound_var(tm: &TermManager, t: TermId) -> Option<u32> {
    tm.bound_var_index(t)
}

/// Recognize a comparison between a bound variable and a non-variable term
pub fn var_relation(tm: &TermManager, term: TermId) -> Option<VarRelation> {
    let kind = tm.kind(term)?;
    let op = kind.op()?;
    if !(op == Op::Eq || op.is_int_relation()) {
        return None;
    }
    let &[lhs, rhs] = kind.children().as_slice() else {
        return None;
    };
    match (bound_var(tm, lhs), bound_var(tm, rhs)) {
        (Some(var), None) => Some(VarRelation {
            var,
            op,
            other: rhs,
            flipped: false,
        }),
        (None, Some(var)) => Some(VarRelation {
            var,
            op,
            other: lhs,
            flipped: true,
        }),
        _ => None,
    }
}

/// Recognize an integer offset of a bound variable
pub fn var_offset(tm: &TermManager, term: TermId) -> Option<VarOffsetPattern> {
    let pattern = |var, other, negated, subtract| VarOffsetPattern {
        var,
        other,
        negated,
        subtract,
    };
    match tm.kind(term)? {
        TermKind::Neg(a) => bound_var(tm, *a).map(|var| pattern(var, None, true, false)),
        TermKind::Add(args) => {
            let &[a, b] = args.as_slice() else {
                return None;
            };
            match (bound_var(tm, a), bound_var(tm, b)) {
                (Some(var), None) => Some(pattern(var, Some(b), false, false)),
                (None, Some(var)) => Some(pattern(var, Some(a), false, false)),
                _ => None,
            }
        }
        TermKind::Sub(a, b) => match (bound_var(tm, *a), bound_var(tm, *b)) {
            (Some(var), None) => Some(pattern(var, Some(*b), false, true)),
            (None, Some(var)) => Some(pattern(var, Some(*a), true, false)),
            _ => None,
        },
        _ => None,
    }
}

/// Whether the evaluator can process `term` with its variables symbolic
pub fn is_checkable(tm: &TermManager, term: TermId) -> bool {
    checkable(tm, term, false)
}

fn checkable(tm: &TermManager, term: TermId, under_uninterpreted: bool) -> bool {
    // closed quantifiers count as ground, so no early exit on groundness
    let Some(kind) = tm.kind(term) else {
        return false;
    };
    match kind {
        TermKind::BoundVar(_) => under_uninterpreted,
        TermKind::Forall { .. } => false,
        TermKind::Apply { args, .. } => args.iter().all(|&arg| match var_offset(tm, arg) {
            Some(VarOffsetPattern { other: Some(t), .. }) => checkable(tm, t, false),
            Some(VarOffsetPattern { other: None, .. }) => true,
            None => checkable(tm, arg, true),
        }),
        _ => match var_relation(tm, term) {
            Some(rel) => checkable(tm, rel.other, false),
            None => kind.children().iter().all(|&c| checkable(tm, c, false)),
        },
    }
}

/// Split `body` into disjuncts and keep the checkable ones
pub fn classify(tm: &mut TermManager, body: TermId) -> Classification {
    let disjuncts: SmallVec<[TermId; 4]> = match tm.kind(body) {
        Some(TermKind::Or(args)) => args.clone(),
        Some(&TermKind::Implies(a, b)) => {
            let not_a = tm.mk_not(a);
            SmallVec::from_slice(&[not_a, b])
        }
        _ => SmallVec::from_slice(&[body]),
    };
    let checkable: SmallVec<[TermId; 4]> = disjuncts
        .iter()
        .copied()
        .filter(|&d| is_checkable(tm, d))
        .collect();
    let fully_checkable = checkable.len() == disjuncts.len();
    let fragment = if fully_checkable {
        Some(body)
    } else {
        match checkable.as_slice() {
            [] => None,
            [single] => Some(*single),
            _ => Some(tm.mk_or(checkable.iter().copied())),
        }
    };
    Classification {
        fragment,
        fully_checkable,
    }
}
