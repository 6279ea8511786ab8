//! Term traversal: bound-variable substitution and variable collection

use super::{TermId, TermKind, TermManager};
use crate::error::{QcheckError, Result};
use rustc_hash::{FxHashMap, FxHashSet};

/// Replace `BoundVar(i)` by `subst[i]` throughout `term`.
///
/// Quantifiers inside `term` are left untouched; their bodies refer to their
/// own variables. Indices outside `subst` are kept as they are.
pub fn substitute_bound(tm: &mut TermManager, term: TermId, subst: &[TermId]) -> Result<TermId> {
    let mut cache = FxHashMap::default();
    substitute_rec(tm, term, subst, &mut cache)
}

fn substitute_rec(
    tm: &mut TermManager,
    term: TermId,
    subst: &[TermId],
    cache: &mut FxHashMap<TermId, TermId>,
) -> Result<TermId> {
    if tm.is_ground(term) {
        return Ok(term);
    }
    if let Some(&done) = cache.get(&term) {
        return Ok(done);
    }
    let kind = tm.try_get(term)?.kind.clone();
    let result = match kind {
        TermKind::BoundVar(i) => subst.get(i as usize).copied().unwrap_or(term),
        TermKind::Forall { .. } => term,
        kind => {
            let children = kind.children();
            let mut changed = false;
            let mut new_children = Vec::with_capacity(children.len());
            for &child in &children {
                let new_child = substitute_rec(tm, child, subst, cache)?;
                changed |= new_child != child;
                new_children.push(new_child);
            }
            if changed {
                tm.rebuild(term, &new_children)?
            } else {
                term
            }
        }
    };
    cache.insert(term, result);
    Ok(result)
}

/// Instantiate a universal quantifier with one witness per bound variable,
/// returning the ground instance of its body.
pub fn instantiate(tm: &mut TermManager, quantifier: TermId, witnesses: &[TermId]) -> Result<TermId> {
    let (num_vars, body) = match tm.kind(quantifier) {
        Some(TermKind::Forall { vars, body }) => (vars.len(), *body),
        Some(_) => return Err(QcheckError::NotAQuantifier(quantifier)),
        None => return Err(QcheckError::UnknownTerm(quantifier)),
    };
    if num_vars != witnesses.len() {
        return Err(QcheckError::arity("forall", num_vars, witnesses.len()));
    }
    substitute_bound(tm, body, witnesses)
}

/// Indices of the bound variables occurring free in `term`
pub fn bound_vars(tm: &TermManager, term: TermId) -> FxHashSet<u32> {
    let mut found = FxHashSet::default();
    let mut visited = FxHashSet::default();
    let mut stack = vec![term];
    while let Some(t) = stack.pop() {
        if tm.is_ground(t) || !visited.insert(t) {
            continue;
        }
        match tm.kind(t) {
            Some(TermKind::BoundVar(i)) => {
                found.insert(*i);
            }
            Some(TermKind::Forall { .. }) | None => {}
            Some(kind) => stack.extend(kind.children()),
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    #[test]
    fn test_instantiate_replaces_every_occurrence() {
        let mut tm = TermManager::new();
        let int = tm.sorts.int_sort;
        let x = tm.mk_bound_var(0, int);
        let y = tm.mk_bound_var(1, int);
        let fx = tm.mk_apply("f", [x, y], int);
        let body = tm.mk_lt(fx, x);
        let q = tm.mk_forall([("x", int), ("y", int)], body);

        let one = tm.mk_int(BigInt::from(1));
        let two = tm.mk_int(BigInt::from(2));
        let inst = instantiate(&mut tm, q, &[one, two]).unwrap();

        let f12 = tm.mk_apply("f", [one, two], int);
        let expected = tm.mk_lt(f12, one);
        assert_eq!(inst, expected);
        assert!(tm.is_ground(inst));
    }

    #[test]
    fn test_instantiate_arity_checked() {
        let mut tm = TermManager::new();
        let int = tm.sorts.int_sort;
        let x = tm.mk_bound_var(0, int);
        let body = tm.mk_eq(x, x);
        let q = tm.mk_forall([("x", int)], body);
        let err = instantiate(&mut tm, q, &[]).unwrap_err();
        assert!(matches!(err, QcheckError::ArityMismatch { expected: 1, actual: 0, .. }));

        let err = instantiate(&mut tm, body, &[x]).unwrap_err();
        assert_eq!(err, QcheckError::NotAQuantifier(body));
    }

    #[test]
    fn test_bound_vars_collection() {
        let mut tm = TermManager::new();
        let int = tm.sorts.int_sort;
        let x = tm.mk_bound_var(0, int);
        let z = tm.mk_bound_var(2, int);
        let c = tm.mk_var("c", int);
        let sum = tm.mk_add([x, c, z]);
        let vars = bound_vars(&tm, sum);
        assert_eq!(vars.len(), 2);
        assert!(vars.contains(&0) && vars.contains(&2));
        assert!(bound_vars(&tm, c).is_empty());
    }
}
