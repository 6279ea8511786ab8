//! Definition-based model checking of a quantifier
//!
//! [`EvalCtx::do_check`] computes the [`Def`](super::def::Def) of a term as a function of the
//! bound variables, bottom-up: leaves become one-entry definitions, argument
//! definitions are combined with `mk_product`, uninterpreted applications
//! compose with the model's definition of the callee and interpreted ones
//! are evaluated entry by entry. Comparisons and offsets of a bare variable
//! are specialized so the variable's slot stays informative.
//!
//! [`EvalCtx::check`] reads the false entries of the body's definition off as
//! falsifying regions and turns each into an instantiation lemma.

use super::classify::{self, VarOffsetPattern};
use super::context::EvalCtx;
use super::model::{ModelConstructor, RelevantTerm};
use super::value::{AbsId, AbsVal, CondId, CondSlots, DefId, Val};
use super::{CheckResult, QuantifiedFormula};
use num_bigint::BigInt;
use num_traits::{Euclid, One, Zero};
use qcheck_core::ast::traversal::{instantiate, substitute_bound};
use qcheck_core::{Result, SortKind, TermId, TermKind, TermManager};
use rustc_hash::FxHashSet;
use tracing::{debug, trace, warn};

/// Largest bit-vector width enumerated by exhaustive instantiation
const MAX_ENUM_BV_WIDTH: u32 = 16;

/// Whether a witness must also falsify the ground body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroundCheck {
    /// The definition decides
    Skip,
    /// Only part of the body was evaluated symbolically
    Partial,
    /// The whole body was evaluated; a disagreement points at the model
    Verify,
}

impl EvalCtx {
    /// Definition of `term` over the variables of `q`; `None` when some
    /// subterm cannot be evaluated.
    pub fn do_check<M: ModelConstructor + ?Sized>(
        &mut self,
        tm: &mut TermManager,
        model: &mut M,
        q: &QuantifiedFormula,
        term: TermId,
    ) -> Option<DefId> {
        let d = self.do_check_inner(tm, model, q, term)?;
        trace!(
            term = %tm.display(term),
            def = %self.def(d).display(self.lattice(), tm),
            "definition"
        );
        Some(d)
    }

    fn do_check_inner<M: ModelConstructor + ?Sized>(
        &mut self,
        tm: &mut TermManager,
        model: &mut M,
        q: &QuantifiedFormula,
        term: TermId,
    ) -> Option<DefId> {
        let star = self.mk_star(model, q);
        let kind = tm.kind(term)?.clone();
        if kind.is_value() || matches!(kind, TermKind::BoundVar(_)) {
            let v = self.mk_val(tm, term);
            return Some(self.mk_trivial_def(star, v));
        }
        match kind {
            TermKind::Forall { .. } => return None,
            TermKind::Var(name) => {
                let df = model.get_def(self, tm, name)?;
                let &(_, t) = self.def(df).entries().first()?;
                let v = *self.tuple(t).first()?;
                return Some(self.mk_trivial_def(star, v));
            }
            _ => {}
        }

        if let Some(rel) = classify::var_relation(tm, term) {
            let d = self.do_check(tm, model, q, rel.other)?;
            return self.mk_var_relation(d, rel.op, rel.var, rel.flipped);
        }
        if let Some(off) = classify::var_offset(tm, term) {
            return self.check_var_offset(tm, model, q, off, star);
        }

        let mut args: Option<DefId> = None;
        for child in kind.children() {
            let d = self.do_check(tm, model, q, child)?;
            if self.config.simplify_arguments {
                self.simplify(d);
            }
            args = Some(match args {
                None => d,
                Some(acc) => self.mk_product(acc, d),
            });
        }

        if let Some(func) = kind.uninterpreted_symbol() {
            let df = model.get_def(self, tm, func)?;
            let da = args?;
            return Some(self.mk_compose(df, da));
        }

        let op = kind.op()?;
        let Some(da) = args else {
            let v = self.evaluate(op, &[])?;
            return Some(self.mk_trivial_def(star, v));
        };
        let entries = self.def(da).entries().to_vec();
        let mut values = Vec::with_capacity(entries.len());
        for (_, t) in entries {
            let vals = self.tuple(t).to_vec();
            let v = self.evaluate(op, &vals)?;
            values.push(self.mk_value_tuple(v));
        }
        let def = self.def(da).with_values(values);
        Some(self.alloc_def(def))
    }

    fn check_var_offset<M: ModelConstructor + ?Sized>(
        &mut self,
        tm: &mut TermManager,
        model: &mut M,
        q: &QuantifiedFormula,
        off: VarOffsetPattern,
        star: CondId,
    ) -> Option<DefId> {
        let Some(other) = off.other else {
            let v = self.mk_var_offset_val(off.var, None, true);
            return Some(self.mk_trivial_def(star, v));
        };
        let mut d = self.do_check(tm, model, q, other)?;
        if off.subtract {
            d = self.map_values(d, |ctx, v| ctx.mk_negate(tm, v))?;
        }
        Some(self.mk_var_offset(d, off.var, off.negated))
    }

    /// Evaluate `q` under `model`.
    ///
    /// Each false entry of the body's definition yields at most one lemma:
    /// the quantifier instantiated with a point of the entry's region that no
    /// earlier entry claims. When the body is only partly checkable, or when
    /// instantiations are verified, the ground body must also evaluate to
    /// false at that point.
    pub fn check<M: ModelConstructor + ?Sized>(
        &mut self,
        tm: &mut TermManager,
        model: &mut M,
        q: &QuantifiedFormula,
    ) -> Result<CheckResult> {
        self.stats.num_checks += 1;
        debug!(quantifier = %tm.display(q.term), "check");
        let class = classify::classify(tm, q.body);
        let Some(fragment) = class.fragment else {
            debug!("no checkable fragment");
            return Ok(CheckResult::Undetermined);
        };
        let Some(d) = self.do_check(tm, model, q, fragment) else {
            debug!("fragment not evaluable");
            return Ok(CheckResult::Undetermined);
        };
        let ground = if !class.fully_checkable {
            GroundCheck::Partial
        } else if self.config.verify_instantiations {
            GroundCheck::Verify
        } else {
            GroundCheck::Skip
        };

        let mut lemmas = Vec::new();
        let mut seen = FxHashSet::default();
        let mut all_true = true;
        let entries = self.def(d).entries().to_vec();
        for (k, (cond, t)) in entries.into_iter().enumerate() {
            let value = self.tuple(t).first().and_then(|&v| self.as_bool(v));
            match value {
                Some(true) => {}
                Some(false) => {
                    all_true = false;
                    let Some(witness) = self.find_witness(tm, model, q, d, k, ground)? else {
                        debug!(cond = %self.show_cond(tm, cond), "no witness");
                        continue;
                    };
                    let lemma = instantiate(tm, q.term, &witness)?;
                    if seen.insert(lemma) {
                        trace!(lemma = %tm.display(lemma), "instantiation");
                        lemmas.push(lemma);
                    }
                }
                None => all_true = false,
            }
        }

        self.stats.num_lemmas += lemmas.len();
        let result = if !lemmas.is_empty() {
            CheckResult::Refuted(lemmas)
        } else if class.fully_checkable && all_true {
            CheckResult::Satisfied
        } else {
            CheckResult::Undetermined
        };
        debug!(result = ?result, "check done");
        Ok(result)
    }

    /// Witness terms for the false entry `entry` of the body definition `d`.
    ///
    /// The model's own instance for the canonical condition is tried first.
    /// When an earlier entry of `d` claims it, candidates from the relevant
    /// domain, the sort and the neighbours of the values `d` mentions are
    /// enumerated, at most `max_exhaustive_instances` of them.
    fn find_witness<M: ModelConstructor + ?Sized>(
        &mut self,
        tm: &mut TermManager,
        model: &mut M,
        q: &QuantifiedFormula,
        d: DefId,
        entry: usize,
        ground: GroundCheck,
    ) -> Result<Option<Vec<TermId>>> {
        let (cond, _) = self.def(d).entries()[entry];
        let cond = self.mk_canon(tm, cond);
        if let Some(witness) = model.get_inst(self, tm, q, cond) {
            let values: Option<Vec<TermId>> = witness
                .terms
                .iter()
                .enumerate()
                .map(|(i, &t)| self.witness_value(tm, &*model, q, i, t))
                .collect();
            if let Some(values) = values
                && self.falsifies(tm, &*model, q, d, entry, &values, ground)?
            {
                return Ok(Some(witness.terms));
            }
        }

        let slots = self.cond(cond).to_vec();
        let mut candidates = Vec::with_capacity(slots.len());
        for (i, a) in slots.into_iter().enumerate() {
            let slot = self.slot_candidates(tm, &*model, q, d, i, a);
            if slot.is_empty() {
                return Ok(None);
            }
            candidates.push(slot);
        }
        let lens: Vec<usize> = candidates.iter().map(Vec::len).collect();
        let mut odometer = vec![0usize; candidates.len()];
        for _ in 0..self.config.max_exhaustive_instances {
            let picked: Vec<RelevantTerm> =
                odometer.iter().zip(&candidates).map(|(&k, c)| c[k]).collect();
            let values: Vec<TermId> = picked.iter().map(|r| r.value).collect();
            if self.falsifies(tm, &*model, q, d, entry, &values, ground)? {
                return Ok(Some(picked.iter().map(|r| r.term).collect()));
            }
            if !next_combination(&mut odometer, &lens) {
                break;
            }
        }
        Ok(None)
    }

    /// Model value of witness term `t` for variable `var`
    fn witness_value<M: ModelConstructor + ?Sized>(
        &mut self,
        tm: &mut TermManager,
        model: &M,
        q: &QuantifiedFormula,
        var: usize,
        t: TermId,
    ) -> Option<TermId> {
        if let Some(r) = model.relevant_domain(q, var).iter().find(|r| r.term == t) {
            return Some(r.value);
        }
        if tm.is_value(t) {
            return Some(t);
        }
        self.evaluate_ground(tm, model, t)
    }

    /// The point `values` is first matched by `entry` of `d`, a false entry,
    /// and unless `ground` is `Skip`, the body of `q` evaluates to false
    /// there.
    fn falsifies<M: ModelConstructor + ?Sized>(
        &mut self,
        tm: &mut TermManager,
        model: &M,
        q: &QuantifiedFormula,
        d: DefId,
        entry: usize,
        values: &[TermId],
        ground: GroundCheck,
    ) -> Result<bool> {
        let slots: CondSlots = values
            .iter()
            .map(|&t| {
                let v = self.mk_val(tm, t);
                self.mk_value(v)
            })
            .collect();
        let point = self.mk_cond(slots);
        let first = self
            .def(d)
            .entries()
            .iter()
            .position(|&(c, _)| self.is_compatible_cond(c, point));
        if first != Some(entry) {
            return Ok(false);
        }
        if ground == GroundCheck::Skip {
            return Ok(true);
        }
        let instance = substitute_bound(tm, q.body, values)?;
        let falsified = self
            .evaluate_ground(tm, model, instance)
            .is_some_and(|v| tm.is_false(v));
        if !falsified {
            self.stats.num_rejected_witnesses += 1;
            if ground == GroundCheck::Verify {
                warn!(instance = %tm.display(instance), "instance does not falsify the body");
            } else {
                trace!(instance = %tm.display(instance), "instance satisfies another disjunct");
            }
        }
        Ok(falsified)
    }

    /// Witness candidates for slot `var` inside the abstract value `a`, each
    /// with its model value, without repeated values
    fn slot_candidates<M: ModelConstructor + ?Sized>(
        &mut self,
        tm: &mut TermManager,
        model: &M,
        q: &QuantifiedFormula,
        d: DefId,
        var: usize,
        a: AbsId,
    ) -> Vec<RelevantTerm> {
        let domain = model.relevant_domain(q, var);
        let bounds = match self.abs(a) {
            AbsVal::Value(v) => {
                let Some(value) = self.get_expr_from_val(tm, v) else {
                    return Vec::new();
                };
                let term = domain.iter().find(|r| r.value == value).map_or(value, |r| r.term);
                return vec![RelevantTerm { term, value }];
            }
            AbsVal::Star => [None, None],
            AbsVal::Interval(l, u) => [l, u],
        };

        let mut raw: Vec<RelevantTerm> = domain.to_vec();
        let mut values: Vec<TermId> = Vec::new();
        for b in bounds.into_iter().flatten() {
            values.extend(self.get_expr_from_val(tm, b));
        }
        if let Some(sort) = q.var_sort(var) {
            match tm.sorts.kind(sort).cloned() {
                Some(SortKind::Bool) => values.extend([tm.mk_false(), tm.mk_true()]),
                Some(SortKind::Int) => values.push(tm.mk_int(BigInt::zero())),
                Some(SortKind::BitVec(width)) => values.push(tm.mk_bitvec(BigInt::zero(), width)),
                Some(SortKind::Uninterpreted(_)) => values.extend_from_slice(model.universe(sort)),
                None => {}
            }
        }
        for val in self.boundary_values(d, var) {
            let v = self.intern_val(val);
            values.extend(self.get_expr_from_val(tm, v));
        }
        raw.extend(values.into_iter().map(|t| RelevantTerm { term: t, value: t }));

        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        for r in raw {
            let v = self.mk_val(tm, r.value);
            let p = self.mk_value(v);
            if self.is_generalization(a, p) && seen.insert(r.value) {
                out.push(r);
            }
        }
        out
    }

    /// Values just outside the points and intervals the entries of `d` give
    /// to slot `var`
    fn boundary_values(&self, d: DefId, var: usize) -> Vec<Val> {
        let mut out = Vec::new();
        for &(c, _) in self.def(d).entries() {
            let Some(&a) = self.cond(c).get(var) else {
                continue;
            };
            let (below, above) = match self.abs(a) {
                AbsVal::Star => continue,
                AbsVal::Value(v) => (Some(v), Some(v)),
                AbsVal::Interval(l, u) => (l, u),
            };
            out.extend(above.and_then(|v| step(self.val(v), 1)));
            out.extend(below.and_then(|v| step(self.val(v), -1)));
        }
        out
    }

    /// Instantiate `q` with every combination of candidate terms.
    ///
    /// Candidates come from the relevant domains, or when
    /// `use_relevant_domain` is false, from the finite sorts: Booleans, narrow
    /// bit-vectors and uninterpreted universes. Returns false, adding
    /// nothing, when some variable has no finite candidate set or the number
    /// of instances exceeds the configured bound.
    pub fn exhaustive_instantiate<M: ModelConstructor + ?Sized>(
        &mut self,
        tm: &mut TermManager,
        model: &M,
        q: &QuantifiedFormula,
        use_relevant_domain: bool,
        out: &mut Vec<TermId>,
    ) -> Result<bool> {
        let limit = self.config.max_exhaustive_instances;
        let mut domains: Vec<Vec<TermId>> = Vec::with_capacity(q.num_vars());
        let mut total: usize = 1;
        for i in 0..q.num_vars() {
            let Some(domain) = candidate_terms(tm, model, q, i, use_relevant_domain, limit) else {
                return Ok(false);
            };
            total = total.saturating_mul(domain.len());
            if domain.is_empty() || total > limit {
                debug!(var = i, total, "exhaustive instantiation out of bounds");
                return Ok(false);
            }
            domains.push(domain);
        }

        let lens: Vec<usize> = domains.iter().map(Vec::len).collect();
        let mut odometer = vec![0usize; domains.len()];
        loop {
            let witness: Vec<TermId> = odometer.iter().zip(&domains).map(|(&k, d)| d[k]).collect();
            out.push(instantiate(tm, q.term, &witness)?);
            if !next_combination(&mut odometer, &lens) {
                debug!(instances = total, "exhaustive instantiation complete");
                return Ok(true);
            }
        }
    }
}

/// Step the odometer, last position fastest; false once it wraps around
fn next_combination(odometer: &mut [usize], lens: &[usize]) -> bool {
    for pos in (0..odometer.len()).rev() {
        odometer[pos] += 1;
        if odometer[pos] < lens[pos] {
            return true;
        }
        odometer[pos] = 0;
    }
    false
}

/// The numeral `delta` away from `v`, wrapping for bit-vectors
fn step(v: &Val, delta: i64) -> Option<Val> {
    match v {
        Val::Int(n) => Some(Val::Int(n + delta)),
        Val::Bv { value, width } => {
            let modulus = BigInt::one() << *width;
            Some(Val::Bv {
                value: (value + delta).rem_euclid(&modulus),
                width: *width,
            })
        }
        Val::Expr(_) | Val::VarOffset { .. } => None,
    }
}

fn candidate_terms<M: ModelConstructor + ?Sized>(
    tm: &mut TermManager,
    model: &M,
    q: &QuantifiedFormula,
    var: usize,
    use_relevant_domain: bool,
    limit: usize,
) -> Option<Vec<TermId>> {
    if use_relevant_domain {
        return Some(model.relevant_domain(q, var).iter().map(|r| r.term).collect());
    }
    let sort = q.var_sort(var)?;
    match tm.sorts.kind(sort)?.clone() {
        SortKind::Bool => Some(vec![tm.mk_false(), tm.mk_true()]),
        SortKind::BitVec(width) if width <= MAX_ENUM_BV_WIDTH && (1usize << width) <= limit => {
            Some((0..1u32 << width).map(|n| tm.mk_bitvec(BigInt::from(n), width)).collect())
        }
        SortKind::Uninterpreted(_) => Some(model.universe(sort).to_vec()),
        _ => None,
    }
}
