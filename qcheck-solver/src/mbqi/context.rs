//! Evaluation context
//!
//! [`EvalCtx`] owns the lattice arena, every [`Def`] built during model
//! checking, and the term-to-value caches. It dereferences to its
//! [`Lattice`], so the scalar algebra (`is_eq`, `mk_meet`, ...) is available
//! directly on the context; the definition-level combinators are implemented
//! here.
//!
//! Lattice objects live as long as the context. Caches tied to one candidate
//! model are dropped by [`EvalCtx::reset_round`].

use super::MbqiConfig;
use super::def::Def;
use super::lattice::Lattice;
use super::model::{ModelConstructor, ProjectionKind};
use super::value::{AbsId, AbsVal, CondId, CondSlots, DefId, TupleId, TupleVals, Val, ValId};
use super::QuantifiedFormula;
use num_bigint::BigInt;
use num_traits::One;
use qcheck_core::{Op, TermId, TermKind, TermManager};
use rustc_hash::FxHashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use tracing::trace;

/// Counters for one evaluation context
#[derive(Debug, Clone, Default)]
pub struct EvalStats {
    /// Calls to `check`
    pub num_checks: usize,
    /// Definitions allocated
    pub num_defs: usize,
    /// Instantiation lemmas returned
    pub num_lemmas: usize,
    /// Heuristic search passes
    pub num_eval_check_passes: usize,
    /// Witness candidates whose ground instance did not evaluate to false
    pub num_rejected_witnesses: usize,
}

impl fmt::Display for EvalStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model check statistics:")?;
        writeln!(f, "  Checks: {}", self.num_checks)?;
        writeln!(f, "  Definitions: {}", self.num_defs)?;
        writeln!(f, "  Lemmas: {}", self.num_lemmas)?;
        writeln!(f, "  Search passes: {}", self.num_eval_check_passes)?;
        write!(f, "  Rejected witnesses: {}", self.num_rejected_witnesses)
    }
}

/// Arena, caches and algebra for model checking quantified formulas
#[derive(Debug)]
pub struct EvalCtx {
    lattice: Lattice,
    defs: Vec<Def>,
    /// Term to value, persistent
    expr_to_val: FxHashMap<TermId, ValId>,
    /// Per-quantifier top condition, round-scoped
    star_conds: FxHashMap<TermId, CondId>,
    /// Ground term evaluation results, round-scoped
    pub(crate) ground_cache: FxHashMap<TermId, Option<TermId>>,
    true_val: ValId,
    false_val: ValId,
    pub(crate) config: MbqiConfig,
    pub(crate) stats: EvalStats,
}

impl EvalCtx {
    /// Create a context with the default configuration
    pub fn new(tm: &TermManager) -> Self {
        Self::with_config(tm, MbqiConfig::default())
    }

    /// Create a context with a custom configuration
    pub fn with_config(tm: &TermManager, config: MbqiConfig) -> Self {
        let mut lattice = Lattice::new();
        let true_val = lattice.intern_val(Val::Expr(tm.mk_true()));
        let false_val = lattice.intern_val(Val::Expr(tm.mk_false()));
        let mut expr_to_val = FxHashMap::default();
        expr_to_val.insert(tm.mk_true(), true_val);
        expr_to_val.insert(tm.mk_false(), false_val);
        Self {
            lattice,
            defs: Vec::new(),
            expr_to_val,
            star_conds: FxHashMap::default(),
            ground_cache: FxHashMap::default(),
            true_val,
            false_val,
            config,
            stats: EvalStats::default(),
        }
    }

    pub fn config(&self) -> &MbqiConfig {
        &self.config
    }

    pub fn stats(&self) -> &EvalStats {
        &self.stats
    }

    /// Drop the caches tied to the current candidate model
    pub fn reset_round(&mut self) {
        self.star_conds.clear();
        self.ground_cache.clear();
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    // ------------------------------------------------------------------
    // Values from terms
    // ------------------------------------------------------------------

    /// The value of `true`
    pub fn true_val(&self) -> ValId {
        self.true_val
    }

    /// The value of `false`
    pub fn false_val(&self) -> ValId {
        self.false_val
    }

    pub fn mk_bool_val(&self, b: bool) -> ValId {
        if b { self.true_val } else { self.false_val }
    }

    /// Boolean reading of a value
    pub fn as_bool(&self, v: ValId) -> Option<bool> {
        if v == self.true_val {
            Some(true)
        } else if v == self.false_val {
            Some(false)
        } else {
            None
        }
    }

    /// Value of a term: numerals become `Int`/`Bv`, a bound variable becomes
    /// the bare `VarOffset`, anything else is an opaque `Expr`
    pub fn mk_val(&mut self, tm: &TermManager, term: TermId) -> ValId {
        if let Some(&v) = self.expr_to_val.get(&term) {
            return v;
        }
        let val = match tm.kind(term) {
            Some(TermKind::IntConst(n)) => Val::Int(n.clone()),
            Some(TermKind::BitVecConst { value, width }) => Val::Bv {
                value: value.clone(),
                width: *width,
            },
            Some(TermKind::BoundVar(i)) => Val::VarOffset {
                var: *i,
                offset: None,
                negated: false,
            },
            _ => Val::Expr(term),
        };
        let v = self.lattice.intern_val(val);
        self.expr_to_val.insert(term, v);
        v
    }

    /// Ground term denoting a value; `None` for variable expressions
    pub fn get_expr_from_val(&self, tm: &mut TermManager, v: ValId) -> Option<TermId> {
        match self.lattice.val(v) {
            Val::Int(n) => Some(tm.mk_int(n.clone())),
            Val::Bv { value, width } => Some(tm.mk_bitvec(value.clone(), *width)),
            Val::Expr(t) => Some(*t),
            Val::VarOffset { .. } => None,
        }
    }

    /// Negation of a numeral, or the term `(- t)` for an opaque integer term
    pub fn mk_negate(&mut self, tm: &mut TermManager, v: ValId) -> Option<ValId> {
        if let Some(n) = self.lattice.negate_numeral(v) {
            return Some(n);
        }
        match *self.lattice.val(v) {
            Val::Expr(t) if tm.sort_of(t) == Some(tm.sorts.int_sort) => {
                let neg = tm.mk_neg(t);
                Some(self.mk_val(tm, neg))
            }
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Canonical forms
    // ------------------------------------------------------------------

    /// Route a value through its term, so equal values share a handle
    pub fn mk_canon_val(&mut self, tm: &mut TermManager, v: ValId) -> ValId {
        match self.get_expr_from_val(tm, v) {
            Some(t) => self.mk_val(tm, t),
            None => v,
        }
    }

    pub fn mk_canon_abs(&mut self, tm: &mut TermManager, a: AbsId) -> AbsId {
        match self.lattice.abs(a) {
            AbsVal::Star => a,
            AbsVal::Value(v) => {
                let v = self.mk_canon_val(tm, v);
                self.lattice.mk_value(v)
            }
            AbsVal::Interval(l, u) => {
                let l = l.map(|l| self.mk_canon_val(tm, l));
                let u = u.map(|u| self.mk_canon_val(tm, u));
                self.lattice.mk_interval(l, u)
            }
        }
    }

    pub fn mk_canon(&mut self, tm: &mut TermManager, c: CondId) -> CondId {
        let slots: CondSlots = self.lattice.cond(c).iter().copied().collect();
        let slots: CondSlots = slots.into_iter().map(|a| self.mk_canon_abs(tm, a)).collect();
        self.lattice.mk_cond(slots)
    }

    pub fn mk_canon_tuple(&mut self, tm: &mut TermManager, t: TupleId) -> TupleId {
        let vals: TupleVals = self.lattice.tuple(t).iter().copied().collect();
        let vals: TupleVals = vals.into_iter().map(|v| self.mk_canon_val(tm, v)).collect();
        self.lattice.mk_tuple(vals)
    }

    /// Top condition of a quantifier: `Star` for pointwise variables, the
    /// unbounded interval for monotonic ones
    pub fn mk_star<M: ModelConstructor + ?Sized>(&mut self, model: &M, q: &QuantifiedFormula) -> CondId {
        if let Some(&c) = self.star_conds.get(&q.term) {
            return c;
        }
        let slots: CondSlots = (0..q.num_vars())
            .map(|i| match model.projection(q, i) {
                ProjectionKind::Pointwise => self.lattice.mk_star(),
                ProjectionKind::Monotonic => self.lattice.mk_interval(None, None),
            })
            .collect();
        let c = self.lattice.mk_cond(slots);
        self.star_conds.insert(q.term, c);
        c
    }

    // ------------------------------------------------------------------
    // Definitions
    // ------------------------------------------------------------------

    /// Take ownership of a definition
    pub fn alloc_def(&mut self, def: Def) -> DefId {
        let id = DefId(self.defs.len() as u32);
        self.defs.push(def);
        self.stats.num_defs += 1;
        id
    }

    pub fn def(&self, id: DefId) -> &Def {
        &self.defs[id.index()]
    }

    /// Append to an owned definition
    pub fn append_entry(&mut self, d: DefId, cond: CondId, value: TupleId) -> bool {
        self.defs[d.index()].append_entry(&self.lattice, cond, value)
    }

    /// One-entry definition `cond -> (v)`
    pub fn mk_trivial_def(&mut self, cond: CondId, v: ValId) -> DefId {
        let t = self.lattice.mk_value_tuple(v);
        let mut def = Def::new();
        def.append_entry(&self.lattice, cond, t);
        self.alloc_def(def)
    }

    pub fn simplify(&mut self, d: DefId) {
        self.defs[d.index()].simplify(&self.lattice);
    }

    /// Pairs of compatible entries: meet of the conditions, concatenation of
    /// the values
    pub fn mk_product(&mut self, d1: DefId, d2: DefId) -> DefId {
        let left = self.defs[d1.index()].entries().to_vec();
        let right = self.defs[d2.index()].entries().to_vec();
        let mut out = Def::new();
        for &(c1, v1) in &left {
            for &(c2, v2) in &right {
                if !self.lattice.is_compatible_cond(c1, c2) {
                    continue;
                }
                let cond = self.lattice.mk_meet_cond(c1, c2);
                let vals: TupleVals = self
                    .lattice
                    .tuple(v1)
                    .iter()
                    .chain(self.lattice.tuple(v2))
                    .copied()
                    .collect();
                let value = self.lattice.mk_tuple(vals);
                out.append_entry(&self.lattice, cond, value);
            }
        }
        self.alloc_def(out)
    }

    /// Substitute the argument definition `da` into the callee definition
    /// `df`: every argument entry is combined with every callee entry it can
    /// reach, in callee order.
    pub fn mk_compose(&mut self, df: DefId, da: DefId) -> DefId {
        let early_exit = self.config.compose_early_exit;
        self.mk_compose_with(df, da, early_exit)
    }

    /// [`mk_compose`](Self::mk_compose) with an explicit early-exit setting
    pub fn mk_compose_with(&mut self, df: DefId, da: DefId, early_exit: bool) -> DefId {
        let args = self.defs[da.index()].entries().to_vec();
        let callee = self.defs[df.index()].entries().to_vec();
        let mut out = Def::new();
        for &(c1, v1) in &args {
            for &(c2, vf) in &callee {
                let Some(cc) = self.lattice.mk_compose_cond(c1, v1, c2) else {
                    continue;
                };
                out.append_entry(&self.lattice, cc, vf);
                // the callee entry covers all of c1
                if early_exit && cc == c1 {
                    break;
                }
            }
        }
        self.alloc_def(out)
    }

    fn with_slot(&mut self, c: CondId, var: u32, slot: AbsId) -> CondId {
        let mut slots: CondSlots = self.lattice.cond(c).iter().copied().collect();
        slots[var as usize] = slot;
        self.lattice.mk_cond(slots)
    }

    /// Specialize `op(x, t)` (or `op(t, x)` when `is_flipped`) where `d` is
    /// the definition of `t`, splitting the slot of `x` by the value of `t`.
    /// `None` when the relation cannot be split (ordered relation over a
    /// non-integer value).
    pub fn mk_var_relation(&mut self, d: DefId, op: Op, var: u32, is_flipped: bool) -> Option<DefId> {
        let entries = self.defs[d.index()].entries().to_vec();
        let (t, f) = (
            self.lattice.mk_value_tuple(self.true_val),
            self.lattice.mk_value_tuple(self.false_val),
        );
        let mut out = Def::new();
        for (c, value) in entries {
            let a = self.lattice.cond(c)[var as usize];
            let vl = *self.lattice.tuple(value).first()?;
            trace!(
                var,
                slot = ?self.lattice.abs(a),
                value = ?self.lattice.val(vl),
                "var relation"
            );
            let pieces = match op {
                Op::Eq => self.eq_pieces(a, vl),
                op if op.is_int_relation() => self.order_pieces(op, a, vl, is_flipped)?,
                _ => return None,
            };
            for (slot, holds) in pieces {
                let cond = match slot {
                    Some(slot) => self.with_slot(c, var, slot),
                    None => c,
                };
                out.append_entry(&self.lattice, cond, if holds { t } else { f });
            }
        }
        Some(self.alloc_def(out))
    }

    /// Pieces of `x = vl` over slot `a`: (narrowed slot or unchanged, truth)
    fn eq_pieces(&mut self, a: AbsId, vl: ValId) -> Vec<(Option<AbsId>, bool)> {
        match self.lattice.abs(a) {
            AbsVal::Value(w) => vec![(None, self.lattice.is_eq(w, vl))],
            AbsVal::Star => {
                let point = self.lattice.mk_value(vl);
                vec![(Some(point), true), (None, false)]
            }
            AbsVal::Interval(..) => {
                let Some(k) = self.lattice.val(vl).as_int().cloned() else {
                    let point = self.lattice.mk_value(vl);
                    let mut pieces = Vec::new();
                    if self.lattice.is_compatible(a, point) {
                        pieces.push((Some(self.lattice.mk_meet(a, point)), true));
                    }
                    pieces.push((None, false));
                    return pieces;
                };
                let below = self.lattice.mk_int(&k - BigInt::one());
                let above = self.lattice.mk_int(&k + BigInt::one());
                let bounds = [
                    (None, Some(below), false),
                    (Some(above), None, false),
                    (Some(vl), Some(vl), true),
                ];
                self.narrow_pieces(a, &bounds)
            }
        }
    }

    /// Pieces of an integer order relation; a `Star` slot is treated as the
    /// unbounded interval
    fn order_pieces(
        &mut self,
        op: Op,
        a: AbsId,
        vl: ValId,
        is_flipped: bool,
    ) -> Option<Vec<(Option<AbsId>, bool)>> {
        let k = self.lattice.val(vl).as_int()?.clone();
        let is_strict = matches!(op, Op::Lt | Op::Gt);
        let is_greater = matches!(op, Op::Le | Op::Lt) == is_flipped;
        if let AbsVal::Value(w) = self.lattice.abs(a) {
            let w = self.lattice.val(w).as_int()?;
            let (lhs, rhs) = if is_flipped { (&k, w) } else { (w, &k) };
            let holds = match op {
                Op::Lt => lhs < rhs,
                Op::Le => lhs <= rhs,
                Op::Gt => lhs > rhs,
                _ => lhs >= rhs,
            };
            return Some(vec![(None, holds)]);
        }
        // lesser side: x <= k (or k - 1); greater side: x >= k (or k + 1)
        let split = match (is_greater, is_strict) {
            (false, false) | (true, true) => k.clone(),
            (false, true) | (true, false) => &k - BigInt::one(),
        };
        let low_top = self.lattice.mk_int(split.clone());
        let high_bottom = self.lattice.mk_int(split + BigInt::one());
        let bounds = [
            (None, Some(low_top), !is_greater),
            (Some(high_bottom), None, is_greater),
        ];
        Some(self.narrow_pieces(a, &bounds))
    }

    fn narrow_pieces(
        &mut self,
        a: AbsId,
        bounds: &[(Option<ValId>, Option<ValId>, bool)],
    ) -> Vec<(Option<AbsId>, bool)> {
        let mut pieces = Vec::with_capacity(bounds.len());
        for &(l, u, holds) in bounds {
            let piece = self.lattice.mk_interval(l, u);
            if self.lattice.is_compatible(a, piece) {
                pieces.push((Some(self.lattice.mk_meet(a, piece)), holds));
            }
        }
        pieces
    }

    /// Turn each value `v` of `d` into `(is_negated ? -x : x) + v`
    pub fn mk_var_offset(&mut self, d: DefId, var: u32, is_negated: bool) -> DefId {
        let entries = self.defs[d.index()].entries().to_vec();
        let values: Vec<TupleId> = entries
            .iter()
            .map(|&(_, t)| {
                let offset = self.lattice.tuple(t)[0];
                let v = self.lattice.mk_var_offset_val(var, Some(offset), is_negated);
                self.lattice.mk_value_tuple(v)
            })
            .collect();
        let def = self.defs[d.index()].with_values(values);
        self.alloc_def(def)
    }

    /// Apply a unary map to every value of a one-column definition
    pub(crate) fn map_values(
        &mut self,
        d: DefId,
        mut f: impl FnMut(&mut Self, ValId) -> Option<ValId>,
    ) -> Option<DefId> {
        let entries = self.defs[d.index()].entries().to_vec();
        let mut values = Vec::with_capacity(entries.len());
        for (_, t) in entries {
            let v = *self.lattice.tuple(t).first()?;
            let mapped = f(self, v)?;
            values.push(self.lattice.mk_value_tuple(mapped));
        }
        let def = self.defs[d.index()].with_values(values);
        Some(self.alloc_def(def))
    }
}

impl Deref for EvalCtx {
    type Target = Lattice;

    fn deref(&self) -> &Lattice {
        &self.lattice
    }
}

impl DerefMut for EvalCtx {
    fn deref_mut(&mut self) -> &mut Lattice {
        &mut self.lattice
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (TermManager, EvalCtx) {
        let tm = TermManager::new();
        let ctx = EvalCtx::new(&tm);
        (tm, ctx)
    }

    fn int_def(ctx: &mut EvalCtx, arity: usize, n: i64) -> DefId {
        let c = ctx.mk_star_cond(arity);
        let v = ctx.mk_int(BigInt::from(n));
        ctx.mk_trivial_def(c, v)
    }

    #[test]
    fn test_strict_order_split() {
        let (_tm, mut ctx) = setup();
        let d = int_def(&mut ctx, 1, 5);
        let r = ctx.mk_var_relation(d, Op::Lt, 0, false).unwrap();
        let def = ctx.def(r).clone();
        assert_eq!(def.len(), 2);

        let four = ctx.mk_int(BigInt::from(4));
        let five = ctx.mk_int(BigInt::from(5));
        let low = ctx.mk_interval(None, Some(four));
        let high = ctx.mk_interval(Some(five), None);
        assert_eq!(ctx.cond(def.condition(0)), &[low]);
        assert_eq!(ctx.tuple(def.value(0)), &[ctx.true_val()]);
        assert_eq!(ctx.cond(def.condition(1)), &[high]);
        assert_eq!(ctx.tuple(def.value(1)), &[ctx.false_val()]);
    }

    #[test]
    fn test_flipped_order_split() {
        let (_tm, mut ctx) = setup();
        // 5 <= x
        let d = int_def(&mut ctx, 1, 5);
        let r = ctx.mk_var_relation(d, Op::Le, 0, true).unwrap();
        let def = ctx.def(r).clone();
        let four = ctx.mk_int(BigInt::from(4));
        let five = ctx.mk_int(BigInt::from(5));
        let low = ctx.mk_interval(None, Some(four));
        let high = ctx.mk_interval(Some(five), None);
        assert_eq!(def.entries().len(), 2);
        assert_eq!(ctx.cond(def.condition(0)), &[low]);
        assert_eq!(ctx.tuple(def.value(0)), &[ctx.false_val()]);
        assert_eq!(ctx.cond(def.condition(1)), &[high]);
        assert_eq!(ctx.tuple(def.value(1)), &[ctx.true_val()]);
    }

    #[test]
    fn test_greater_strict_split() {
        let (_tm, mut ctx) = setup();
        let d = int_def(&mut ctx, 1, 5);
        let r = ctx.mk_var_relation(d, Op::Gt, 0, false).unwrap();
        let def = ctx.def(r).clone();
        let five = ctx.mk_int(BigInt::from(5));
        let six = ctx.mk_int(BigInt::from(6));
        let low = ctx.mk_interval(None, Some(five));
        let high = ctx.mk_interval(Some(six), None);
        assert_eq!(ctx.cond(def.condition(0)), &[low]);
        assert_eq!(ctx.tuple(def.value(0)), &[ctx.false_val()]);
        assert_eq!(ctx.cond(def.condition(1)), &[high]);
        assert_eq!(ctx.tuple(def.value(1)), &[ctx.true_val()]);
    }

    #[test]
    fn test_equality_split_order() {
        let (_tm, mut ctx) = setup();
        let d = int_def(&mut ctx, 1, 7);
        let r = ctx.mk_var_relation(d, Op::Eq, 0, false).unwrap();
        let def = ctx.def(r).clone();
        assert_eq!(def.len(), 2);
        let seven = ctx.mk_int(BigInt::from(7));
        let v7 = ctx.mk_value(seven);
        let star = ctx.lattice().mk_star();
        assert_eq!(ctx.cond(def.condition(0)), &[v7]);
        assert_eq!(ctx.tuple(def.value(0)), &[ctx.true_val()]);
        assert_eq!(ctx.cond(def.condition(1)), &[star]);
        assert_eq!(ctx.tuple(def.value(1)), &[ctx.false_val()]);
    }

    #[test]
    fn test_equality_on_interval_slot() {
        let (_tm, mut ctx) = setup();
        let c = ctx.mk_interval(None, None);
        let c = ctx.mk_cond([c]);
        let three = ctx.mk_int(BigInt::from(3));
        let d = ctx.mk_trivial_def(c, three);
        let r = ctx.mk_var_relation(d, Op::Eq, 0, false).unwrap();
        let def = ctx.def(r).clone();
        assert_eq!(def.len(), 3);
        assert_eq!(ctx.tuple(def.value(2)), &[ctx.true_val()]);
        let point = ctx.mk_interval(Some(three), Some(three));
        assert_eq!(ctx.cond(def.condition(2)), &[point]);
    }

    #[test]
    fn test_order_relation_rejects_opaque_value() {
        let (mut tm, mut ctx) = setup();
        let c = tm.mk_var("c", tm.sorts.int_sort);
        let cv = ctx.mk_val(&tm, c);
        let star = ctx.mk_star_cond(1);
        let d = ctx.mk_trivial_def(star, cv);
        assert!(ctx.mk_var_relation(d, Op::Lt, 0, false).is_none());
    }

    #[test]
    fn test_product_arity_and_size() {
        let (_tm, mut ctx) = setup();
        let star = ctx.lattice().mk_star();
        let mut d1 = Def::new();
        for n in [1, 2] {
            let v = ctx.mk_int(BigInt::from(n));
            let a = ctx.mk_value(v);
            let c = ctx.mk_cond([a, star]);
            let t = ctx.mk_value_tuple(v);
            d1.append_entry(ctx.lattice(), c, t);
        }
        let mut d2 = Def::new();
        for n in [10, 20, 30] {
            let v = ctx.mk_int(BigInt::from(n));
            let a = ctx.mk_value(v);
            let c = ctx.mk_cond([star, a]);
            let t = ctx.mk_value_tuple(v);
            d2.append_entry(ctx.lattice(), c, t);
        }
        let (d1, d2) = (ctx.alloc_def(d1), ctx.alloc_def(d2));
        let p = ctx.mk_product(d1, d2);
        let def = ctx.def(p);
        assert!(def.len() <= 6);
        assert_eq!(def.len(), 6);
        for &(_, t) in def.entries() {
            assert_eq!(ctx.tuple(t).len(), 2);
        }
    }

    #[test]
    fn test_compose_through_variable() {
        let (_tm, mut ctx) = setup();
        // f: 1 -> 10, * -> 0
        let star = ctx.lattice().mk_star();
        let (one, ten, zero) = (
            ctx.mk_int(BigInt::from(1)),
            ctx.mk_int(BigInt::from(10)),
            ctx.mk_int(BigInt::from(0)),
        );
        let v1 = ctx.mk_value(one);
        let mut f = Def::new();
        let (c1, call) = (ctx.mk_cond([v1]), ctx.mk_cond([star]));
        let (t10, t0) = (ctx.mk_value_tuple(ten), ctx.mk_value_tuple(zero));
        f.append_entry(ctx.lattice(), c1, t10);
        f.append_entry(ctx.lattice(), call, t0);
        let f = ctx.alloc_def(f);

        // argument x0
        let x = ctx.mk_var_offset_val(0, None, false);
        let arg = ctx.mk_trivial_def(call, x);
        let r = ctx.mk_compose(f, arg);
        let def = ctx.def(r);
        assert_eq!(def.entries(), &[(c1, t10), (call, t0)]);
    }

    #[test]
    fn test_var_offset_values() {
        let (_tm, mut ctx) = setup();
        let d = int_def(&mut ctx, 2, 3);
        let r = ctx.mk_var_offset(d, 1, true);
        let v = ctx.tuple(ctx.def(r).value(0))[0];
        let three = ctx.mk_int(BigInt::from(3));
        assert_eq!(
            ctx.val(v),
            &Val::VarOffset {
                var: 1,
                offset: Some(three),
                negated: true
            }
        );
    }

    #[test]
    fn test_canon_is_idempotent() {
        let (mut tm, mut ctx) = setup();
        let n = tm.mk_int(BigInt::from(42));
        let v = ctx.mk_val(&tm, n);
        let a = ctx.mk_value(v);
        let star = ctx.lattice().mk_star();
        let c = ctx.mk_cond([a, star]);
        let once = ctx.mk_canon(&mut tm, c);
        let twice = ctx.mk_canon(&mut tm, once);
        assert_eq!(once, twice);
        assert_eq!(once, c);
    }

    #[test]
    fn test_bound_variable_value() {
        let (mut tm, mut ctx) = setup();
        let x = tm.mk_bound_var(2, tm.sorts.int_sort);
        let v = ctx.mk_val(&tm, x);
        assert_eq!(ctx.val(v).var(), Some(2));
        assert!(ctx.get_expr_from_val(&mut tm, v).is_none());
    }

    #[test]
    fn test_negate_opaque_term() {
        let (mut tm, mut ctx) = setup();
        let c = tm.mk_var("c", tm.sorts.int_sort);
        let cv = ctx.mk_val(&tm, c);
        let neg = ctx.mk_negate(&mut tm, cv).unwrap();
        let expected = tm.mk_neg(c);
        assert_eq!(ctx.val(neg), &Val::Expr(expected));
    }
}
