//! Interning arena for values, abstract values, conditions and tuples
//!
//! Everything the evaluator builds is interned here, so structurally equal
//! objects share a handle and handle equality is structural equality. The
//! scalar part of the algebra (equality, order, compatibility, generalization,
//! meet, offsets) lives on [`Lattice`] as well, since it needs nothing beyond
//! the arena.
//!
//! # Order and bounds
//!
//! Interval bounds are `Option<ValId>`; `None` is `-inf` when it is a lower
//! bound and `+inf` when it is an upper bound. Only numerals of the same kind
//! (integers, or bit-vectors of equal width) are ordered. Every other pair
//! compares as "not less than", which makes intervals over opaque values
//! behave as if they were unbounded.

use super::value::{AbsId, AbsVal, CondId, CondSlots, TupleId, TupleVals, Val, ValId};
use num_bigint::BigInt;
use num_traits::{One, Zero};
use qcheck_core::TermManager;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt::Write;

/// Arena of interned lattice objects
#[derive(Debug)]
pub struct Lattice {
    vals: Vec<Val>,
    val_ids: FxHashMap<Val, ValId>,
    abs: Vec<AbsVal>,
    abs_ids: FxHashMap<AbsVal, AbsId>,
    conds: Vec<CondSlots>,
    cond_ids: FxHashMap<CondSlots, CondId>,
    tuples: Vec<TupleVals>,
    tuple_ids: FxHashMap<TupleVals, TupleId>,
    star: AbsId,
}

impl Lattice {
    /// Create an empty arena with the `Star` abstract value pre-allocated
    pub fn new() -> Self {
        let mut lattice = Self {
            vals: Vec::new(),
            val_ids: FxHashMap::default(),
            abs: Vec::new(),
            abs_ids: FxHashMap::default(),
            conds: Vec::new(),
            cond_ids: FxHashMap::default(),
            tuples: Vec::new(),
            tuple_ids: FxHashMap::default(),
            star: AbsId(0),
        };
        lattice.star = lattice.intern_abs(AbsVal::Star);
        lattice
    }

    // ------------------------------------------------------------------
    // Interning
    // ------------------------------------------------------------------

    /// Intern a value
    pub fn intern_val(&mut self, val: Val) -> ValId {
        if let Some(&id) = self.val_ids.get(&val) {
            return id;
        }
        let id = ValId(self.vals.len() as u32);
        self.vals.push(val.clone());
        self.val_ids.insert(val, id);
        id
    }

    fn intern_abs(&mut self, abs: AbsVal) -> AbsId {
        if let Some(&id) = self.abs_ids.get(&abs) {
            return id;
        }
        let id = AbsId(self.abs.len() as u32);
        self.abs.push(abs);
        self.abs_ids.insert(abs, id);
        id
    }

    /// Integer value
    pub fn mk_int(&mut self, n: BigInt) -> ValId {
        self.intern_val(Val::Int(n))
    }

    /// Bit-vector value, reduced modulo `2^width`
    pub fn mk_bv(&mut self, value: BigInt, width: u32) -> ValId {
        let value = normalize_bv(value, width);
        self.intern_val(Val::Bv { value, width })
    }

    /// `(negated ? -x : x) + offset` over bound variable `var`
    pub fn mk_var_offset_val(&mut self, var: u32, offset: Option<ValId>, negated: bool) -> ValId {
        self.intern_val(Val::VarOffset {
            var,
            offset,
            negated,
        })
    }

    /// The `Star` abstract value
    pub fn mk_star(&self) -> AbsId {
        self.star
    }

    /// Singleton abstract value
    pub fn mk_value(&mut self, v: ValId) -> AbsId {
        self.intern_abs(AbsVal::Value(v))
    }

    /// Interval abstract value. The caller guarantees `lower <= upper`.
    pub fn mk_interval(&mut self, lower: Option<ValId>, upper: Option<ValId>) -> AbsId {
        debug_assert!(
            !(lower.is_some() && upper.is_some() && self.is_lt(upper, lower, true)),
            "empty interval"
        );
        self.intern_abs(AbsVal::Interval(lower, upper))
    }

    /// Interval abstract value, or `None` if it would be empty
    pub fn mk_interval_checked(&mut self, lower: Option<ValId>, upper: Option<ValId>) -> Option<AbsId> {
        if lower.is_some() && upper.is_some() && self.is_lt(upper, lower, true) {
            return None;
        }
        Some(self.intern_abs(AbsVal::Interval(lower, upper)))
    }

    /// The interval `[lower + 1, upper]`, or `None` if that is empty or
    /// `lower` is not a numeral.
    pub fn mk_next_interval(&mut self, lower: Option<ValId>, upper: Option<ValId>) -> Option<AbsId> {
        let lower = match lower {
            Some(l) => {
                let one = match self.val(l) {
                    Val::Int(_) => self.mk_int(BigInt::one()),
                    Val::Bv { width, .. } => {
                        let width = *width;
                        self.mk_bv(BigInt::one(), width)
                    }
                    _ => return None,
                };
                Some(self.mk_add(l, one)?)
            }
            None => None,
        };
        self.mk_interval_checked(lower, upper)
    }

    /// Intern a condition
    pub fn mk_cond(&mut self, slots: impl IntoIterator<Item = AbsId>) -> CondId {
        let slots: CondSlots = slots.into_iter().collect();
        if let Some(&id) = self.cond_ids.get(&slots) {
            return id;
        }
        let id = CondId(self.conds.len() as u32);
        self.conds.push(slots.clone());
        self.cond_ids.insert(slots, id);
        id
    }

    /// Condition of `arity` `Star` slots
    pub fn mk_star_cond(&mut self, arity: usize) -> CondId {
        let star = self.star;
        self.mk_cond(std::iter::repeat_n(star, arity))
    }

    /// Intern a value tuple
    pub fn mk_tuple(&mut self, vals: impl IntoIterator<Item = ValId>) -> TupleId {
        let vals: TupleVals = vals.into_iter().collect();
        if let Some(&id) = self.tuple_ids.get(&vals) {
            return id;
        }
        let id = TupleId(self.tuples.len() as u32);
        self.tuples.push(vals.clone());
        self.tuple_ids.insert(vals, id);
        id
    }

    /// One-component tuple
    pub fn mk_value_tuple(&mut self, v: ValId) -> TupleId {
        self.mk_tuple([v])
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    pub fn val(&self, id: ValId) -> &Val {
        &self.vals[id.index()]
    }

    pub fn abs(&self, id: AbsId) -> AbsVal {
        self.abs[id.index()]
    }

    pub fn cond(&self, id: CondId) -> &[AbsId] {
        &self.conds[id.index()]
    }

    pub fn tuple(&self, id: TupleId) -> &[ValId] {
        &self.tuples[id.index()]
    }

    /// Does any slot of the condition hold an interval
    pub fn cond_has_interval(&self, id: CondId) -> bool {
        self.cond(id).iter().any(|&a| self.abs(a).is_interval())
    }

    /// Lower or upper bound of an abstract value. A singleton is its own
    /// bound; `Star` has none.
    pub fn get_bound(&self, a: AbsId, is_lower: bool) -> Option<ValId> {
        match self.abs(a) {
            AbsVal::Star => None,
            AbsVal::Value(v) => Some(v),
            AbsVal::Interval(l, u) => {
                if is_lower {
                    l
                } else {
                    u
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Arithmetic on values
    // ------------------------------------------------------------------

    pub fn is_zero(&self, v: ValId) -> bool {
        match self.val(v) {
            Val::Int(n) | Val::Bv { value: n, .. } => n.is_zero(),
            _ => false,
        }
    }

    /// Sum of two numerals of the same kind
    pub fn mk_add(&mut self, v1: ValId, v2: ValId) -> Option<ValId> {
        if self.is_zero(v2) && self.val(v1).is_numeral() {
            return Some(v1);
        }
        if self.is_zero(v1) && self.val(v2).is_numeral() {
            return Some(v2);
        }
        match (self.val(v1), self.val(v2)) {
            (Val::Int(a), Val::Int(b)) => {
                let sum = a + b;
                Some(self.mk_int(sum))
            }
            (Val::Bv { value: a, width: w1 }, Val::Bv { value: b, width: w2 }) if w1 == w2 => {
                let (sum, width) = (a + b, *w1);
                Some(self.mk_bv(sum, width))
            }
            _ => None,
        }
    }

    /// Additive inverse of a numeral
    pub fn negate_numeral(&mut self, v: ValId) -> Option<ValId> {
        match self.val(v) {
            Val::Int(n) => {
                let neg = -n;
                Some(self.mk_int(neg))
            }
            Val::Bv { value, width } => {
                let (neg, width) = (-value, *width);
                Some(self.mk_bv(neg, width))
            }
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Equality and order
    // ------------------------------------------------------------------

    /// Value equality. Kinds never mix: an integer is not equal to an
    /// opaque term even when the term denotes the same number.
    pub fn is_eq(&self, v1: ValId, v2: ValId) -> bool {
        if v1 == v2 {
            return true;
        }
        match (self.val(v1), self.val(v2)) {
            (Val::Int(a), Val::Int(b)) => a == b,
            (Val::Bv { value: a, width: w1 }, Val::Bv { value: b, width: w2 }) => {
                w1 == w2 && a == b
            }
            (Val::Expr(a), Val::Expr(b)) => a == b,
            (
                Val::VarOffset {
                    var: x1,
                    offset: o1,
                    negated: n1,
                },
                Val::VarOffset {
                    var: x2,
                    offset: o2,
                    negated: n2,
                },
            ) => {
                x1 == x2
                    && n1 == n2
                    && match (o1, o2) {
                        (Some(a), Some(b)) => self.is_eq(*a, *b),
                        (Some(o), None) | (None, Some(o)) => self.is_zero(*o),
                        (None, None) => true,
                    }
            }
            _ => false,
        }
    }

    /// Strict order on bounds; see the module docs for the role of `None`
    pub fn is_lt(&self, v1: Option<ValId>, v2: Option<ValId>, is_lower: bool) -> bool {
        match (v1, v2) {
            (None, None) => false,
            (None, Some(_)) => is_lower,
            (Some(_), None) => !is_lower,
            (Some(a), Some(b)) => match (self.val(a), self.val(b)) {
                (Val::Int(x), Val::Int(y)) => x < y,
                (Val::Bv { value: x, width: w1 }, Val::Bv { value: y, width: w2 }) => {
                    w1 == w2 && x < y
                }
                _ => false,
            },
        }
    }

    fn max_lower(&self, a: Option<ValId>, b: Option<ValId>) -> Option<ValId> {
        if self.is_lt(a, b, true) { b } else { a }
    }

    fn min_upper(&self, a: Option<ValId>, b: Option<ValId>) -> Option<ValId> {
        if self.is_lt(a, b, false) { a } else { b }
    }

    fn bound_eq(&self, a: Option<ValId>, b: Option<ValId>) -> bool {
        match (a, b) {
            (Some(x), Some(y)) => self.is_eq(x, y),
            (None, None) => true,
            _ => false,
        }
    }

    /// Abstract values denote the same set: equal lower and upper bounds
    pub fn is_eq_abs(&self, a1: AbsId, a2: AbsId) -> bool {
        a1 == a2
            || (self.bound_eq(self.get_bound(a1, true), self.get_bound(a2, true))
                && self.bound_eq(self.get_bound(a1, false), self.get_bound(a2, false)))
    }

    pub fn is_eq_tuple(&self, t1: TupleId, t2: TupleId) -> bool {
        if t1 == t2 {
            return true;
        }
        let (a, b) = (self.tuple(t1), self.tuple(t2));
        a.len() == b.len() && a.iter().zip(b).all(|(&x, &y)| self.is_eq(x, y))
    }

    // ------------------------------------------------------------------
    // Compatibility, generalization and meet
    // ------------------------------------------------------------------

    /// The two abstract values share at least one concrete value
    pub fn is_compatible(&self, a1: AbsId, a2: AbsId) -> bool {
        match self.abs(a1) {
            AbsVal::Star => true,
            AbsVal::Value(_) => self.is_generalization(a2, a1),
            AbsVal::Interval(..) => {
                if !self.same_order(a1, a2) {
                    return false;
                }
                let lower =
                    self.max_lower(self.get_bound(a1, true), self.get_bound(a2, true));
                let upper =
                    self.min_upper(self.get_bound(a1, false), self.get_bound(a2, false));
                match (lower, upper) {
                    (Some(_), Some(_)) => !self.is_lt(upper, lower, true),
                    _ => true,
                }
            }
        }
    }

    /// Every value of `a2` is a value of `a1`
    pub fn is_generalization(&self, a1: AbsId, a2: AbsId) -> bool {
        match self.abs(a1) {
            AbsVal::Star => true,
            AbsVal::Value(_) => self.is_eq_abs(a1, a2),
            AbsVal::Interval(lower, upper) => {
                self.same_order(a1, a2)
                    && !self.is_lt(self.get_bound(a2, true), lower, true)
                    && !self.is_lt(upper, self.get_bound(a2, false), false)
            }
        }
    }

    /// The bounds of `a1` and `a2` all live in one ordered domain: integers,
    /// or bit-vectors of a single width. Missing bounds never conflict.
    fn same_order(&self, a1: AbsId, a2: AbsId) -> bool {
        let bounds = [
            self.get_bound(a1, true),
            self.get_bound(a1, false),
            self.get_bound(a2, true),
            self.get_bound(a2, false),
        ];
        let mut present = bounds.into_iter().flatten();
        let Some(first) = present.next() else {
            return true;
        };
        present.all(|b| match (self.val(first), self.val(b)) {
            (Val::Int(_), Val::Int(_)) => true,
            (Val::Bv { width: w1, .. }, Val::Bv { width: w2, .. }) => w1 == w2,
            _ => false,
        })
    }

    /// Intersection of two compatible abstract values
    pub fn mk_meet(&mut self, a1: AbsId, a2: AbsId) -> AbsId {
        debug_assert!(self.is_compatible(a1, a2));
        match (self.abs(a1), self.abs(a2)) {
            (AbsVal::Star, _) => a2,
            (AbsVal::Value(_), _) => a1,
            (AbsVal::Interval(..), AbsVal::Star) => a1,
            (AbsVal::Interval(..), AbsVal::Value(_)) => a2,
            (AbsVal::Interval(l1, u1), AbsVal::Interval(l2, u2)) => {
                let lower = self.max_lower(l1, l2);
                let upper = self.min_upper(u1, u2);
                self.mk_interval(lower, upper)
            }
        }
    }

    /// Pointwise compatibility of equal-arity conditions
    pub fn is_compatible_cond(&self, c1: CondId, c2: CondId) -> bool {
        let (a, b) = (self.cond(c1), self.cond(c2));
        debug_assert_eq!(a.len(), b.len());
        a.iter().zip(b).all(|(&x, &y)| self.is_compatible(x, y))
    }

    /// Pointwise generalization of equal-arity conditions
    pub fn is_generalization_cond(&self, c1: CondId, c2: CondId) -> bool {
        let (a, b) = (self.cond(c1), self.cond(c2));
        debug_assert_eq!(a.len(), b.len());
        a.iter().zip(b).all(|(&x, &y)| self.is_generalization(x, y))
    }

    /// Pointwise meet of compatible conditions
    pub fn mk_meet_cond(&mut self, c1: CondId, c2: CondId) -> CondId {
        if c1 == c2 {
            return c1;
        }
        let pairs: SmallVec<[(AbsId, AbsId); 4]> = self
            .cond(c1)
            .iter()
            .copied()
            .zip(self.cond(c2).iter().copied())
            .collect();
        let slots: CondSlots = pairs.into_iter().map(|(x, y)| self.mk_meet(x, y)).collect();
        self.mk_cond(slots)
    }

    // ------------------------------------------------------------------
    // Offsets
    // ------------------------------------------------------------------

    /// Shift an abstract value by a numeral. `None` if the kinds differ or a
    /// shifted bit-vector interval would wrap.
    pub fn mk_offset(&mut self, a: AbsId, v: ValId) -> Option<AbsId> {
        match self.abs(a) {
            AbsVal::Star => Some(a),
            AbsVal::Value(x) => {
                let shifted = self.mk_add(x, v)?;
                Some(self.mk_value(shifted))
            }
            AbsVal::Interval(l, u) => {
                let l = match l {
                    Some(l) => Some(self.mk_add(l, v)?),
                    None => None,
                };
                let u = match u {
                    Some(u) => Some(self.mk_add(u, v)?),
                    None => None,
                };
                self.mk_interval_checked(l, u)
            }
        }
    }

    /// Negate an abstract value: singletons map to their negation and
    /// intervals swap their negated bounds. Integer intervals only.
    pub fn mk_negate(&mut self, a: AbsId) -> Option<AbsId> {
        match self.abs(a) {
            AbsVal::Star => Some(a),
            AbsVal::Value(x) => {
                let neg = self.negate_numeral(x)?;
                Some(self.mk_value(neg))
            }
            AbsVal::Interval(l, u) => {
                let bounds_are_int = [l, u]
                    .into_iter()
                    .flatten()
                    .all(|b| self.val(b).as_int().is_some());
                if !bounds_are_int {
                    return None;
                }
                let new_lower = match u {
                    Some(u) => Some(self.negate_numeral(u)?),
                    None => None,
                };
                let new_upper = match l {
                    Some(l) => Some(self.negate_numeral(l)?),
                    None => None,
                };
                self.mk_interval_checked(new_lower, new_upper)
            }
        }
    }

    /// Compose one argument entry `(c1, v)` with one callee condition `c2`.
    ///
    /// The value tuple `v` gives, per callee argument, either a fixed value
    /// or an expression `±x + o` over a bound variable `x`. Fixed values
    /// must be compatible with the callee slot; variable expressions narrow
    /// the slot of `x` in `c1` to the preimage of the callee slot. Returns
    /// `c1` itself when nothing was narrowed, `None` when incompatible.
    pub fn mk_compose_cond(&mut self, c1: CondId, v: TupleId, c2: CondId) -> Option<CondId> {
        let targets: CondSlots = self.cond(c2).iter().copied().collect();
        let vals: TupleVals = self.tuple(v).iter().copied().collect();
        debug_assert_eq!(targets.len(), vals.len());
        let mut narrowed: SmallVec<[(u32, AbsId); 4]> = SmallVec::new();
        for (&target, &val) in targets.iter().zip(&vals) {
            if target == self.star {
                continue;
            }
            match self.val(val).clone() {
                Val::VarOffset {
                    var,
                    offset,
                    negated,
                } => {
                    debug_assert!((var as usize) < self.cond(c1).len());
                    let current = narrowed
                        .iter()
                        .find(|(x, _)| *x == var)
                        .map(|&(_, a)| a)
                        .unwrap_or_else(|| self.cond(c1)[var as usize]);
                    let mut pre = target;
                    if let Some(o) = offset {
                        let neg = self.negate_numeral(o)?;
                        pre = self.mk_offset(pre, neg)?;
                    }
                    if negated {
                        pre = self.mk_negate(pre)?;
                    }
                    if !self.is_compatible(current, pre) {
                        return None;
                    }
                    let met = self.mk_meet(current, pre);
                    match narrowed.iter_mut().find(|(x, _)| *x == var) {
                        Some(slot) => slot.1 = met,
                        None => narrowed.push((var, met)),
                    }
                }
                _ => {
                    let fixed = self.mk_value(val);
                    if !self.is_compatible(fixed, target) {
                        return None;
                    }
                }
            }
        }
        if narrowed.is_empty() {
            return Some(c1);
        }
        let mut slots: CondSlots = self.cond(c1).iter().copied().collect();
        for (var, abs) in narrowed {
            slots[var as usize] = abs;
        }
        Some(self.mk_cond(slots))
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Human-readable rendering of a value
    pub fn show_val(&self, tm: &TermManager, v: ValId) -> String {
        match self.val(v) {
            Val::Int(n) => n.to_string(),
            Val::Bv { value, width } => format!("#b{value}[{width}]"),
            Val::Expr(t) => tm.display(*t).to_string(),
            Val::VarOffset {
                var,
                offset,
                negated,
            } => {
                let mut out = String::new();
                if *negated {
                    out.push('-');
                }
                let _ = write!(out, "x{var}");
                if let Some(o) = offset {
                    let _ = write!(out, "+{}", self.show_val(tm, *o));
                }
                out
            }
        }
    }

    pub fn show_abs(&self, tm: &TermManager, a: AbsId) -> String {
        let bound = |b: Option<ValId>, inf: &str| match b {
            Some(v) => self.show_val(tm, v),
            None => inf.to_string(),
        };
        match self.abs(a) {
            AbsVal::Star => "*".to_string(),
            AbsVal::Value(v) => self.show_val(tm, v),
            AbsVal::Interval(l, u) => format!("[{}, {}]", bound(l, "-inf"), bound(u, "+inf")),
        }
    }

    pub fn show_cond(&self, tm: &TermManager, c: CondId) -> String {
        let slots: Vec<String> = self.cond(c).iter().map(|&a| self.show_abs(tm, a)).collect();
        format!("({})", slots.join(", "))
    }

    pub fn show_tuple(&self, tm: &TermManager, t: TupleId) -> String {
        let vals: Vec<String> = self.tuple(t).iter().map(|&v| self.show_val(tm, v)).collect();
        vals.join(", ")
    }
}

impl Default for Lattice {
    fn default() -> Self {
        Self::new()
    }
}

/// Reduce into `[0, 2^width)`
pub(crate) fn normalize_bv(value: BigInt, width: u32) -> BigInt {
    let modulus = BigInt::one() << width;
    let mut value = value % &modulus;
    if value < BigInt::zero() {
        value += &modulus;
    }
    value
}
