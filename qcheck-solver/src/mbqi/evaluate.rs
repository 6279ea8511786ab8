//! Interpreted operator semantics over values, and ground-term evaluation
//! through model tables.
//!
//! Unevaluable combinations (ill-kinded operands, division by zero, symbolic
//! variable values) produce `None` rather than a panic; callers treat that as
//! "this path yields nothing".

use super::context::EvalCtx;
use super::model::ModelConstructor;
use super::value::{Val, ValId};
use num_bigint::BigInt;
use num_traits::{Euclid, Signed, Zero};
use qcheck_core::ast::Args;
use qcheck_core::{Op, TermId, TermKind, TermManager};
use smallvec::SmallVec;

impl EvalCtx {
    /// Apply an interpreted operator to argument values
    pub fn evaluate(&mut self, op: Op, vals: &[ValId]) -> Option<ValId> {
        if vals.iter().any(|&v| self.val(v).var().is_some()) {
            return None;
        }
        match op {
            Op::Not => {
                let &[a] = vals else { return None };
                Some(self.mk_bool_val(!self.as_bool(a)?))
            }
            Op::And => {
                let mut known = true;
                for &v in vals {
                    match self.as_bool(v) {
                        Some(false) => return Some(self.false_val()),
                        Some(true) => {}
                        None => known = false,
                    }
                }
                known.then(|| self.true_val())
            }
            Op::Or => {
                let mut known = true;
                for &v in vals {
                    match self.as_bool(v) {
                        Some(true) => return Some(self.true_val()),
                        Some(false) => {}
                        None => known = false,
                    }
                }
                known.then(|| self.false_val())
            }
            Op::Implies => {
                let &[a, b] = vals else { return None };
                match (self.as_bool(a), self.as_bool(b)) {
                    (Some(false), _) | (_, Some(true)) => Some(self.true_val()),
                    (Some(true), Some(false)) => Some(self.false_val()),
                    _ => None,
                }
            }
            Op::Ite => {
                let &[c, t, e] = vals else { return None };
                Some(if self.as_bool(c)? { t } else { e })
            }
            Op::Eq => {
                let &[a, b] = vals else { return None };
                Some(self.mk_bool_val(self.is_eq(a, b)))
            }
            Op::Distinct => {
                for (i, &a) in vals.iter().enumerate() {
                    if vals[i + 1..].iter().any(|&b| self.is_eq(a, b)) {
                        return Some(self.false_val());
                    }
                }
                Some(self.true_val())
            }
            Op::Add | Op::Sub | Op::Mul | Op::Neg | Op::Div | Op::Mod | Op::Rem => {
                let ints = self.int_args(vals)?;
                let result = eval_int_arith(op, &ints)?;
                Some(self.mk_int(result))
            }
            Op::Lt | Op::Le | Op::Gt | Op::Ge => {
                let ints = self.int_args(vals)?;
                let [a, b] = ints.as_slice() else { return None };
                let holds = match op {
                    Op::Lt => a < b,
                    Op::Le => a <= b,
                    Op::Gt => a > b,
                    _ => a >= b,
                };
                Some(self.mk_bool_val(holds))
            }
            Op::BvAdd | Op::BvSub | Op::BvMul | Op::BvUlt | Op::BvUle => {
                let &[a, b] = vals else { return None };
                let (Val::Bv { value: x, width: w1 }, Val::Bv { value: y, width: w2 }) =
                    (self.val(a), self.val(b))
                else {
                    return None;
                };
                if w1 != w2 {
                    return None;
                }
                let width = *w1;
                let result = match op {
                    Op::BvAdd => x + y,
                    Op::BvSub => x - y,
                    Op::BvMul => x * y,
                    Op::BvUlt => {
                        let holds = x < y;
                        return Some(self.mk_bool_val(holds));
                    }
                    _ => {
                        let holds = x <= y;
                        return Some(self.mk_bool_val(holds));
                    }
                };
                Some(self.mk_bv(result, width))
            }
        }
    }

    fn int_args(&self, vals: &[ValId]) -> Option<SmallVec<[BigInt; 2]>> {
        vals.iter().map(|&v| self.val(v).as_int().cloned()).collect()
    }

    /// [`evaluate`](Self::evaluate) over value terms, returning a value term
    pub fn evaluate_terms(&mut self, tm: &mut TermManager, op: Op, args: &[TermId]) -> Option<TermId> {
        let vals: SmallVec<[ValId; 4]> = args.iter().map(|&t| self.mk_val(tm, t)).collect();
        let result = self.evaluate(op, &vals)?;
        self.get_expr_from_val(tm, result)
    }

    /// Value of a ground term under the model, as a value term. Results are
    /// cached until [`reset_round`](Self::reset_round).
    pub fn evaluate_ground<M: ModelConstructor + ?Sized>(
        &mut self,
        tm: &mut TermManager,
        model: &M,
        term: TermId,
    ) -> Option<TermId> {
        if let Some(&cached) = self.ground_cache.get(&term) {
            return cached;
        }
        let result = self.evaluate_ground_uncached(tm, model, term);
        self.ground_cache.insert(term, result);
        result
    }

    fn evaluate_ground_uncached<M: ModelConstructor + ?Sized>(
        &mut self,
        tm: &mut TermManager,
        model: &M,
        term: TermId,
    ) -> Option<TermId> {
        let kind = tm.kind(term)?.clone();
        if kind.is_value() {
            return Some(term);
        }
        match kind {
            TermKind::BoundVar(_) | TermKind::Forall { .. } => None,
            TermKind::Ite(c, t, e) => {
                let cv = self.evaluate_ground(tm, model, c)?;
                if tm.is_true(cv) {
                    self.evaluate_ground(tm, model, t)
                } else if tm.is_false(cv) {
                    self.evaluate_ground(tm, model, e)
                } else {
                    None
                }
            }
            kind => {
                let mut args = Args::new();
                for child in kind.children() {
                    args.push(self.evaluate_ground(tm, model, child)?);
                }
                match kind.uninterpreted_symbol() {
                    Some(func) => model.get_indexed_def(func)?.evaluate(&args),
                    None => self.evaluate_terms(tm, kind.op()?, &args),
                }
            }
        }
    }
}

fn eval_int_arith(op: Op, ints: &[BigInt]) -> Option<BigInt> {
    match (op, ints) {
        (Op::Add, _) => Some(ints.iter().sum()),
        (Op::Mul, _) => Some(ints.iter().product()),
        (Op::Sub, [a, b]) => Some(a - b),
        (Op::Neg, [a]) => Some(-a),
        (_, [_, b]) if b.is_zero() => None,
        (Op::Div, [a, b]) => Some(a.div_euclid(b)),
        (Op::Mod, [a, b]) => Some(a.rem_euclid(b)),
        (Op::Rem, [a, b]) => {
            let m = a.rem_euclid(b);
            Some(if b.is_negative() { -m } else { m })
        }
        _ => None,
    }
}
