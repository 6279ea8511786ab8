//! Candidate models as seen by the evaluator
//!
//! The evaluator never builds interpretations itself. It asks a
//! [`ModelConstructor`] for the definition of each uninterpreted symbol, for
//! the universe of a sort and for the relevant domain of a quantified
//! variable, and hands falsifying conditions back to it to obtain witness
//! terms.
//!
//! [`TableModel`] is a plain table-backed implementation, enough to drive
//! the evaluator from tests and small drivers.

use super::context::EvalCtx;
use super::def::Def;
use super::indexed_def::IndexedDef;
use super::value::{AbsId, AbsVal, CondId, CondSlots, DefId, ValId};
use super::QuantifiedFormula;
use lasso::Spur;
use num_bigint::BigInt;
use qcheck_core::{QcheckError, Result, SortId, SortKind, TermId, TermKind, TermManager};
use rustc_hash::FxHashMap;

/// How the slot of a quantified variable is abstracted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProjectionKind {
    /// Values are distinguished point by point (`Star` slot)
    #[default]
    Pointwise,
    /// Values are grouped into intervals (unbounded `Interval` slot)
    Monotonic,
}

/// A ground term from the relevant domain of a variable, with its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelevantTerm {
    pub term: TermId,
    pub value: TermId,
}

/// Concrete terms for the variables of a quantifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Witness {
    /// One ground term per bound variable
    pub terms: Vec<TermId>,
    /// Every term was taken from a relevant domain
    pub from_relevant_domain: bool,
}

/// Source of interpretations for the evaluator
pub trait ModelConstructor {
    /// Definition of an uninterpreted symbol, over its own argument positions.
    /// Definitions are allocated in `ctx`.
    fn get_def(&mut self, ctx: &mut EvalCtx, tm: &mut TermManager, func: Spur) -> Option<DefId>;

    /// Point-wise table of an uninterpreted symbol
    fn get_indexed_def(&self, func: Spur) -> Option<&IndexedDef>;

    /// Abstraction of variable `var` of `q`
    fn projection(&self, _q: &QuantifiedFormula, _var: usize) -> ProjectionKind {
        ProjectionKind::Pointwise
    }

    /// Ground terms relevant to variable `var` of `q`
    fn relevant_domain(&self, q: &QuantifiedFormula, var: usize) -> &[RelevantTerm];

    /// Known elements of an uninterpreted sort
    fn universe(&self, sort: SortId) -> &[TermId];

    /// Witness terms for a canonical condition of `q`
    ///
    /// The witness only needs to satisfy `cond`. The checker rejects it when
    /// an earlier entry of the body's definition covers the same point.
    fn get_inst(
        &mut self,
        ctx: &mut EvalCtx,
        tm: &mut TermManager,
        q: &QuantifiedFormula,
        cond: CondId,
    ) -> Option<Witness> {
        default_witness(&*self, ctx, tm, q, cond)
    }
}

/// Witnesses preferring relevant-domain terms.
///
/// A point slot takes a relevant term with that value, else the value itself;
/// an interval slot takes a relevant term inside the interval, else one of its
/// bounds; a `Star` slot takes the first relevant term, else a default element
/// of the sort. Symbolic slots have no witness.
pub fn default_witness<M: ModelConstructor + ?Sized>(
    model: &M,
    ctx: &mut EvalCtx,
    tm: &mut TermManager,
    q: &QuantifiedFormula,
    cond: CondId,
) -> Option<Witness> {
    let slots = ctx.cond(cond).to_vec();
    if slots.len() != q.num_vars() {
        return None;
    }
    let mut terms = Vec::with_capacity(slots.len());
    let mut from_relevant_domain = true;
    for (i, a) in slots.into_iter().enumerate() {
        let domain = model.relevant_domain(q, i);
        let relevant = match ctx.abs(a) {
            AbsVal::Value(v) => {
                let value = ctx.get_expr_from_val(tm, v)?;
                domain.iter().find(|r| r.value == value).map(|r| r.term)
            }
            AbsVal::Star => domain.first().map(|r| r.term),
            AbsVal::Interval(l, u) => domain
                .iter()
                .find(|r| in_interval(ctx, tm, r.value, l, u))
                .map(|r| r.term),
        };
        let term = match relevant {
            Some(t) => t,
            None => {
                from_relevant_domain = false;
                fallback_witness(model, ctx, tm, q, i, a)?
            }
        };
        terms.push(term);
    }
    Some(Witness {
        terms,
        from_relevant_domain,
    })
}

fn fallback_witness<M: ModelConstructor + ?Sized>(
    model: &M,
    ctx: &mut EvalCtx,
    tm: &mut TermManager,
    q: &QuantifiedFormula,
    var: usize,
    a: AbsId,
) -> Option<TermId> {
    match ctx.abs(a) {
        AbsVal::Value(v) => ctx.get_expr_from_val(tm, v),
        AbsVal::Interval(Some(b), _) | AbsVal::Interval(None, Some(b)) => ctx.get_expr_from_val(tm, b),
        AbsVal::Star | AbsVal::Interval(None, None) => default_element(model, tm, q.var_sort(var)?),
    }
}

fn in_interval(ctx: &EvalCtx, tm: &TermManager, value: TermId, l: Option<ValId>, u: Option<ValId>) -> bool {
    let Some(TermKind::IntConst(n)) = tm.kind(value) else {
        return false;
    };
    let above = l.is_none_or(|l| ctx.val(l).as_int().is_some_and(|l| l <= n));
    let below = u.is_none_or(|u| ctx.val(u).as_int().is_some_and(|u| n <= u));
    above && below
}

/// Some element of `sort`: zero, false, or the first universe element
pub fn default_element<M: ModelConstructor + ?Sized>(
    model: &M,
    tm: &mut TermManager,
    sort: SortId,
) -> Option<TermId> {
    match tm.sorts.kind(sort)?.clone() {
        SortKind::Bool => Some(tm.mk_false()),
        SortKind::Int => Some(tm.mk_int(BigInt::from(0))),
        SortKind::BitVec(width) => Some(tm.mk_bitvec(BigInt::from(0), width)),
        SortKind::Uninterpreted(_) => model.universe(sort).first().copied(),
    }
}

/// Table-backed candidate model.
///
/// Definitions minted by [`get_def`](ModelConstructor::get_def) belong to the
/// [`EvalCtx`] they were allocated in; call [`clear_cache`](Self::clear_cache)
/// before using the model with another context.
#[derive(Debug, Default)]
pub struct TableModel {
    functions: FxHashMap<Spur, IndexedDef>,
    universes: FxHashMap<SortId, Vec<TermId>>,
    relevant: FxHashMap<(TermId, usize), Vec<RelevantTerm>>,
    projections: FxHashMap<(TermId, usize), ProjectionKind>,
    def_cache: FxHashMap<Spur, DefId>,
}

impl TableModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an uninterpreted function with an empty table
    pub fn declare_function(&mut self, tm: &mut TermManager, name: &str, arity: usize) -> Spur {
        let func = tm.intern(name);
        self.functions.entry(func).or_insert_with(|| IndexedDef::new(arity));
        func
    }

    fn table_mut(&mut self, tm: &TermManager, func: Spur) -> Result<&mut IndexedDef> {
        self.def_cache.remove(&func);
        self.functions
            .get_mut(&func)
            .ok_or_else(|| QcheckError::UnknownSymbol(tm.resolve_str(func).to_string()))
    }

    /// Add `func(args) = result`; false if the tuple was already defined
    pub fn add_entry(&mut self, tm: &TermManager, func: Spur, args: &[TermId], result: TermId) -> Result<bool> {
        self.add_annotated_entry(tm, func, args, args, result)
    }

    /// Add `func(args) = result` with witness terms for each argument
    pub fn add_annotated_entry(
        &mut self,
        tm: &TermManager,
        func: Spur,
        args: &[TermId],
        annotations: &[TermId],
        result: TermId,
    ) -> Result<bool> {
        let table = self.table_mut(tm, func)?;
        for len in [args.len(), annotations.len()] {
            if len != table.arity() {
                return Err(QcheckError::arity(tm.resolve_str(func), table.arity(), len));
            }
        }
        Ok(table.append_annotated(args, annotations, result))
    }

    /// Value of `func` outside its explicit entries
    pub fn set_else(&mut self, tm: &TermManager, func: Spur, value: TermId) -> Result<()> {
        self.table_mut(tm, func)?.set_else(value);
        Ok(())
    }

    /// Declare a free constant with its value
    pub fn set_constant(&mut self, tm: &mut TermManager, name: &str, value: TermId) -> Spur {
        let func = self.declare_function(tm, name, 0);
        self.def_cache.remove(&func);
        if let Some(table) = self.functions.get_mut(&func) {
            table.set_else(value);
        }
        func
    }

    pub fn add_to_universe(&mut self, sort: SortId, element: TermId) {
        let universe = self.universes.entry(sort).or_default();
        if !universe.contains(&element) {
            universe.push(element);
        }
    }

    /// Record `term` (with model value `value`) as relevant to variable `var`
    pub fn add_relevant(&mut self, q: &QuantifiedFormula, var: usize, term: TermId, value: TermId) {
        let domain = self.relevant.entry((q.term, var)).or_default();
        let rt = RelevantTerm { term, value };
        if !domain.contains(&rt) {
            domain.push(rt);
        }
    }

    pub fn set_projection(&mut self, q: &QuantifiedFormula, var: usize, kind: ProjectionKind) {
        self.projections.insert((q.term, var), kind);
    }

    /// Forget definitions minted for an evaluation context
    pub fn clear_cache(&mut self) {
        self.def_cache.clear();
    }
}

impl ModelConstructor for TableModel {
    fn get_def(&mut self, ctx: &mut EvalCtx, tm: &mut TermManager, func: Spur) -> Option<DefId> {
        if let Some(&d) = self.def_cache.get(&func) {
            return Some(d);
        }
        let table = self.functions.get(&func)?;
        let mut def = Def::new();
        for entry in table.entries() {
            let slots: CondSlots = entry
                .args
                .iter()
                .map(|&arg| {
                    let v = ctx.mk_val(tm, arg);
                    ctx.mk_value(v)
                })
                .collect();
            let cond = ctx.mk_cond(slots);
            let v = ctx.mk_val(tm, entry.result);
            let value = ctx.mk_value_tuple(v);
            def.append_entry(ctx.lattice(), cond, value);
        }
        if let Some(else_value) = table.else_value() {
            let cond = ctx.mk_star_cond(table.arity());
            let v = ctx.mk_val(tm, else_value);
            let value = ctx.mk_value_tuple(v);
            def.append_entry(ctx.lattice(), cond, value);
        }
        let d = ctx.alloc_def(def);
        self.def_cache.insert(func, d);
        Some(d)
    }

    fn get_indexed_def(&self, func: Spur) -> Option<&IndexedDef> {
        self.functions.get(&func)
    }

    fn projection(&self, q: &QuantifiedFormula, var: usize) -> ProjectionKind {
        self.projections.get(&(q.term, var)).copied().unwrap_or_default()
    }

    fn relevant_domain(&self, q: &QuantifiedFormula, var: usize) -> &[RelevantTerm] {
        self.relevant.get(&(q.term, var)).map_or(&[], Vec::as_slice)
    }

    fn universe(&self, sort: SortId) -> &[TermId] {
        self.universes.get(&sort).map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forall_int(tm: &mut TermManager) -> QuantifiedFormula {
        let int = tm.sorts.int_sort;
        let x = tm.mk_bound_var(0, int);
        let zero = tm.mk_int(BigInt::from(0));
        let body = tm.mk_ge(x, zero);
        let q = tm.mk_forall([("x", int)], body);
        QuantifiedFormula::from_term(tm, q).unwrap()
    }

    #[test]
    fn test_table_def_has_else_last() {
        let mut tm = TermManager::new();
        let mut ctx = EvalCtx::new(&tm);
        let mut model = TableModel::new();
        let f = model.declare_function(&mut tm, "f", 1);
        let (one, two, five) = (
            tm.mk_int(BigInt::from(1)),
            tm.mk_int(BigInt::from(2)),
            tm.mk_int(BigInt::from(5)),
        );
        model.add_entry(&tm, f, &[one], two).unwrap();
        model.set_else(&tm, f, five).unwrap();

        let d = model.get_def(&mut ctx, &mut tm, f).unwrap();
        let def = ctx.def(d).clone();
        assert_eq!(def.len(), 2);
        let star = ctx.mk_star_cond(1);
        assert_eq!(def.condition(1), star);
        let v5 = ctx.mk_val(&tm, five);
        assert_eq!(ctx.tuple(def.value(1)), &[v5]);
        // cached
        assert_eq!(model.get_def(&mut ctx, &mut tm, f), Some(d));
    }

    #[test]
    fn test_arity_and_unknown_symbol_errors() {
        let mut tm = TermManager::new();
        let mut model = TableModel::new();
        let f = model.declare_function(&mut tm, "f", 2);
        let one = tm.mk_int(BigInt::from(1));
        assert!(matches!(
            model.add_entry(&tm, f, &[one], one),
            Err(QcheckError::ArityMismatch { expected: 2, actual: 1, .. })
        ));
        let g = tm.intern("g");
        assert!(matches!(model.set_else(&tm, g, one), Err(QcheckError::UnknownSymbol(_))));
    }

    #[test]
    fn test_witness_prefers_relevant_term() {
        let mut tm = TermManager::new();
        let mut ctx = EvalCtx::new(&tm);
        let mut model = TableModel::new();
        let q = forall_int(&mut tm);
        let c = tm.mk_var("c", tm.sorts.int_sort);
        let three = tm.mk_int(BigInt::from(3));
        model.add_relevant(&q, 0, c, three);

        let v3 = ctx.mk_val(&tm, three);
        let a = ctx.mk_value(v3);
        let cond = ctx.mk_cond([a]);
        let w = model.get_inst(&mut ctx, &mut tm, &q, cond).unwrap();
        assert_eq!(w.terms, vec![c]);
        assert!(w.from_relevant_domain);

        let v4 = ctx.mk_int(BigInt::from(4));
        let a = ctx.mk_value(v4);
        let cond = ctx.mk_cond([a]);
        let w = model.get_inst(&mut ctx, &mut tm, &q, cond).unwrap();
        assert_eq!(w.terms, vec![tm.mk_int(BigInt::from(4))]);
        assert!(!w.from_relevant_domain);
    }

    #[test]
    fn test_witness_for_interval() {
        let mut tm = TermManager::new();
        let mut ctx = EvalCtx::new(&tm);
        let mut model = TableModel::new();
        let q = forall_int(&mut tm);
        let c = tm.mk_var("c", tm.sorts.int_sort);
        let d = tm.mk_var("d", tm.sorts.int_sort);
        let (m2, nine) = (tm.mk_int(BigInt::from(-2)), tm.mk_int(BigInt::from(9)));
        model.add_relevant(&q, 0, c, nine);
        model.add_relevant(&q, 0, d, m2);

        let upper = ctx.mk_int(BigInt::from(-1));
        let a = ctx.mk_interval(None, Some(upper));
        let cond = ctx.mk_cond([a]);
        let w = model.get_inst(&mut ctx, &mut tm, &q, cond).unwrap();
        assert_eq!(w.terms, vec![d]);

        let lower = ctx.mk_int(BigInt::from(20));
        let a = ctx.mk_interval(Some(lower), None);
        let cond = ctx.mk_cond([a]);
        let w = model.get_inst(&mut ctx, &mut tm, &q, cond).unwrap();
        assert_eq!(w.terms, vec![tm.mk_int(BigInt::from(20))]);
    }

    #[test]
    fn test_no_witness_for_symbolic_slot() {
        let mut tm = TermManager::new();
        let mut ctx = EvalCtx::new(&tm);
        let mut model = TableModel::new();
        let q = forall_int(&mut tm);
        let x = ctx.mk_var_offset_val(0, None, false);
        let a = ctx.mk_value(x);
        let cond = ctx.mk_cond([a]);
        assert!(model.get_inst(&mut ctx, &mut tm, &q, cond).is_none());
    }

    #[test]
    fn test_default_element_for_uninterpreted_sort() {
        let mut tm = TermManager::new();
        let mut model = TableModel::new();
        let u = tm.mk_uninterpreted_sort("U");
        assert_eq!(default_element(&model, &mut tm, u), None);
        let e = tm.mk_uninterpreted_value(u, 0);
        model.add_to_universe(u, e);
        assert_eq!(default_element(&model, &mut tm, u), Some(e));
    }
}
