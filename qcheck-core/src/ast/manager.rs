use super::{Args, Term, TermId, TermKind};
use crate::error::{QcheckError, Result};
use crate::sort::{SortId, SortKind, SortManager};
use lasso::{Rodeo, Spur};
use num_bigint::BigInt;
use num_traits::{One, Zero};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Term store with hash-consing and symbol interning
#[derive(Debug)]
pub struct TermManager {
    terms: Vec<Term>,
    /// Whether a term is free of bound variables (quantifiers are closed)
    ground: Vec<bool>,
    cache: FxHashMap<Term, TermId>,
    names: Rodeo,
    /// Sort table
    pub sorts: SortManager,
    true_id: TermId,
    false_id: TermId,
}

impl TermManager {
    /// Create a new term manager with `true` and `false` pre-allocated
    pub fn new() -> Self {
        let sorts = SortManager::new();
        let bool_sort = sorts.bool_sort;
        let mut manager = Self {
            terms: Vec::new(),
            ground: Vec::new(),
            cache: FxHashMap::default(),
            names: Rodeo::default(),
            sorts,
            true_id: TermId(0),
            false_id: TermId(0),
        };
        manager.true_id = manager.intern_term(TermKind::True, bool_sort);
        manager.false_id = manager.intern_term(TermKind::False, bool_sort);
        manager
    }

    fn intern_term(&mut self, kind: TermKind, sort: SortId) -> TermId {
        let term = Term { kind, sort };
        if let Some(&id) = self.cache.get(&term) {
            return id;
        }
        let ground = match &term.kind {
            TermKind::BoundVar(_) => false,
            TermKind::Forall { .. } => true,
            kind => kind
                .children()
                .iter()
                .all(|c| self.ground.get(c.0 as usize).copied().unwrap_or(true)),
        };
        let id = TermId(self.terms.len() as u32);
        self.terms.push(term.clone());
        self.ground.push(ground);
        self.cache.insert(term, id);
        id
    }

    /// Intern a symbol name
    pub fn intern(&mut self, name: &str) -> Spur {
        self.names.get_or_intern(name)
    }

    /// Resolve an interned symbol name
    pub fn resolve_str(&self, name: Spur) -> &str {
        self.names.resolve(&name)
    }

    /// Look up a term
    pub fn get(&self, id: TermId) -> Option<&Term> {
        self.terms.get(id.0 as usize)
    }

    /// Look up a term, failing on foreign handles
    pub fn try_get(&self, id: TermId) -> Result<&Term> {
        self.get(id).ok_or(QcheckError::UnknownTerm(id))
    }

    /// Shape of a term
    pub fn kind(&self, id: TermId) -> Option<&TermKind> {
        self.get(id).map(|t| &t.kind)
    }

    /// Sort of a term
    pub fn sort_of(&self, id: TermId) -> Option<SortId> {
        self.get(id).map(|t| t.sort)
    }

    /// Number of distinct terms created so far
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// True if the term contains no bound variable outside a quantifier
    pub fn is_ground(&self, id: TermId) -> bool {
        self.ground.get(id.0 as usize).copied().unwrap_or(false)
    }

    /// True for literal values (Booleans, numerals, universe elements)
    pub fn is_value(&self, id: TermId) -> bool {
        self.kind(id).is_some_and(TermKind::is_value)
    }

    /// Index of a bound variable term
    pub fn bound_var_index(&self, id: TermId) -> Option<u32> {
        match self.kind(id) {
            Some(TermKind::BoundVar(i)) => Some(*i),
            _ => None,
        }
    }

    /// The `true` constant
    pub fn mk_true(&self) -> TermId {
        self.true_id
    }

    /// The `false` constant
    pub fn mk_false(&self) -> TermId {
        self.false_id
    }

    /// A Boolean constant
    pub fn mk_bool(&self, value: bool) -> TermId {
        if value { self.true_id } else { self.false_id }
    }

    /// Is this the `true` constant
    pub fn is_true(&self, id: TermId) -> bool {
        id == self.true_id
    }

    /// Is this the `false` constant
    pub fn is_false(&self, id: TermId) -> bool {
        id == self.false_id
    }

    /// Integer numeral
    pub fn mk_int(&mut self, value: BigInt) -> TermId {
        let sort = self.sorts.int_sort;
        self.intern_term(TermKind::IntConst(value), sort)
    }

    /// Bit-vector numeral; the value is reduced modulo `2^width`
    pub fn mk_bitvec(&mut self, value: BigInt, width: u32) -> TermId {
        let modulus = BigInt::one() << width;
        let mut value = value % &modulus;
        if value < BigInt::zero() {
            value += &modulus;
        }
        let sort = self.sorts.bitvec(width);
        self.intern_term(TermKind::BitVecConst { value, width }, sort)
    }

    /// Declare (or fetch) an uninterpreted sort
    pub fn mk_uninterpreted_sort(&mut self, name: &str) -> SortId {
        let name = self.intern(name);
        self.sorts.intern(SortKind::Uninterpreted(name))
    }

    /// The `index`-th element of an uninterpreted sort's universe
    pub fn mk_uninterpreted_value(&mut self, sort: SortId, index: u32) -> TermId {
        self.intern_term(TermKind::UninterpretedValue { sort, index }, sort)
    }

    /// Free constant
    pub fn mk_var(&mut self, name: &str, sort: SortId) -> TermId {
        let name = self.intern(name);
        self.intern_term(TermKind::Var(name), sort)
    }

    /// Reference to the `index`-th variable of the enclosing quantifier
    pub fn mk_bound_var(&mut self, index: u32, sort: SortId) -> TermId {
        self.intern_term(TermKind::BoundVar(index), sort)
    }

    /// Application of an uninterpreted function. With no arguments this is
    /// the free constant of the same name.
    pub fn mk_apply(&mut self, func: &str, args: impl IntoIterator<Item = TermId>, sort: SortId) -> TermId {
        let args: Args = args.into_iter().collect();
        if args.is_empty() {
            return self.mk_var(func, sort);
        }
        let func = self.intern(func);
        self.intern_term(TermKind::Apply { func, args }, sort)
    }

    /// Logical negation
    pub fn mk_not(&mut self, arg: TermId) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern_term(TermKind::Not(arg), sort)
    }

    /// Conjunction
    pub fn mk_and(&mut self, args: impl IntoIterator<Item = TermId>) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern_term(TermKind::And(args.into_iter().collect()), sort)
    }

    /// Disjunction
    pub fn mk_or(&mut self, args: impl IntoIterator<Item = TermId>) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern_term(TermKind::Or(args.into_iter().collect()), sort)
    }

    /// Implication
    pub fn mk_implies(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern_term(TermKind::Implies(lhs, rhs), sort)
    }

    /// If-then-else; takes the sort of the then-branch
    pub fn mk_ite(&mut self, cond: TermId, then_t: TermId, else_t: TermId) -> TermId {
        let sort = self.sort_of(then_t).unwrap_or(self.sorts.bool_sort);
        self.intern_term(TermKind::Ite(cond, then_t, else_t), sort)
    }

    /// Equality
    pub fn mk_eq(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern_term(TermKind::Eq(lhs, rhs), sort)
    }

    /// Pairwise disequality
    pub fn mk_distinct(&mut self, args: impl IntoIterator<Item = TermId>) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern_term(TermKind::Distinct(args.into_iter().collect()), sort)
    }

    /// Integer sum
    pub fn mk_add(&mut self, args: impl IntoIterator<Item = TermId>) -> TermId {
        let sort = self.sorts.int_sort;
        self.intern_term(TermKind::Add(args.into_iter().collect()), sort)
    }

    /// Integer difference
    pub fn mk_sub(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.sorts.int_sort;
        self.intern_term(TermKind::Sub(lhs, rhs), sort)
    }

    /// Integer product
    pub fn mk_mul(&mut self, args: impl IntoIterator<Item = TermId>) -> TermId {
        let sort = self.sorts.int_sort;
        self.intern_term(TermKind::Mul(args.into_iter().collect()), sort)
    }

    /// Integer negation
    pub fn mk_neg(&mut self, arg: TermId) -> TermId {
        let sort = self.sorts.int_sort;
        self.intern_term(TermKind::Neg(arg), sort)
    }

    /// Integer division (Euclidean)
    pub fn mk_div(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.sorts.int_sort;
        self.intern_term(TermKind::Div(lhs, rhs), sort)
    }

    /// Integer modulus (Euclidean)
    pub fn mk_mod(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.sorts.int_sort;
        self.intern_term(TermKind::Mod(lhs, rhs), sort)
    }

    /// Integer remainder (sign of the divisor)
    pub fn mk_rem(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.sorts.int_sort;
        self.intern_term(TermKind::Rem(lhs, rhs), sort)
    }

    /// `lhs < rhs`
    pub fn mk_lt(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern_term(TermKind::Lt(lhs, rhs), sort)
    }

    /// `lhs <= rhs`
    pub fn mk_le(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern_term(TermKind::Le(lhs, rhs), sort)
    }

    /// `lhs > rhs`
    pub fn mk_gt(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern_term(TermKind::Gt(lhs, rhs), sort)
    }

    /// `lhs >= rhs`
    pub fn mk_ge(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern_term(TermKind::Ge(lhs, rhs), sort)
    }

    fn bv_sort_of(&self, t: TermId) -> SortId {
        self.sort_of(t).unwrap_or(self.sorts.int_sort)
    }

    /// Bit-vector addition
    pub fn mk_bv_add(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.bv_sort_of(lhs);
        self.intern_term(TermKind::BvAdd(lhs, rhs), sort)
    }

    /// Bit-vector subtraction
    pub fn mk_bv_sub(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.bv_sort_of(lhs);
        self.intern_term(TermKind::BvSub(lhs, rhs), sort)
    }

    /// Bit-vector multiplication
    pub fn mk_bv_mul(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.bv_sort_of(lhs);
        self.intern_term(TermKind::BvMul(lhs, rhs), sort)
    }

    /// Unsigned `lhs < rhs`
    pub fn mk_bv_ult(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern_term(TermKind::BvUlt(lhs, rhs), sort)
    }

    /// Unsigned `lhs <= rhs`
    pub fn mk_bv_ule(&mut self, lhs: TermId, rhs: TermId) -> TermId {
        let sort = self.sorts.bool_sort;
        self.intern_term(TermKind::BvUle(lhs, rhs), sort)
    }

    /// Universal quantifier over named variables. The body must refer to the
    /// i-th variable as `mk_bound_var(i, sort)`.
    pub fn mk_forall<'a>(
        &mut self,
        vars: impl IntoIterator<Item = (&'a str, SortId)>,
        body: TermId,
    ) -> TermId {
        let vars: SmallVec<[(Spur, SortId); 4]> = vars
            .into_iter()
            .map(|(name, sort)| (self.intern(name), sort))
            .collect();
        let sort = self.sorts.bool_sort;
        self.intern_term(TermKind::Forall { vars, body }, sort)
    }

    /// Rebuild a term with new children (same shape and sort)
    pub fn rebuild(&mut self, id: TermId, children: &[TermId]) -> Result<TermId> {
        let term = self.try_get(id)?;
        let kind = term.kind.with_children(children);
        let sort = term.sort;
        Ok(self.intern_term(kind, sort))
    }
}

impl Default for TermManager {
    fn default() -> Self {
        Self::new()
    }
}
