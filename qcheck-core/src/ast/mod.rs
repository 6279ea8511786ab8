//! Hash-consed terms
//!
//! Every term lives in a [`TermManager`] and is referred to by a [`TermId`].
//! Construction is hash-consed, so two structurally equal terms always have
//! the same id and term identity can be compared in O(1).

mod manager;
mod printer;
pub mod traversal;

pub use manager::TermManager;
pub use printer::TermDisplay;

use crate::sort::SortId;
use lasso::Spur;
use num_bigint::BigInt;
use smallvec::SmallVec;

/// Handle to a term in a [`TermManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(pub u32);

impl TermId {
    /// Create a term id from a raw index
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw index of this term
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Argument list of n-ary terms
pub type Args = SmallVec<[TermId; 4]>;

/// Interpreted operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Not,
    And,
    Or,
    Implies,
    Ite,
    Eq,
    Distinct,
    Add,
    Sub,
    Mul,
    Neg,
    Div,
    Mod,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    BvAdd,
    BvSub,
    BvMul,
    BvUlt,
    BvUle,
}

impl Op {
    /// Integer order relations (`<`, `<=`, `>`, `>=`)
    pub fn is_int_relation(self) -> bool {
        matches!(self, Op::Lt | Op::Le | Op::Gt | Op::Ge)
    }

    /// SMT-LIB name of the operator
    pub fn name(self) -> &'static str {
        match self {
            Op::Not => "not",
            Op::And => "and",
            Op::Or => "or",
            Op::Implies => "=>",
            Op::Ite => "ite",
            Op::Eq => "=",
            Op::Distinct => "distinct",
            Op::Add => "+",
            Op::Sub | Op::Neg => "-",
            Op::Mul => "*",
            Op::Div => "div",
            Op::Mod => "mod",
            Op::Rem => "rem",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::BvAdd => "bvadd",
            Op::BvSub => "bvsub",
            Op::BvMul => "bvmul",
            Op::BvUlt => "bvult",
            Op::BvUle => "bvule",
        }
    }
}

/// The shape of a term
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermKind {
    True,
    False,
    IntConst(BigInt),
    /// Bit-vector literal, `value` is kept in `[0, 2^width)`
    BitVecConst {
        value: BigInt,
        width: u32,
    },
    /// Element of the universe of an uninterpreted sort
    UninterpretedValue {
        sort: SortId,
        index: u32,
    },
    /// Free constant (0-ary uninterpreted symbol)
    Var(Spur),
    /// The i-th variable of the enclosing quantifier
    BoundVar(u32),
    Not(TermId),
    And(Args),
    Or(Args),
    Implies(TermId, TermId),
    Ite(TermId, TermId, TermId),
    Eq(TermId, TermId),
    Distinct(Args),
    Add(Args),
    Sub(TermId, TermId),
    Mul(Args),
    Neg(TermId),
    Div(TermId, TermId),
    Mod(TermId, TermId),
    Rem(TermId, TermId),
    Lt(TermId, TermId),
    Le(TermId, TermId),
    Gt(TermId, TermId),
    Ge(TermId, TermId),
    BvAdd(TermId, TermId),
    BvSub(TermId, TermId),
    BvMul(TermId, TermId),
    BvUlt(TermId, TermId),
    BvUle(TermId, TermId),
    /// Application of an uninterpreted function
    Apply {
        func: Spur,
        args: Args,
    },
    /// Universal quantifier; the body refers to `vars[i]` as `BoundVar(i)`
    Forall {
        vars: SmallVec<[(Spur, SortId); 4]>,
        body: TermId,
    },
}

impl TermKind {
    /// Literal values: Booleans, numerals and universe elements
    pub fn is_value(&self) -> bool {
        matches!(
            self,
            TermKind::True
                | TermKind::False
                | TermKind::IntConst(_)
                | TermKind::BitVecConst { .. }
                | TermKind::UninterpretedValue { .. }
        )
    }

    /// Uninterpreted symbol applied to arguments; free constants count as 0-ary
    pub fn uninterpreted_symbol(&self) -> Option<Spur> {
        match self {
            TermKind::Var(name) => Some(*name),
            TermKind::Apply { func, .. } => Some(*func),
            _ => None,
        }
    }

    /// Interpreted operator of this term, if any
    pub fn op(&self) -> Option<Op> {
        let op = match self {
            TermKind::Not(_) => Op::Not,
            TermKind::And(_) => Op::And,
            TermKind::Or(_) => Op::Or,
            TermKind::Implies(..) => Op::Implies,
            TermKind::Ite(..) => Op::Ite,
            TermKind::Eq(..) => Op::Eq,
            TermKind::Distinct(_) => Op::Distinct,
            TermKind::Add(_) => Op::Add,
            TermKind::Sub(..) => Op::Sub,
            TermKind::Mul(_) => Op::Mul,
            TermKind::Neg(_) => Op::Neg,
            TermKind::Div(..) => Op::Div,
            TermKind::Mod(..) => Op::Mod,
            TermKind::Rem(..) => Op::Rem,
            TermKind::Lt(..) => Op::Lt,
            TermKind::Le(..) => Op::Le,
            TermKind::Gt(..) => Op::Gt,
            TermKind::Ge(..) => Op::Ge,
            TermKind::BvAdd(..) => Op::BvAdd,
            TermKind::BvSub(..) => Op::BvSub,
            TermKind::BvMul(..) => Op::BvMul,
            TermKind::BvUlt(..) => Op::BvUlt,
            TermKind::BvUle(..) => Op::BvUle,
            _ => return None,
        };
        Some(op)
    }

    /// Direct subterms, in argument order. Quantifiers report their body.
    pub fn children(&self) -> Args {
        match self {
            TermKind::True
            | TermKind::False
            | TermKind::IntConst(_)
            | TermKind::BitVecConst { .. }
            | TermKind::UninterpretedValue { .. }
            | TermKind::Var(_)
            | TermKind::BoundVar(_) => Args::new(),
            TermKind::Not(a) | TermKind::Neg(a) => smallvec::smallvec![*a],
            TermKind::And(args)
            | TermKind::Or(args)
            | TermKind::Distinct(args)
            | TermKind::Add(args)
            | TermKind::Mul(args)
            | TermKind::Apply { args, .. } => args.clone(),
            TermKind::Implies(a, b)
            | TermKind::Eq(a, b)
            | TermKind::Sub(a, b)
            | TermKind::Div(a, b)
            | TermKind::Mod(a, b)
            | TermKind::Rem(a, b)
            | TermKind::Lt(a, b)
            | TermKind::Le(a, b)
            | TermKind::Gt(a, b)
            | TermKind::Ge(a, b)
            | TermKind::BvAdd(a, b)
            | TermKind::BvSub(a, b)
            | TermKind::BvMul(a, b)
            | TermKind::BvUlt(a, b)
            | TermKind::BvUle(a, b) => smallvec::smallvec![*a, *b],
            TermKind::Ite(c, t, e) => smallvec::smallvec![*c, *t, *e],
            TermKind::Forall { body, .. } => smallvec::smallvec![*body],
        }
    }

    /// Same shape with the children replaced, in the order of [`children`].
    ///
    /// [`children`]: TermKind::children
    pub fn with_children(&self, new: &[TermId]) -> TermKind {
        debug_assert_eq!(new.len(), self.children().len());
        let args = || new.iter().copied().collect::<Args>();
        match self {
            TermKind::Not(_) => TermKind::Not(new[0]),
            TermKind::Neg(_) => TermKind::Neg(new[0]),
            TermKind::And(_) => TermKind::And(args()),
            TermKind::Or(_) => TermKind::Or(args()),
            TermKind::Distinct(_) => TermKind::Distinct(args()),
            TermKind::Add(_) => TermKind::Add(args()),
            TermKind::Mul(_) => TermKind::Mul(args()),
            TermKind::Apply { func, .. } => TermKind::Apply {
                func: *func,
                args: args(),
            },
            TermKind::Implies(..) => TermKind::Implies(new[0], new[1]),
            TermKind::Eq(..) => TermKind::Eq(new[0], new[1]),
            TermKind::Sub(..) => TermKind::Sub(new[0], new[1]),
            TermKind::Div(..) => TermKind::Div(new[0], new[1]),
            TermKind::Mod(..) => TermKind::Mod(new[0], new[1]),
            TermKind::Rem(..) => TermKind::Rem(new[0], new[1]),
            TermKind::Lt(..) => TermKind::Lt(new[0], new[1]),
            TermKind::Le(..) => TermKind::Le(new[0], new[1]),
            TermKind::Gt(..) => TermKind::Gt(new[0], new[1]),
            TermKind::Ge(..) => TermKind::Ge(new[0], new[1]),
            TermKind::BvAdd(..) => TermKind::BvAdd(new[0], new[1]),
            TermKind::BvSub(..) => TermKind::BvSub(new[0], new[1]),
            TermKind::BvMul(..) => TermKind::BvMul(new[0], new[1]),
            TermKind::BvUlt(..) => TermKind::BvUlt(new[0], new[1]),
            TermKind::BvUle(..) => TermKind::BvUle(new[0], new[1]),
            TermKind::Ite(..) => TermKind::Ite(new[0], new[1], new[2]),
            TermKind::Forall { vars, .. } => TermKind::Forall {
                vars: vars.clone(),
                body: new[0],
            },
            leaf => leaf.clone(),
        }
    }
}

/// A term: its shape and its sort
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    pub kind: TermKind,
    pub sort: SortId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_roundtrip() {
        let kind = TermKind::Ite(TermId(1), TermId(2), TermId(3));
        assert_eq!(kind.children().as_slice(), &[TermId(1), TermId(2), TermId(3)]);
        let swapped = kind.with_children(&[TermId(1), TermId(3), TermId(2)]);
        assert_eq!(swapped, TermKind::Ite(TermId(1), TermId(3), TermId(2)));
    }

    #[test]
    fn test_op_classification() {
        assert_eq!(TermKind::Lt(TermId(0), TermId(1)).op(), Some(Op::Lt));
        assert!(Op::Ge.is_int_relation());
        assert!(!Op::Eq.is_int_relation());
        assert_eq!(TermKind::BoundVar(0).op(), None);
        assert!(TermKind::IntConst(BigInt::from(3)).is_value());
    }
}
