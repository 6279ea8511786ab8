//! Values and abstract values
//!
//! [`Val`] is the leaf of evaluation: a concrete integer or bit-vector, an
//! opaque term handle, or a symbolic "variable plus offset". [`AbsVal`] is the
//! three-case lattice over values used for the slots of a condition.
//!
//! Neither type is handled by value outside the arena: everything refers to
//! arena entries through the copyable handles defined here.

use num_bigint::BigInt;
use qcheck_core::TermId;
use smallvec::SmallVec;
use std::fmt;

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Position of the object in its arena
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

define_handle!(
    /// Handle to an interned [`Val`]
    ValId
);
define_handle!(
    /// Handle to an interned [`AbsVal`]
    AbsId
);
define_handle!(
    /// Handle to an interned condition (tuple of abstract values)
    CondId
);
define_handle!(
    /// Handle to an interned value tuple
    TupleId
);
define_handle!(
    /// Handle to a [`Def`](super::def::Def) owned by an evaluation context
    DefId
);

/// A value produced by evaluation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Val {
    /// Exact integer
    Int(BigInt),
    /// Bit-vector, `value` kept in `[0, 2^width)`
    Bv { value: BigInt, width: u32 },
    /// Opaque canonical term (Booleans, universe elements, unevaluated terms)
    Expr(TermId),
    /// `(negated ? -x : x) + offset` for bound variable `x`; a bare variable
    /// is the case with no offset
    VarOffset {
        var: u32,
        offset: Option<ValId>,
        negated: bool,
    },
}

impl Val {
    /// Integer payload
    pub fn as_int(&self) -> Option<&BigInt> {
        match self {
            Val::Int(n) => Some(n),
            _ => None,
        }
    }

    /// True for `Int` and `Bv`
    pub fn is_numeral(&self) -> bool {
        matches!(self, Val::Int(_) | Val::Bv { .. })
    }

    /// Bound variable this value refers to
    pub fn var(&self) -> Option<u32> {
        match self {
            Val::VarOffset { var, .. } => Some(*var),
            _ => None,
        }
    }
}

/// Abstract value: a set of values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbsVal {
    /// Any value
    Star,
    /// Exactly one value
    Value(ValId),
    /// Closed interval; `None` is unbounded on that side
    Interval(Option<ValId>, Option<ValId>),
}

impl AbsVal {
    pub fn is_star(&self) -> bool {
        matches!(self, AbsVal::Star)
    }

    pub fn is_interval(&self) -> bool {
        matches!(self, AbsVal::Interval(..))
    }
}

/// Slots of a condition, one per bound variable
pub type CondSlots = SmallVec<[AbsId; 4]>;

/// Components of a value tuple
pub type TupleVals = SmallVec<[ValId; 2]>;
