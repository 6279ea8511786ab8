//! Model-guided evaluation of quantified formulas
//!
//! Given a candidate model, decide whether a universally quantified formula
//! `∀x̄. φ(x̄)` holds, and when it does not, produce ground instances
//! `φ(t̄)` that are false in the model. Those instances are the lemmas a
//! model-based quantifier instantiation loop feeds back to the ground solver.
//!
//! # Algorithm Overview
//!
//! The body is evaluated *symbolically*: instead of enumerating assignments,
//! every subterm is mapped to a [`Def`], a finite list of
//! `condition → value` entries where a condition constrains each bound
//! variable to a point, an interval or nothing at all. Definitions of
//! uninterpreted symbols come from the model; interpreted operators combine
//! definitions by product and evaluate entry-wise. The entries of the body's
//! definition whose value is `false` describe counterexample regions, and a
//! representative of each region becomes an instantiation.
//!
//! Bodies outside the symbolic fragment are handled by
//! [`EvalCheck`](eval_check::EvalCheck), which searches the function tables
//! of the model directly, or by exhaustive enumeration over small domains.
//!
//! # Module Organization
//!
//! - `value`: handles and shapes of values, abstract values and conditions
//! - `lattice`: interning arena with meet, generalization and ordering
//! - `def`: condition → value tables with a generalization trie
//! - `context`: the evaluation context and the definition combinators
//! - `evaluate`: interpreted operators over values
//! - `indexed_def`: point-wise function tables with binary-search lookup
//! - `model`: the interface to the model under check
//! - `classify`: the symbolically checkable fragment of a body
//! - `check`: definition-based checking and exhaustive instantiation
//! - `eval_check`: heuristic evaluation-order search
//!
//! # References
//!
//! - Ge, Y., & de Moura, L. (2009). "Complete instantiation for quantified formulas
//!   in satisfiability modulo theories." CAV 2009.

use lasso::Spur;
use qcheck_core::{QcheckError, Result, SortId, TermId, TermKind, TermManager};
use smallvec::SmallVec;

pub mod check;
pub mod classify;
pub mod context;
pub mod def;
pub mod eval_check;
pub mod evaluate;
pub mod indexed_def;
pub mod lattice;
pub mod model;
pub mod value;

pub use classify::{Classification, classify};
pub use context::{EvalCtx, EvalStats};
pub use def::Def;
pub use eval_check::EvalCheck;
pub use indexed_def::{Entry, IndexedDef, compare_index};
pub use lattice::Lattice;
pub use model::{ModelConstructor, ProjectionKind, RelevantTerm, TableModel, Witness};
pub use value::{AbsId, AbsVal, CondId, DefId, TupleId, Val, ValId};

/// A universal quantifier taken apart for checking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantifiedFormula {
    /// The quantified term itself
    pub term: TermId,
    /// Bound variables (name, sort); the i-th is `BoundVar(i)` in the body
    pub bound_vars: SmallVec<[(Spur, SortId); 4]>,
    /// The body of the quantifier
    pub body: TermId,
}

impl QuantifiedFormula {
    /// Take apart a `Forall` term
    pub fn from_term(tm: &TermManager, term: TermId) -> Result<Self> {
        match tm.kind(term) {
            Some(TermKind::Forall { vars, body }) => Ok(Self {
                term,
                bound_vars: vars.clone(),
                body: *body,
            }),
            Some(_) => Err(QcheckError::NotAQuantifier(term)),
            None => Err(QcheckError::UnknownTerm(term)),
        }
    }

    /// Get the number of bound variables
    pub fn num_vars(&self) -> usize {
        self.bound_vars.len()
    }

    /// Get variable name by index
    pub fn var_name(&self, idx: usize) -> Option<Spur> {
        self.bound_vars.get(idx).map(|(name, _)| *name)
    }

    /// Get variable sort by index
    pub fn var_sort(&self, idx: usize) -> Option<SortId> {
        self.bound_vars.get(idx).map(|(_, sort)| *sort)
    }
}

/// Outcome of checking one quantifier against a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    /// The quantifier holds in the model
    Satisfied,
    /// Ground instances that are false in the model
    Refuted(Vec<TermId>),
    /// Neither proved nor refuted
    Undetermined,
}

impl CheckResult {
    /// Check if the quantifier was proved
    pub fn is_sat(&self) -> bool {
        matches!(self, Self::Satisfied)
    }

    /// Check if instantiations were found
    pub fn has_instantiations(&self) -> bool {
        matches!(self, Self::Refuted(_))
    }

    /// The instantiation lemmas, empty unless refuted
    pub fn instantiations(&self) -> &[TermId] {
        match self {
            Self::Refuted(lemmas) => lemmas,
            _ => &[],
        }
    }
}

/// Configuration for model checking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MbqiConfig {
    /// Simplify child definitions before taking their product
    pub simplify_arguments: bool,
    /// Stop composing a model definition at the first entry that covers the
    /// whole argument condition
    pub compose_early_exit: bool,
    /// Re-evaluate every instantiation and drop those that are not false
    pub verify_instantiations: bool,
    /// Heuristic search: stop an enumeration after its first instantiation
    pub eval_check_inst_limited: bool,
    /// Heuristic search: retry from other starting nodes
    pub eval_check_multiple_patterns: bool,
    /// Largest number of instances exhaustive instantiation may produce
    pub max_exhaustive_instances: usize,
}

impl Default for MbqiConfig {
    fn default() -> Self {
        Self {
            simplify_arguments: true,
            compose_early_exit: true,
            verify_instantiations: cfg!(debug_assertions),
            eval_check_inst_limited: true,
            eval_check_multiple_patterns: false,
            max_exhaustive_instances: 10_000,
        }
    }
}

impl MbqiConfig {
    /// Create default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// More lemmas per round, more work per check
    pub fn thorough() -> Self {
        Self {
            compose_early_exit: false,
            verify_instantiations: true,
            eval_check_inst_limited: false,
            eval_check_multiple_patterns: true,
            max_exhaustive_instances: 100_000,
            ..Self::default()
        }
    }

    /// Fewest lemmas per round
    pub fn fast() -> Self {
        Self {
            verify_instantiations: false,
            max_exhaustive_instances: 1_000,
            ..Self::default()
        }
    }
}
