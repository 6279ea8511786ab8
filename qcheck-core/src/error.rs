//! Error types for the term layer and the model-checking API boundary.

use crate::ast::TermId;
use thiserror::Error;

/// Errors surfaced by qcheck at its API boundary.
///
/// The evaluator itself never fails with an error: unevaluable shapes and
/// composition failures are ordinary return values. These variants cover
/// misuse of handles and ill-formed inputs handed to the library.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QcheckError {
    /// The term handle does not belong to this manager
    #[error("unknown term {0:?}")]
    UnknownTerm(TermId),

    /// A quantifier was expected
    #[error("term {0:?} is not a universal quantifier")]
    NotAQuantifier(TermId),

    /// Wrong number of arguments or witnesses
    #[error("arity mismatch for {name}: expected {expected}, got {actual}")]
    ArityMismatch {
        /// Symbol or construct that was applied
        name: String,
        /// Expected arity
        expected: usize,
        /// Arity that was supplied
        actual: usize,
    },

    /// Sort check failed
    #[error("sort mismatch: expected {expected}, got {actual}")]
    SortMismatch {
        /// Expected sort
        expected: String,
        /// Actual sort
        actual: String,
    },

    /// A symbol has no interpretation where one is required
    #[error("no interpretation for symbol `{0}`")]
    UnknownSymbol(String),
}

impl QcheckError {
    /// Shorthand for an arity mismatch on a named symbol.
    pub fn arity(name: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::ArityMismatch {
            name: name.into(),
            expected,
            actual,
        }
    }
}

/// Result type used across qcheck.
pub type Result<T> = std::result::Result<T, QcheckError>;
