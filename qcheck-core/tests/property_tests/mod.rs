//! Property-based tests for qcheck-core
//!
//! Hash-consing and bound-variable substitution over randomly shaped
//! integer terms.

mod ast_properties;
