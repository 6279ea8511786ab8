//! Point-wise function tables with binary-search lookup
//!
//! An [`IndexedDef`] interprets an uninterpreted symbol by a finite set of
//! argument tuples (all value terms) plus an else value. Tuples are kept in a
//! sorted index under [`compare_index`], so lookup is a binary search over
//! term handles instead of a scan.
//!
//! Each entry also carries one annotation term per argument: a ground term
//! that evaluates to that argument in the model. The search in
//! [`eval_check`](super::eval_check) instantiates with annotations, so the
//! produced lemmas mention terms the solver already knows about.

use qcheck_core::ast::Args;
use qcheck_core::TermId;
use std::cmp::Ordering;

/// One row of an indexed definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Argument values
    pub args: Args,
    /// Ground terms witnessing each argument
    pub annotations: Args,
    /// Value of the function at `args`
    pub result: TermId,
}

/// Ordering of argument tuples used by the index.
///
/// Element-wise over term handles, a tuple whose element is *smaller* compares
/// as `Greater`. The index is therefore sorted in descending lexicographic
/// order, and lookups must use this same function.
pub fn compare_index(a: &[TermId], b: &[TermId]) -> Ordering {
    debug_assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        if x < y {
            return Ordering::Greater;
        } else if x > y {
            return Ordering::Less;
        }
    }
    Ordering::Equal
}

/// Finite table of argument tuples with an optional else value
#[derive(Debug, Clone, Default)]
pub struct IndexedDef {
    arity: usize,
    /// Insertion order
    entries: Vec<Entry>,
    /// Positions into `entries`, sorted by [`compare_index`]
    index: Vec<u32>,
    else_value: Option<TermId>,
}

impl IndexedDef {
    pub fn new(arity: usize) -> Self {
        Self {
            arity,
            ..Self::default()
        }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Number of explicit entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn else_value(&self) -> Option<TermId> {
        self.else_value
    }

    pub fn set_else(&mut self, value: TermId) {
        self.else_value = Some(value);
    }

    /// Entries in index order
    pub fn sorted_entries(&self) -> impl Iterator<Item = &Entry> {
        self.index.iter().map(|&i| &self.entries[i as usize])
    }

    fn search(&self, args: &[TermId]) -> Result<usize, usize> {
        self.index
            .binary_search_by(|&i| compare_index(&self.entries[i as usize].args, args))
    }

    /// Add a row annotated by its own argument values. Returns false when the
    /// tuple is already present.
    pub fn append_entry(&mut self, args: &[TermId], result: TermId) -> bool {
        self.append_annotated(args, args, result)
    }

    /// Add a row with explicit witness terms per argument. Returns false when
    /// the tuple is already present; the first row for a tuple wins.
    pub fn append_annotated(&mut self, args: &[TermId], annotations: &[TermId], result: TermId) -> bool {
        debug_assert_eq!(args.len(), self.arity);
        debug_assert_eq!(annotations.len(), self.arity);
        match self.search(args) {
            Ok(_) => false,
            Err(pos) => {
                self.index.insert(pos, self.entries.len() as u32);
                self.entries.push(Entry {
                    args: args.iter().copied().collect(),
                    annotations: annotations.iter().copied().collect(),
                    result,
                });
                true
            }
        }
    }

    /// Explicit row for `args`, ignoring the else value
    pub fn lookup(&self, args: &[TermId]) -> Option<&Entry> {
        if args.len() != self.arity {
            return None;
        }
        self.search(args).ok().map(|pos| &self.entries[self.index[pos] as usize])
    }

    /// Value at `args`, falling back to the else value
    pub fn evaluate(&self, args: &[TermId]) -> Option<TermId> {
        match self.lookup(args) {
            Some(entry) => Some(entry.result),
            None => self.else_value,
        }
    }

    /// [`evaluate`](Self::evaluate) by a linear scan under the same ordering
    pub fn evaluate_linear(&self, args: &[TermId]) -> Option<TermId> {
        self.entries
            .iter()
            .find(|e| e.args.len() == args.len() && compare_index(&e.args, args) == Ordering::Equal)
            .map(|e| e.result)
            .or(self.else_value)
    }
}
