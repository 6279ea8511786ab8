//! Sort system
//!
//! Sorts are interned in a [`SortManager`]; a [`SortId`] is a cheap copyable
//! handle. Booleans and integers are pre-registered.

use lasso::Spur;
use rustc_hash::FxHashMap;
use std::fmt;

/// Handle to an interned sort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SortId(pub u32);

impl SortId {
    /// Create a sort id from a raw index
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Raw index of this sort
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// The kind of a sort
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SortKind {
    /// Booleans
    Bool,
    /// Mathematical integers
    Int,
    /// Fixed-width bit-vectors
    BitVec(u32),
    /// Uninterpreted sort with the given name
    Uninterpreted(Spur),
}

/// An interned sort
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sort {
    /// What kind of sort this is
    pub kind: SortKind,
}

impl Sort {
    /// Bit width when this is a bit-vector sort
    pub fn bv_width(&self) -> Option<u32> {
        match self.kind {
            SortKind::BitVec(w) => Some(w),
            _ => None,
        }
    }
}

/// Interning table for sorts
#[derive(Debug, Clone)]
pub struct SortManager {
    sorts: Vec<Sort>,
    cache: FxHashMap<SortKind, SortId>,
    /// The Boolean sort
    pub bool_sort: SortId,
    /// The integer sort
    pub int_sort: SortId,
}

impl SortManager {
    /// Create a manager with the built-in sorts registered
    pub fn new() -> Self {
        let mut manager = Self {
            sorts: Vec::new(),
            cache: FxHashMap::default(),
            bool_sort: SortId(0),
            int_sort: SortId(0),
        };
        manager.bool_sort = manager.intern(SortKind::Bool);
        manager.int_sort = manager.intern(SortKind::Int);
        manager
    }

    /// Intern a sort kind
    pub fn intern(&mut self, kind: SortKind) -> SortId {
        if let Some(&id) = self.cache.get(&kind) {
            return id;
        }
        let id = SortId(self.sorts.len() as u32);
        self.sorts.push(Sort { kind: kind.clone() });
        self.cache.insert(kind, id);
        id
    }

    /// Bit-vector sort of the given width
    pub fn bitvec(&mut self, width: u32) -> SortId {
        self.intern(SortKind::BitVec(width))
    }

    /// Look up a sort
    pub fn get(&self, id: SortId) -> Option<&Sort> {
        self.sorts.get(id.0 as usize)
    }

    /// Kind of a sort, if the id is known
    pub fn kind(&self, id: SortId) -> Option<&SortKind> {
        self.get(id).map(|s| &s.kind)
    }

    /// Is this the integer sort
    pub fn is_int(&self, id: SortId) -> bool {
        id == self.int_sort
    }

    /// Is this the Boolean sort
    pub fn is_bool(&self, id: SortId) -> bool {
        id == self.bool_sort
    }

    /// Width of a bit-vector sort
    pub fn bv_width(&self, id: SortId) -> Option<u32> {
        self.get(id).and_then(Sort::bv_width)
    }

    /// Is this an uninterpreted sort
    pub fn is_uninterpreted(&self, id: SortId) -> bool {
        matches!(self.kind(id), Some(SortKind::Uninterpreted(_)))
    }

    /// Number of interned sorts
    pub fn len(&self) -> usize {
        self.sorts.len()
    }

    /// True if no sorts are interned (never the case after `new`)
    pub fn is_empty(&self) -> bool {
        self.sorts.is_empty()
    }
}

impl Default for SortManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sort#{}", self.0)
    }
}
