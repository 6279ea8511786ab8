//! Piecewise definitions
//!
//! A [`Def`] is an ordered list of `(condition, value tuple)` entries read
//! with first-match semantics. Appending rejects any entry whose condition is
//! generalized by an entry already present, so an appended entry is never
//! dead on arrival.
//!
//! The common case (conditions made of `Star` and singleton slots) is decided
//! by a trie over slot handles. Once intervals are involved, generalization is
//! no longer an identity question and a scan over the earlier entries
//! complements the trie.

use super::lattice::Lattice;
use super::value::{AbsId, CondId, TupleId};
use qcheck_core::TermManager;
use rustc_hash::FxHashMap;
use std::fmt;

#[derive(Debug, Clone, Default)]
struct TrieNode {
    /// Child per slot value; `None` below the last slot
    children: FxHashMap<AbsId, Option<u32>>,
}

/// Trie over the slot sequences of the conditions inserted so far
#[derive(Debug, Clone)]
struct CondTrie {
    nodes: Vec<TrieNode>,
    /// A 0-arity condition has been inserted
    has_empty: bool,
}

impl CondTrie {
    fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            has_empty: false,
        }
    }

    /// Is some inserted condition a generalization of `cond`, looking only
    /// at slot identity and `Star`
    fn has_generalization(&self, cond: &[AbsId], star: AbsId) -> bool {
        if cond.is_empty() {
            return self.has_empty;
        }
        self.has_generalization_at(0, cond, 0, star)
    }

    fn has_generalization_at(&self, node: usize, cond: &[AbsId], index: usize, star: AbsId) -> bool {
        let last = index + 1 == cond.len();
        let children = &self.nodes[node].children;
        let mut candidates = [Some(cond[index]), None];
        if cond[index] != star {
            candidates[1] = Some(star);
        }
        for slot in candidates.into_iter().flatten() {
            if let Some(&child) = children.get(&slot) {
                if last {
                    return true;
                }
                if let Some(child) = child
                    && self.has_generalization_at(child as usize, cond, index + 1, star)
                {
                    return true;
                }
            }
        }
        false
    }

    /// Insert `cond` unless a generalization of it is already present
    fn add(&mut self, cond: &[AbsId], star: AbsId) -> bool {
        if cond.is_empty() {
            return !std::mem::replace(&mut self.has_empty, true);
        }
        self.add_at(0, cond, 0, star)
    }

    fn add_at(&mut self, node: usize, cond: &[AbsId], index: usize, star: AbsId) -> bool {
        let last = index + 1 == cond.len();
        let curr = cond[index];
        if curr != star
            && let Some(&star_child) = self.nodes[node].children.get(&star)
        {
            if last {
                return false;
            }
            if let Some(child) = star_child
                && self.has_generalization_at(child as usize, cond, index + 1, star)
            {
                return false;
            }
        }
        match self.nodes[node].children.get(&curr) {
            Some(_) if last => false,
            Some(&Some(child)) => self.add_at(child as usize, cond, index + 1, star),
            Some(&None) => false,
            None => {
                if last {
                    self.nodes[node].children.insert(curr, None);
                    return true;
                }
                let child = self.nodes.len() as u32;
                self.nodes.push(TrieNode::default());
                self.nodes[node].children.insert(curr, Some(child));
                self.add_at(child as usize, cond, index + 1, star)
            }
        }
    }
}

/// Ordered `(condition, value tuple)` entries with first-match semantics
#[derive(Debug, Clone)]
pub struct Def {
    entries: Vec<(CondId, TupleId)>,
    trie: CondTrie,
    has_intervals: bool,
}

impl Def {
    /// Create an empty definition
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            trie: CondTrie::new(),
            has_intervals: false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(CondId, TupleId)] {
        &self.entries
    }

    pub fn condition(&self, i: usize) -> CondId {
        self.entries[i].0
    }

    pub fn value(&self, i: usize) -> TupleId {
        self.entries[i].1
    }

    /// Is `cond` generalized by an entry already present
    pub fn has_generalization(&self, lat: &Lattice, cond: CondId) -> bool {
        if self.trie.has_generalization(lat.cond(cond), lat.mk_star()) {
            return true;
        }
        (self.has_intervals || lat.cond_has_interval(cond))
            && self
                .entries
                .iter()
                .any(|&(c, _)| lat.is_generalization_cond(c, cond))
    }

    /// Append an entry unless its condition is generalized by an existing
    /// one. Returns whether the entry was added.
    pub fn append_entry(&mut self, lat: &Lattice, cond: CondId, value: TupleId) -> bool {
        let has_interval = lat.cond_has_interval(cond);
        if (self.has_intervals || has_interval)
            && self
                .entries
                .iter()
                .any(|&(c, _)| lat.is_generalization_cond(c, cond))
        {
            return false;
        }
        if !self.trie.add(lat.cond(cond), lat.mk_star()) {
            return false;
        }
        self.has_intervals |= has_interval;
        self.entries.push((cond, value));
        true
    }

    /// Value of the first entry whose condition is compatible with `cond`
    pub fn evaluate(&self, lat: &Lattice, cond: CondId) -> Option<TupleId> {
        self.entries
            .iter()
            .find(|&&(c, _)| lat.is_compatible_cond(c, cond))
            .map(|&(_, v)| v)
    }

    /// Drop every entry that is generalized by a later entry carrying an
    /// equal value, provided no compatible entry in between disagrees.
    pub fn simplify(&mut self, lat: &Lattice) {
        let mut i = 0;
        while i < self.entries.len() {
            let (ci, vi) = self.entries[i];
            let mut redundant = false;
            for &(cj, vj) in &self.entries[i + 1..] {
                if lat.is_compatible_cond(cj, ci) {
                    if !lat.is_eq_tuple(vj, vi) {
                        break;
                    }
                    if lat.is_generalization_cond(cj, ci) {
                        redundant = true;
                        break;
                    }
                }
            }
            if redundant {
                self.entries.remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// Same conditions, one new value per entry
    pub(crate) fn with_values(&self, values: impl IntoIterator<Item = TupleId>) -> Def {
        let mut def = self.clone();
        for (entry, value) in def.entries.iter_mut().zip(values) {
            entry.1 = value;
        }
        def
    }

    /// Render with a lattice and term manager at hand
    pub fn display<'a>(&'a self, lat: &'a Lattice, tm: &'a TermManager) -> DefDisplay<'a> {
        DefDisplay { def: self, lat, tm }
    }
}

impl Default for Def {
    fn default() -> Self {
        Self::new()
    }
}

/// One line per entry: `(slots) -> values`
pub struct DefDisplay<'a> {
    def: &'a Def,
    lat: &'a Lattice,
    tm: &'a TermManager,
}

impl fmt::Display for DefDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &(c, v) in &self.def.entries {
            writeln!(
                f,
                "{} -> {}",
                self.lat.show_cond(self.tm, c),
                self.lat.show_tuple(self.tm, v)
            )?;
        }
        Ok(())
    }
}
