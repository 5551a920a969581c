use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::traits::{CmRDT, CvRDT};

/// `USet` is the single-collection form of a two-phase set.
///
/// Each member is stored once with a `removed` flag. Merging ORs the flags,
/// so removal is permanent exactly as in a [`PSet`](crate::PSet) but without
/// keeping two copies of removed members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct USet<M: Ord> {
    entries: BTreeMap<M, bool>,
}

/// Ops over a `USet`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op<M> {
    /// Add a member
    Add {
        /// the member to add
        member: M,
    },
    /// Remove a member for good
    Rm {
        /// the member to remove
        member: M,
    },
}

impl<M: Ord> Default for USet<M> {
    fn default() -> Self {
        USet {
            entries: BTreeMap::new(),
        }
    }
}

impl<M: Ord + Clone> CvRDT for USet<M> {
    fn merge(&self, other: &Self) -> Self {
        let mut entries = self.entries.clone();
        for (member, removed) in other.entries.iter() {
            let entry = entries.entry(member.clone()).or_insert(false);
            *entry = *entry || *removed;
        }
        USet { entries }
    }
}

impl<M: Ord + Clone> CmRDT for USet<M> {
    type Op = Op<M>;

    fn apply(&self, op: Self::Op) -> Self {
        let mut entries = self.entries.clone();
        match op {
            Op::Add { member } => {
                entries.entry(member).or_insert(false);
            }
            Op::Rm { member } => {
                if let Some(removed) = entries.get_mut(&member) {
                    *removed = true;
                }
            }
        }
        USet { entries }
    }
}

impl<M: Ord + Clone> USet<M> {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a set from persisted `(member, removed)` entries.
    pub fn from_elements<I: IntoIterator<Item = (M, bool)>>(elements: I) -> Self {
        let mut entries = BTreeMap::new();
        for (member, removed) in elements {
            let entry = entries.entry(member).or_insert(false);
            *entry = *entry || removed;
        }
        USet { entries }
    }

    /// Build the Op that adds `member`.
    pub fn add(&self, member: M) -> Op<M> {
        Op::Add { member }
    }

    /// Build the Op that removes `member`.
    pub fn rm(&self, member: M) -> Op<M> {
        Op::Rm { member }
    }

    /// True if `member` was added and never removed.
    pub fn lookup(&self, member: &M) -> bool {
        self.entries.get(member) == Some(&false)
    }

    /// The present members.
    pub fn values(&self) -> BTreeSet<M> {
        self.entries
            .iter()
            .filter(|(_, removed)| !**removed)
            .map(|(member, _)| member.clone())
            .collect()
    }

    /// The persisted `(member, removed)` entries.
    pub fn elements(&self) -> impl Iterator<Item = (&M, bool)> {
        self.entries.iter().map(|(m, r)| (m, *r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removal_is_permanent() {
        let s = USet::new();
        let s = s.apply(s.add("x"));
        let s = s.apply(s.rm("x"));
        let s = s.apply(s.add("x"));
        assert!(!s.lookup(&"x"));
        assert!(s.values().is_empty());
    }

    #[test]
    fn test_from_elements_ors_flags() {
        let s = USet::from_elements(vec![(1, false), (1, true), (2, false)]);
        assert!(!s.lookup(&1));
        assert!(s.lookup(&2));
        assert!(!s.lookup(&3));
    }
}
