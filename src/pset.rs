use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::traits::{CmRDT, CvRDT};

/// `PSet` is a two-phase set.
///
/// Members live in an add set, removals in a tombstone set. A member is
/// present while it is added and not tombstoned; a tombstone is permanent,
/// so a member can never come back once removed.
///
/// ```
/// use crdt_algebra::{PSet, CmRDT};
/// let s = PSet::new();
/// let s = s.apply(s.add("x"));
/// let s = s.apply(s.rm("x"));
/// let s = s.apply(s.add("x"));
/// assert!(!s.lookup(&"x"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PSet<M: Ord> {
    adds: BTreeSet<M>,
    removes: BTreeSet<M>,
}

/// Ops over a `PSet`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op<M> {
    /// Add a member
    Add {
        /// the member to add
        member: M,
    },
    /// Tombstone a member
    Rm {
        /// the member to remove
        member: M,
    },
}

impl<M: Ord> Default for PSet<M> {
    fn default() -> Self {
        PSet {
            adds: BTreeSet::new(),
            removes: BTreeSet::new(),
        }
    }
}

impl<M: Ord + Clone> CvRDT for PSet<M> {
    fn merge(&self, other: &Self) -> Self {
        PSet {
            adds: self.adds.union(&other.adds).cloned().collect(),
            removes: self.removes.union(&other.removes).cloned().collect(),
        }
    }
}

impl<M: Ord + Clone> CmRDT for PSet<M> {
    type Op = Op<M>;

    fn apply(&self, op: Self::Op) -> Self {
        let mut next = self.clone();
        match op {
            Op::Add { member } => {
                next.adds.insert(member);
            }
            Op::Rm { member } => {
                // removing something never added is a no-op
                if self.adds.contains(&member) {
                    next.removes.insert(member);
                }
            }
        }
        next
    }
}

impl<M: Ord + Clone> PSet<M> {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a set from its persisted add and remove collections.
    pub fn from_parts(adds: BTreeSet<M>, removes: BTreeSet<M>) -> Self {
        PSet { adds, removes }
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
        self.adds.contains(member) && !self.removes.contains(member)
    }

    /// The present members.
    pub fn values(&self) -> BTreeSet<M> {
        self.adds.difference(&self.removes).cloned().collect()
    }

    /// Every member ever added.
    pub fn adds(&self) -> &BTreeSet<M> {
        &self.adds
    }

    /// Every member ever removed.
    pub fn removes(&self) -> &BTreeSet<M> {
        &self.removes
    }
}
