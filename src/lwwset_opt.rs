use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::traits::{CmRDT, CvRDT, Timestamp};

/// The latest operation seen for a member.
///
/// Ordered by timestamp, then with `removed` above not removed, so a
/// remove beats an add carrying the same timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Stamp {
    /// when the operation happened
    pub timestamp: Timestamp,
    /// whether the operation was a remove
    pub removed: bool,
}

/// `LWWOptSet` is a last-writer-wins set storing one entry per member.
///
/// The entry is replaced whenever an operation with a higher timestamp
/// arrives, whether it adds or removes.
///
/// ```
/// use crdt_algebra::{LWWOptSet, CmRDT};
/// let s = LWWOptSet::new();
/// let s = s.apply(s.add("x", 10));
/// let s = s.apply(s.rm("x", 20));
/// assert!(!s.lookup(&"x"));
/// let s = s.apply(s.add("x", 30));
/// assert!(s.lookup(&"x"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LWWOptSet<M: Ord> {
    entries: BTreeMap<M, Stamp>,
}

/// Ops over a `LWWOptSet`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op<M> {
    /// Add (or re-add) a member at a timestamp
    Add {
        /// the member to add
        member: M,
        /// when it was added
        timestamp: Timestamp,
    },
    /// Remove a member at a timestamp
    Rm {
        /// the member to remove
        member: M,
        /// when it was removed
        timestamp: Timestamp,
    },
}

impl<M: Ord> Default for LWWOptSet<M> {
    fn default() -> Self {
        LWWOptSet {
            entries: BTreeMap::new(),
        }
    }
}

impl<M: Ord + Clone> CvRDT for LWWOptSet<M> {
    fn merge(&self, other: &Self) -> Self {
        other
            .entries
            .iter()
            .fold(self.clone(), |set, (member, stamp)| set.record(member.clone(), *stamp))
    }
}

impl<M: Ord + Clone> CmRDT for LWWOptSet<M> {
    type Op = Op<M>;

    fn apply(&self, op: Self::Op) -> Self {
        match op {
            Op::Add { member, timestamp } => self.record(
                member,
                Stamp {
                    timestamp,
                    removed: false,
                },
            ),
            Op::Rm { member, timestamp } => self.record(
                member,
                Stamp {
                    timestamp,
                    removed: true,
                },
            ),
        }
    }
}

impl<M: Ord + Clone> LWWOptSet<M> {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a set from persisted `(member, stamp)` elements.
    pub fn from_elements<I: IntoIterator<Item = (M, Stamp)>>(elements: I) -> Self {
        elements
            .into_iter()
            .fold(LWWOptSet::new(), |set, (member, stamp)| set.record(member, stamp))
    }

    /// Build the Op that adds `member` at `timestamp`.
    pub fn add(&self, member: M, timestamp: Timestamp) -> Op<M> {
        Op::Add { member, timestamp }
    }

    /// Build the Op that removes `member` at `timestamp`.
    pub fn rm(&self, member: M, timestamp: Timestamp) -> Op<M> {
        Op::Rm { member, timestamp }
    }

    /// True if the latest operation on `member` added it.
    pub fn lookup(&self, member: &M) -> bool {
        self.entries
            .get(member)
            .map(|stamp| !stamp.removed)
            .unwrap_or(false)
    }

    /// The present members.
    pub fn values(&self) -> BTreeSet<M> {
        self.entries
            .iter()
            .filter(|(_, stamp)| !stamp.removed)
            .map(|(member, _)| member.clone())
            .collect()
    }

    /// The persisted `(member, stamp)` elements.
    pub fn elements(&self) -> impl Iterator<Item = (&M, &Stamp)> {
        self.entries.iter()
    }

    fn record(&self, member: M, stamp: Stamp) -> Self {
        match self.entries.get(&member) {
            Some(existing) if *existing >= stamp => self.clone(),
            _ => {
                let mut entries = self.entries.clone();
                entries.insert(member, stamp);
                LWWOptSet { entries }
            }
        }
    }
}
