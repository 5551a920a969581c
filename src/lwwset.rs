use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::traits::{CmRDT, CvRDT, Timestamp};

/// `LWWSet` is a last-writer-wins element set.
///
/// Adds and removes are kept apart, each remembering only the latest
/// timestamp per member. A member is present when its latest add is newer
/// than its latest remove; a remove at the same timestamp wins.
///
/// Removes are recorded even for members this replica has not seen added
/// yet, timestamps rather than delivery order decide the outcome.
///
/// ```
/// use crdt_algebra::{LWWSet, CmRDT};
/// let s = LWWSet::new();
/// let s = s.apply(s.add("x", 1));
/// let s = s.apply(s.rm("x", 2));
/// assert!(!s.lookup(&"x"));
/// let s = s.apply(s.add("x", 3));
/// assert!(s.lookup(&"x"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LWWSet<M: Ord> {
    adds: BTreeMap<M, Timestamp>,
    removes: BTreeMap<M, Timestamp>,
}

/// Ops over a `LWWSet`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op<M> {
    /// Add a member at a timestamp
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

fn keep_latest<M: Ord + Clone>(
    into: &mut BTreeMap<M, Timestamp>,
    member: M,
    timestamp: Timestamp,
) {
    let entry = into.entry(member).or_insert(timestamp);
    if timestamp > *entry {
        *entry = timestamp;
    }
}

impl<M: Ord> Default for LWWSet<M> {
    fn default() -> Self {
        LWWSet {
            adds: BTreeMap::new(),
            removes: BTreeMap::new(),
        }
    }
}

impl<M: Ord + Clone> CvRDT for LWWSet<M> {
    fn merge(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for (member, ts) in other.adds.iter() {
            keep_latest(&mut merged.adds, member.clone(), *ts);
        }
        for (member, ts) in other.removes.iter() {
            keep_latest(&mut merged.removes, member.clone(), *ts);
        }
        merged
    }
}

impl<M: Ord + Clone> CmRDT for LWWSet<M> {
    type Op = Op<M>;

    fn apply(&self, op: Self::Op) -> Self {
        let mut next = self.clone();
        match op {
            Op::Add { member, timestamp } => keep_latest(&mut next.adds, member, timestamp),
            Op::Rm { member, timestamp } => keep_latest(&mut next.removes, member, timestamp),
        }
        next
    }
}

impl<M: Ord + Clone> LWWSet<M> {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a set from persisted `(member, timestamp)` adds and removes.
    pub fn from_parts<P, R>(adds: P, removes: R) -> Self
    where
        P: IntoIterator<Item = (M, Timestamp)>,
        R: IntoIterator<Item = (M, Timestamp)>,
    {
        let mut set = LWWSet::new();
        for (member, ts) in adds {
            keep_latest(&mut set.adds, member, ts);
        }
        for (member, ts) in removes {
            keep_latest(&mut set.removes, member, ts);
        }
        set
    }

    /// Build the Op that adds `member` at `timestamp`.
    pub fn add(&self, member: M, timestamp: Timestamp) -> Op<M> {
        Op::Add { member, timestamp }
    }

    /// Build the Op that removes `member` at `timestamp`.
    pub fn rm(&self, member: M, timestamp: Timestamp) -> Op<M> {
        Op::Rm { member, timestamp }
    }

    /// True if the latest add of `member` is newer than its latest remove.
    pub fn lookup(&self, member: &M) -> bool {
        match (self.adds.get(member), self.removes.get(member)) {
            (Some(added), Some(removed)) => added > removed,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// The present members.
    pub fn values(&self) -> BTreeSet<M> {
        self.adds
            .keys()
            .filter(|m| self.lookup(m))
            .cloned()
            .collect()
    }

    /// Latest add timestamp per member.
    pub fn adds(&self) -> &BTreeMap<M, Timestamp> {
        &self.adds
    }

    /// Latest remove timestamp per member.
    pub fn removes(&self) -> &BTreeMap<M, Timestamp> {
        &self.removes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tie_goes_to_remove() {
        let s = LWWSet::new();
        let s = s.apply(s.add(1, 5)).apply(s.rm(1, 5));
        assert!(!s.lookup(&1));
    }

    #[test]
    fn test_out_of_order_delivery() {
        let s = LWWSet::new();
        let late_rm = s.apply(s.rm(1, 9)).apply(s.add(1, 4));
        let in_order = s.apply(s.add(1, 4)).apply(s.rm(1, 9));
        assert_eq!(late_rm, in_order);
        assert!(!late_rm.lookup(&1));
    }

    #[test]
    fn test_only_latest_timestamp_is_kept() {
        let s = LWWSet::from_parts(vec![(1, 3), (1, 7), (1, 5)], vec![]);
        assert_eq!(s.adds().get(&1), Some(&7));
    }
}
