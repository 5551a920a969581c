use std::collections::BTreeSet;
use std::iter::FromIterator;

use serde::{Deserialize, Serialize};

use crate::traits::{CmRDT, CvRDT};

/// A `GSet` is a grow-only set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GSet<M: Ord> {
    value: BTreeSet<M>,
}

/// Ops over a `GSet`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op<M> {
    /// Add a member
    Add {
        /// the member to add
        member: M,
    },
}

impl<M: Ord> Default for GSet<M> {
    fn default() -> Self {
        GSet {
            value: BTreeSet::new(),
        }
    }
}

impl<M: Ord + Clone> CvRDT for GSet<M> {
    /// Merges another `GSet` into this one.
    ///
    /// # Examples
    ///
    /// ```
    /// use crdt_algebra::{GSet, CvRDT, CmRDT};
    /// let (a, b) = (GSet::new(), GSet::new());
    /// let a = a.apply(a.add(1));
    /// let b = b.apply(b.add(2));
    /// let c = a.merge(&b);
    /// assert!(c.lookup(&1));
    /// assert!(c.lookup(&2));
    /// ```
    fn merge(&self, other: &Self) -> Self {
        GSet {
            value: self.value.union(&other.value).cloned().collect(),
        }
    }
}

impl<M: Ord + Clone> CmRDT for GSet<M> {
    type Op = Op<M>;

    fn apply(&self, op: Self::Op) -> Self {
        match op {
            Op::Add { member } => {
                if self.value.contains(&member) {
                    return self.clone();
                }
                let mut value = self.value.clone();
                value.insert(member);
                GSet { value }
            }
        }
    }
}

impl<M: Ord + Clone> GSet<M> {
    /// Instantiates an empty `GSet`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the Op that adds `member`.
    ///
    /// # Examples
    ///
    /// ```
    /// use crdt_algebra::{GSet, CmRDT};
    /// let a = GSet::new();
    /// let a = a.apply(a.add(1));
    /// assert!(a.lookup(&1));
    /// ```
    pub fn add(&self, member: M) -> Op<M> {
        Op::Add { member }
    }

    /// Returns `true` if the `GSet` contains the member.
    pub fn lookup(&self, member: &M) -> bool {
        self.value.contains(member)
    }

    /// The members of the set.
    pub fn values(&self) -> BTreeSet<M> {
        self.value.clone()
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// True if nothing was ever added.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl<M: Ord> FromIterator<M> for GSet<M> {
    fn from_iter<I: IntoIterator<Item = M>>(iter: I) -> Self {
        GSet {
            value: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let a = GSet::new();
        let once = a.apply(a.add("x"));
        assert_eq!(once.apply(once.add("x")), once);
        assert_eq!(once.len(), 1);
    }

    #[test]
    fn test_merge_is_union() {
        let a: GSet<u8> = vec![1, 2].into_iter().collect();
        let b: GSet<u8> = vec![2, 3].into_iter().collect();
        assert_eq!(a.merge(&b).values(), vec![1, 2, 3].into_iter().collect());
        assert_eq!(a.merge(&b), b.merge(&a));
    }
}
