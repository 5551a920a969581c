use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::dot::Dot;
use crate::traits::{Actor, CmRDT, CvRDT};

/// `OROptSet` is an observed-remove set storing each tag once, with a
/// `removed` flag instead of a separate tombstone collection.
///
/// Merging ORs the flags per tag. A member is present while at least one of
/// its tags is not flagged.
///
/// ```
/// use crdt_algebra::{OROptSet, CmRDT};
/// let s = OROptSet::new();
/// let s = s.apply(s.add("x", "A"));
/// let s = s.apply(s.rm("x"));
/// assert!(!s.lookup(&"x"));
/// let s = s.apply(s.add("x", "A"));
/// assert!(s.lookup(&"x"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OROptSet<M: Ord, A: Ord> {
    entries: BTreeMap<M, BTreeMap<Dot<A>, bool>>,
}

/// Ops over an `OROptSet`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op<M, A: Ord> {
    /// Add a member under a fresh tag
    Add {
        /// the member to add
        member: M,
        /// unique tag of this add
        tag: Dot<A>,
    },
    /// Flag the given tags of a member as removed
    Rm {
        /// the member to remove
        member: M,
        /// the observed tags being removed
        tags: BTreeSet<Dot<A>>,
    },
}

impl<M: Ord, A: Ord> Default for OROptSet<M, A> {
    fn default() -> Self {
        OROptSet {
            entries: BTreeMap::new(),
        }
    }
}

impl<M: Ord + Clone, A: Actor> CvRDT for OROptSet<M, A> {
    fn merge(&self, other: &Self) -> Self {
        let mut entries = self.entries.clone();
        for (member, tags) in other.entries.iter() {
            let ours = entries.entry(member.clone()).or_insert_with(BTreeMap::new);
            for (tag, removed) in tags.iter() {
                let flag = ours.entry(tag.clone()).or_insert(false);
                *flag = *flag || *removed;
            }
        }
        OROptSet { entries }
    }
}

impl<M: Ord + Clone, A: Actor> CmRDT for OROptSet<M, A> {
    type Op = Op<M, A>;

    fn apply(&self, op: Self::Op) -> Self {
        let mut entries = self.entries.clone();
        match op {
            Op::Add { member, tag } => {
                entries
                    .entry(member)
                    .or_insert_with(BTreeMap::new)
                    .entry(tag)
                    .or_insert(false);
            }
            Op::Rm { member, tags } => {
                if let Some(ours) = entries.get_mut(&member) {
                    for tag in tags.iter() {
                        if let Some(removed) = ours.get_mut(tag) {
                            *removed = true;
                        }
                    }
                }
            }
        }
        OROptSet { entries }
    }
}

impl<M: Ord + Clone, A: Actor> OROptSet<M, A> {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a set from persisted `(member, tag, removed)` elements.
    pub fn from_elements<I: IntoIterator<Item = (M, Dot<A>, bool)>>(elements: I) -> Self {
        let mut entries = BTreeMap::new();
        for (member, tag, removed) in elements {
            let flag = entries
                .entry(member)
                .or_insert_with(BTreeMap::new)
                .entry(tag)
                .or_insert(false);
            *flag = *flag || removed;
        }
        OROptSet { entries }
    }

    /// Build the Op that adds `member` under a tag minted for `actor`.
    pub fn add(&self, member: M, actor: A) -> Op<M, A> {
        let tag = self.next_tag(actor);
        Op::Add { member, tag }
    }

    /// Build the Op that removes every observed tag of `member`.
    pub fn rm(&self, member: M) -> Op<M, A> {
        let tags = self.tags(&member);
        Op::Rm { member, tags }
    }

    /// The next unused tag for `actor`.
    pub fn next_tag(&self, actor: A) -> Dot<A> {
        let counter = self
            .entries
            .values()
            .flat_map(|tags| tags.keys())
            .filter(|tag| tag.actor == actor)
            .map(|tag| tag.counter)
            .max()
            .unwrap_or(0);
        Dot::new(actor, counter + 1)
    }

    /// The tags of `member` not flagged as removed.
    pub fn tags(&self, member: &M) -> BTreeSet<Dot<A>> {
        self.entries
            .get(member)
            .map(|tags| {
                tags.iter()
                    .filter(|(_, removed)| !**removed)
                    .map(|(tag, _)| tag.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// True if some tag of `member` is not flagged as removed.
    pub fn lookup(&self, member: &M) -> bool {
        self.entries
            .get(member)
            .map(|tags| tags.values().any(|removed| !removed))
            .unwrap_or(false)
    }

    /// The present members.
    pub fn values(&self) -> BTreeSet<M> {
        self.entries
            .keys()
            .filter(|m| self.lookup(m))
            .cloned()
            .collect()
    }

    /// The persisted `(member, tag, removed)` elements.
    pub fn elements(&self) -> impl Iterator<Item = (&M, &Dot<A>, bool)> {
        self.entries
            .iter()
            .flat_map(|(member, tags)| tags.iter().map(move |(tag, removed)| (member, tag, *removed)))
    }
}
