//! The `orset` module provides an observed-remove set with tombstones.
//!
//! # Examples
//!
//! ```
//! use crdt_algebra::{ORSet, CmRDT, CvRDT};
//! let a = ORSet::new();
//! let a = a.apply(a.add("x", "A"));
//!
//! // b sees the add and removes it, a concurrently re-adds
//! let b = a.apply(a.rm("x"));
//! let a = a.apply(a.add("x", "A"));
//!
//! // the re-add carries a tag b never observed, so it survives
//! assert!(a.merge(&b).lookup(&"x"));
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::dot::Dot;
use crate::traits::{Actor, CmRDT, CvRDT};

/// `ORSet` tags every add with a unique [`Dot`] and removes tags rather
/// than members.
///
/// A member is present while at least one of its add tags has not been
/// removed. Removes only ever name tags the remover has observed, so an add
/// concurrent with a remove always survives it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ORSet<M: Ord, A: Ord> {
    adds: BTreeMap<M, BTreeSet<Dot<A>>>,
    removes: BTreeMap<M, BTreeSet<Dot<A>>>,
}

/// Ops over an `ORSet`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op<M, A: Ord> {
    /// Add a member under a fresh tag
    Add {
        /// the member to add
        member: M,
        /// unique tag of this add
        tag: Dot<A>,
    },
    /// Remove the given tags of a member
    Rm {
        /// the member to remove
        member: M,
        /// the observed tags being removed
        tags: BTreeSet<Dot<A>>,
    },
}

fn union<M: Ord + Clone, A: Ord + Clone>(
    ours: &BTreeMap<M, BTreeSet<Dot<A>>>,
    theirs: &BTreeMap<M, BTreeSet<Dot<A>>>,
) -> BTreeMap<M, BTreeSet<Dot<A>>> {
    let mut merged = ours.clone();
    for (member, tags) in theirs.iter() {
        merged
            .entry(member.clone())
            .or_insert_with(BTreeSet::new)
            .extend(tags.iter().cloned());
    }
    merged
}

impl<M: Ord, A: Ord> Default for ORSet<M, A> {
    fn default() -> Self {
        ORSet {
            adds: BTreeMap::new(),
            removes: BTreeMap::new(),
        }
    }
}

impl<M: Ord + Clone, A: Actor> CvRDT for ORSet<M, A> {
    fn merge(&self, other: &Self) -> Self {
        ORSet {
            adds: union(&self.adds, &other.adds),
            removes: union(&self.removes, &other.removes),
        }
    }
}

impl<M: Ord + Clone, A: Actor> CmRDT for ORSet<M, A> {
    type Op = Op<M, A>;

    fn apply(&self, op: Self::Op) -> Self {
        let mut next = self.clone();
        match op {
            Op::Add { member, tag } => {
                next.adds
                    .entry(member)
                    .or_insert_with(BTreeSet::new)
                    .insert(tag);
            }
            Op::Rm { member, tags } => {
                let observed: BTreeSet<Dot<A>> = match self.adds.get(&member) {
                    Some(added) => tags.intersection(added).cloned().collect(),
                    None => return next,
                };
                if !observed.is_empty() {
                    next.removes
                        .entry(member)
                        .or_insert_with(BTreeSet::new)
                        .extend(observed);
                }
            }
        }
        next
    }
}

impl<M: Ord + Clone, A: Actor> ORSet<M, A> {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a set from persisted `(member, tag)` adds and removes.
    pub fn from_parts<P, R>(adds: P, removes: R) -> Self
    where
        P: IntoIterator<Item = (M, Dot<A>)>,
        R: IntoIterator<Item = (M, Dot<A>)>,
    {
        let mut set = ORSet::new();
        for (member, tag) in adds {
            set.adds.entry(member).or_insert_with(BTreeSet::new).insert(tag);
        }
        for (member, tag) in removes {
            set.removes.entry(member).or_insert_with(BTreeSet::new).insert(tag);
        }
        set
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
            .adds
            .values()
            .flat_map(|tags| tags.iter())
            .filter(|tag| tag.actor == actor)
            .map(|tag| tag.counter)
            .max()
            .unwrap_or(0);
        Dot::new(actor, counter + 1)
    }

    /// The add tags of `member` that have not been removed.
    pub fn tags(&self, member: &M) -> BTreeSet<Dot<A>> {
        match (self.adds.get(member), self.removes.get(member)) {
            (Some(added), Some(removed)) => added.difference(removed).cloned().collect(),
            (Some(added), None) => added.clone(),
            (None, _) => BTreeSet::new(),
        }
    }

    /// True if some add tag of `member` has not been removed.
    pub fn lookup(&self, member: &M) -> bool {
        !self.tags(member).is_empty()
    }

    /// The present members.
    pub fn values(&self) -> BTreeSet<M> {
        self.adds
            .keys()
            .filter(|m| self.lookup(m))
            .cloned()
            .collect()
    }

    /// Add tags per member.
    pub fn adds(&self) -> &BTreeMap<M, BTreeSet<Dot<A>>> {
        &self.adds
    }

    /// Removed tags per member.
    pub fn removes(&self) -> &BTreeMap<M, BTreeSet<Dot<A>>> {
        &self.removes
    }
}
