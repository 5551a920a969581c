//! The `ourset` module provides an observed-update-remove set.
//!
//! Like an [`ORSet`](crate::ORSet), every add is identified by a unique tag.
//! On top of that, the member stored under a tag can be replaced in place by
//! an update carrying a newer timestamp. Removal is per tag and permanent.
//!
//! # Examples
//!
//! ```
//! use crdt_algebra::{OURSet, CmRDT, CvRDT};
//! let a = OURSet::new();
//! let tag = a.next_tag("A");
//! let a = a.apply(a.add("apple", "A", 1));
//!
//! // two replicas rename the same entry concurrently
//! let b = a.apply(a.update(tag.clone(), "pear", 3));
//! let a = a.apply(a.update(tag, "plum", 2));
//!
//! let merged = a.merge(&b);
//! assert!(merged.lookup(&"pear"));
//! assert!(!merged.lookup(&"plum"));
//! assert_eq!(merged, b.merge(&a));
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::dot::Dot;
use crate::traits::{Actor, CmRDT, CvRDT, Timestamp};

/// The member stored under a tag, as of a timestamp.
///
/// Versions are ordered by timestamp and then by member, which gives every
/// pair of versions of a tag a deterministic winner.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version<M> {
    /// when the version was written
    pub timestamp: Timestamp,
    /// the member it holds
    pub member: M,
}

/// `OURSet` keeps, for every tag, the latest version written under it and
/// whether the tag has been removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OURSet<M: Ord, A: Ord> {
    adds: BTreeMap<Dot<A>, Version<M>>,
    removes: BTreeSet<Dot<A>>,
}

/// Ops over an `OURSet`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op<M, A: Ord> {
    /// Add a member under a fresh tag
    Add {
        /// the member to add
        member: M,
        /// unique tag of this add
        tag: Dot<A>,
        /// when it was added
        timestamp: Timestamp,
    },
    /// Replace the member stored under an existing tag
    Update {
        /// the new member
        member: M,
        /// the tag being updated
        tag: Dot<A>,
        /// when it was updated
        timestamp: Timestamp,
    },
    /// Remove the given observed tags
    Rm {
        /// the tags being removed
        tags: BTreeSet<Dot<A>>,
    },
}

impl<M: Ord, A: Ord> Default for OURSet<M, A> {
    fn default() -> Self {
        OURSet {
            adds: BTreeMap::new(),
            removes: BTreeSet::new(),
        }
    }
}

impl<M: Ord + Clone, A: Actor> CvRDT for OURSet<M, A> {
    fn merge(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for (tag, version) in other.adds.iter() {
            merged.record(tag.clone(), version.clone());
        }
        merged.removes.extend(other.removes.iter().cloned());
        merged
    }
}

impl<M: Ord + Clone, A: Actor> CmRDT for OURSet<M, A> {
    type Op = Op<M, A>;

    fn apply(&self, op: Self::Op) -> Self {
        let mut next = self.clone();
        match op {
            Op::Add {
                member,
                tag,
                timestamp,
            } => next.record(tag, Version { timestamp, member }),
            Op::Update {
                member,
                tag,
                timestamp,
            } => {
                if self.adds.contains_key(&tag) {
                    next.record(tag, Version { timestamp, member });
                }
            }
            Op::Rm { tags } => {
                let observed = tags.into_iter().filter(|tag| self.adds.contains_key(tag));
                next.removes.extend(observed);
            }
        }
        next
    }
}

impl<M: Ord + Clone, A: Actor> OURSet<M, A> {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a set from persisted `(tag, version)` adds and removed tags.
    pub fn from_parts<P, R>(adds: P, removes: R) -> Self
    where
        P: IntoIterator<Item = (Dot<A>, Version<M>)>,
        R: IntoIterator<Item = Dot<A>>,
    {
        let mut set = OURSet::new();
        for (tag, version) in adds {
            set.record(tag, version);
        }
        set.removes.extend(removes);
        set
    }

    /// Build the Op that adds `member` under a tag minted for `actor`.
    pub fn add(&self, member: M, actor: A, timestamp: Timestamp) -> Op<M, A> {
        let tag = self.next_tag(actor);
        Op::Add {
            member,
            tag,
            timestamp,
        }
    }

    /// Build the Op that replaces whatever `tag` holds with `member`.
    pub fn update(&self, tag: Dot<A>, member: M, timestamp: Timestamp) -> Op<M, A> {
        Op::Update {
            member,
            tag,
            timestamp,
        }
    }

    /// Build the Op that removes every live tag currently holding `member`.
    pub fn rm(&self, member: &M) -> Op<M, A> {
        Op::Rm {
            tags: self.tags(member),
        }
    }

    /// The next unused tag for `actor`.
    pub fn next_tag(&self, actor: A) -> Dot<A> {
        let counter = self
            .adds
            .keys()
            .filter(|tag| tag.actor == actor)
            .map(|tag| tag.counter)
            .max()
            .unwrap_or(0);
        Dot::new(actor, counter + 1)
    }

    /// The live tags currently holding `member`.
    pub fn tags(&self, member: &M) -> BTreeSet<Dot<A>> {
        self.live()
            .filter(|(_, version)| version.member == *member)
            .map(|(tag, _)| tag.clone())
            .collect()
    }

    /// The current version stored under `tag`, removed or not.
    pub fn version(&self, tag: &Dot<A>) -> Option<&Version<M>> {
        self.adds.get(tag)
    }

    /// True if some live tag holds `member`.
    pub fn lookup(&self, member: &M) -> bool {
        self.live().any(|(_, version)| version.member == *member)
    }

    /// The members held by live tags.
    pub fn values(&self) -> BTreeSet<M> {
        self.live().map(|(_, version)| version.member.clone()).collect()
    }

    /// Latest version per tag.
    pub fn adds(&self) -> &BTreeMap<Dot<A>, Version<M>> {
        &self.adds
    }

    /// Removed tags.
    pub fn removes(&self) -> &BTreeSet<Dot<A>> {
        &self.removes
    }

    fn live(&self) -> impl Iterator<Item = (&Dot<A>, &Version<M>)> {
        let removes = &self.removes;
        self.adds.iter().filter(move |(tag, _)| !removes.contains(*tag))
    }

    fn record(&mut self, tag: Dot<A>, version: Version<M>) {
        let newer = self
            .adds
            .get(&tag)
            .map_or(true, |existing| *existing < version);
        if newer {
            self.adds.insert(tag, version);
        }
    }
}
