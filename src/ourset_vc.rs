use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::dot::Dot;
use crate::frontier::{Clocked, Frontier};
use crate::traits::{Actor, CmRDT, CvRDT};
use crate::vclock::VClock;

/// The member stored under a tag, as of a vector clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version<M, A: Ord> {
    /// the member it holds
    pub member: M,
    /// causal context of the write
    pub clock: VClock<A>,
}

impl<M, A: Ord> Clocked for Version<M, A> {
    type Actor = A;

    fn clock(&self) -> &VClock<A> {
        &self.clock
    }
}

/// `OURSetVC` is an observed-update-remove set whose per-tag versions are
/// ordered by vector clocks.
///
/// Each tag keeps its causally latest versions. Concurrent versions are all
/// retained, and the one holding the smallest member is read as current
/// until a later update supersedes them.
///
/// ```
/// use crdt_algebra::{OURSetVC, CmRDT, CvRDT};
/// let a = OURSetVC::new();
/// let tag = a.next_tag("A");
/// let a = a.apply(a.add("b", "A"));
/// let b = a.apply(a.update(tag.clone(), "c", "B"));
/// let a = a.apply(a.update(tag.clone(), "d", "A"));
///
/// let merged = a.merge(&b);
/// assert_eq!(merged.current(&tag).map(|v| v.member), Some("c"));
///
/// let merged = merged.apply(merged.update(tag, "e", "A"));
/// assert_eq!(merged.values().into_iter().collect::<Vec<_>>(), vec!["e"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OURSetVC<M: Ord, A: Ord> {
    adds: BTreeMap<Dot<A>, Frontier<Version<M, A>>>,
    removes: BTreeSet<Dot<A>>,
}

/// Ops over an `OURSetVC`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op<M, A: Ord> {
    /// Add a member under a fresh tag
    Add {
        /// the member to add
        member: M,
        /// unique tag of this add
        tag: Dot<A>,
        /// causal context of the add
        clock: VClock<A>,
    },
    /// Replace the member stored under an existing tag
    Update {
        /// the new member
        member: M,
        /// the tag being updated
        tag: Dot<A>,
        /// causal context of the update
        clock: VClock<A>,
    },
    /// Remove the given observed tags
    Rm {
        /// the tags being removed
        tags: BTreeSet<Dot<A>>,
    },
}

impl<M: Ord, A: Ord> Default for OURSetVC<M, A> {
    fn default() -> Self {
        OURSetVC {
            adds: BTreeMap::new(),
            removes: BTreeSet::new(),
        }
    }
}

impl<M: Ord + Clone, A: Actor> CvRDT for OURSetVC<M, A> {
    fn merge(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for (tag, theirs) in other.adds.iter() {
            let versions = match self.adds.get(tag) {
                Some(ours) => ours.merge(theirs),
                None => theirs.clone(),
            };
            merged.adds.insert(tag.clone(), versions);
        }
        merged.removes.extend(other.removes.iter().cloned());
        merged
    }
}

impl<M: Ord + Clone, A: Actor> CmRDT for OURSetVC<M, A> {
    type Op = Op<M, A>;

    fn apply(&self, op: Self::Op) -> Self {
        let mut next = self.clone();
        match op {
            Op::Add { member, tag, clock } => next.record(tag, Version { member, clock }),
            Op::Update { member, tag, clock } => {
                if self.adds.contains_key(&tag) {
                    next.record(tag, Version { member, clock });
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

impl<M: Ord + Clone, A: Actor> OURSetVC<M, A> {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the Op that adds `member` under a tag minted for `actor`.
    pub fn add(&self, member: M, actor: A) -> Op<M, A> {
        let tag = self.next_tag(actor.clone());
        let clock = VClock::new().increment(actor);
        Op::Add { member, tag, clock }
    }

    /// Build the Op that replaces whatever `tag` holds with `member`.
    ///
    /// The update descends every version of the tag seen so far.
    pub fn update(&self, tag: Dot<A>, member: M, actor: A) -> Op<M, A> {
        let clock = self.tag_clock(&tag).increment(actor);
        Op::Update { member, tag, clock }
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

    /// Join of the clocks of every version recorded under `tag`.
    pub fn tag_clock(&self, tag: &Dot<A>) -> VClock<A> {
        self.adds
            .get(tag)
            .into_iter()
            .flat_map(|versions| versions.iter())
            .fold(VClock::new(), |acc, v| acc.merge(&v.clock))
    }

    /// The version read for `tag`: among its latest versions, the one
    /// holding the smallest member.
    pub fn current(&self, tag: &Dot<A>) -> Option<&Version<M, A>> {
        self.adds
            .get(tag)
            .and_then(|versions| versions.iter().min_by(|a, b| a.member.cmp(&b.member)))
    }

    /// The live tags currently holding `member`.
    pub fn tags(&self, member: &M) -> BTreeSet<Dot<A>> {
        self.live()
            .filter(|(_, version)| version.member == *member)
            .map(|(tag, _)| tag.clone())
            .collect()
    }

    /// True if some live tag holds `member`.
    pub fn lookup(&self, member: &M) -> bool {
        self.live().any(|(_, version)| version.member == *member)
    }

    /// The members held by live tags.
    pub fn values(&self) -> BTreeSet<M> {
        self.live().map(|(_, version)| version.member.clone()).collect()
    }

    /// Latest versions per tag.
    pub fn adds(&self) -> &BTreeMap<Dot<A>, Frontier<Version<M, A>>> {
        &self.adds
    }

    /// Removed tags.
    pub fn removes(&self) -> &BTreeSet<Dot<A>> {
        &self.removes
    }

    fn live(&self) -> impl Iterator<Item = (&Dot<A>, &Version<M, A>)> {
        self.adds
            .keys()
            .filter(move |tag| !self.removes.contains(*tag))
            .filter_map(move |tag| self.current(tag).map(|version| (tag, version)))
    }

    fn record(&mut self, tag: Dot<A>, version: Version<M, A>) {
        let versions = match self.adds.get(&tag) {
            Some(ours) => ours.insert(version),
            None => Frontier::single(version),
        };
        self.adds.insert(tag, versions);
    }
}
