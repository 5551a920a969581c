use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::dot::Dot;
use crate::frontier::Frontier;
use crate::ourset_vc::Version;
use crate::traits::{Actor, CmRDT, CvRDT};
use crate::vclock::VClock;

pub use crate::ourset_vc::Op;

/// Everything known about one tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot<M, A: Ord> {
    /// causally latest versions written under the tag
    pub versions: Frontier<Version<M, A>>,
    /// whether the tag has been removed
    pub removed: bool,
}

impl<M: Ord + Clone, A: Actor> Slot<M, A> {
    fn join(&self, other: &Self) -> Self {
        Slot {
            versions: self.versions.merge(&other.versions),
            removed: self.removed || other.removed,
        }
    }

    fn current(&self) -> Option<&Version<M, A>> {
        self.versions.iter().min_by(|a, b| a.member.cmp(&b.member))
    }
}

/// `OUROptSetVC` is the single-slot-per-tag form of
/// [`OURSetVC`](crate::OURSetVC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OUROptSetVC<M: Ord, A: Ord> {
    slots: BTreeMap<Dot<A>, Slot<M, A>>,
}

impl<M: Ord, A: Ord> Default for OUROptSetVC<M, A> {
    fn default() -> Self {
        OUROptSetVC {
            slots: BTreeMap::new(),
        }
    }
}

impl<M: Ord + Clone, A: Actor> CvRDT for OUROptSetVC<M, A> {
    fn merge(&self, other: &Self) -> Self {
        let mut slots = self.slots.clone();
        for (tag, theirs) in other.slots.iter() {
            let joined = match self.slots.get(tag) {
                Some(ours) => ours.join(theirs),
                None => theirs.clone(),
            };
            slots.insert(tag.clone(), joined);
        }
        OUROptSetVC { slots }
    }
}

impl<M: Ord + Clone, A: Actor> CmRDT for OUROptSetVC<M, A> {
    type Op = Op<M, A>;

    fn apply(&self, op: Self::Op) -> Self {
        let mut slots = self.slots.clone();
        match op {
            Op::Add { member, tag, clock } => {
                let added = Slot {
                    versions: Frontier::single(Version { member, clock }),
                    removed: false,
                };
                let joined = match self.slots.get(&tag) {
                    Some(ours) => ours.join(&added),
                    None => added,
                };
                slots.insert(tag, joined);
            }
            Op::Update { member, tag, clock } => {
                if let Some(slot) = slots.get_mut(&tag) {
                    slot.versions = slot.versions.insert(Version { member, clock });
                }
            }
            Op::Rm { tags } => {
                for tag in tags.iter() {
                    if let Some(slot) = slots.get_mut(tag) {
                        slot.removed = true;
                    }
                }
            }
        }
        OUROptSetVC { slots }
    }
}

impl<M: Ord + Clone, A: Actor> OUROptSetVC<M, A> {
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
    pub fn update(&self, tag: Dot<A>, member: M, actor: A) -> Op<M, A> {
        let clock = self
            .slots
            .get(&tag)
            .into_iter()
            .flat_map(|slot| slot.versions.iter())
            .fold(VClock::new(), |acc, v| acc.merge(&v.clock))
            .increment(actor);
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
            .slots
            .keys()
            .filter(|tag| tag.actor == actor)
            .map(|tag| tag.counter)
            .max()
            .unwrap_or(0);
        Dot::new(actor, counter + 1)
    }

    /// The version read for `tag`, removed or not.
    pub fn current(&self, tag: &Dot<A>) -> Option<&Version<M, A>> {
        self.slots.get(tag).and_then(|slot| slot.current())
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

    /// The persisted `(tag, slot)` elements.
    pub fn elements(&self) -> impl Iterator<Item = (&Dot<A>, &Slot<M, A>)> {
        self.slots.iter()
    }

    fn live(&self) -> impl Iterator<Item = (&Dot<A>, &Version<M, A>)> {
        self.slots
            .iter()
            .filter(|(_, slot)| !slot.removed)
            .filter_map(|(tag, slot)| slot.current().map(|version| (tag, version)))
    }
}
