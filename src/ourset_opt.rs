use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::dot::Dot;
use crate::ourset::Version;
use crate::traits::{Actor, CmRDT, CvRDT, Timestamp};

pub use crate::ourset::Op;

/// Everything known about one tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot<M> {
    /// latest version written under the tag
    pub version: Version<M>,
    /// whether the tag has been removed
    pub removed: bool,
}

impl<M: Ord + Clone> Slot<M> {
    fn join(&self, other: &Self) -> Self {
        Slot {
            version: std::cmp::max(&self.version, &other.version).clone(),
            removed: self.removed || other.removed,
        }
    }
}

/// `OUROptSet` is an observed-update-remove set collapsing adds, updates and
/// removes of a tag into a single slot.
///
/// ```
/// use crdt_algebra::{OUROptSet, CmRDT};
/// let s = OUROptSet::new();
/// let tag = s.next_tag("A");
/// let s = s.apply(s.add("draft", "A", 1));
/// let s = s.apply(s.update(tag, "final", 2));
/// assert!(s.lookup(&"final"));
/// let s = s.apply(s.rm(&"final"));
/// assert!(s.values().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OUROptSet<M: Ord, A: Ord> {
    slots: BTreeMap<Dot<A>, Slot<M>>,
}

impl<M: Ord, A: Ord> Default for OUROptSet<M, A> {
    fn default() -> Self {
        OUROptSet {
            slots: BTreeMap::new(),
        }
    }
}

impl<M: Ord + Clone, A: Actor> CvRDT for OUROptSet<M, A> {
    fn merge(&self, other: &Self) -> Self {
        let mut slots = self.slots.clone();
        for (tag, theirs) in other.slots.iter() {
            let joined = match slots.get(tag) {
                Some(ours) => ours.join(theirs),
                None => theirs.clone(),
            };
            slots.insert(tag.clone(), joined);
        }
        OUROptSet { slots }
    }
}

impl<M: Ord + Clone, A: Actor> CmRDT for OUROptSet<M, A> {
    type Op = Op<M, A>;

    fn apply(&self, op: Self::Op) -> Self {
        let mut slots = self.slots.clone();
        match op {
            Op::Add {
                member,
                tag,
                timestamp,
            } => {
                let added = Slot {
                    version: Version { timestamp, member },
                    removed: false,
                };
                let joined = match slots.get(&tag) {
                    Some(ours) => ours.join(&added),
                    None => added,
                };
                slots.insert(tag, joined);
            }
            Op::Update {
                member,
                tag,
                timestamp,
            } => {
                if let Some(slot) = slots.get_mut(&tag) {
                    let version = Version { timestamp, member };
                    if version > slot.version {
                        slot.version = version;
                    }
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
        OUROptSet { slots }
    }
}

impl<M: Ord + Clone, A: Actor> OUROptSet<M, A> {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a set from persisted `(tag, slot)` elements.
    pub fn from_elements<I: IntoIterator<Item = (Dot<A>, Slot<M>)>>(elements: I) -> Self {
        let mut slots: BTreeMap<Dot<A>, Slot<M>> = BTreeMap::new();
        for (tag, slot) in elements {
            let joined = match slots.get(&tag) {
                Some(ours) => ours.join(&slot),
                None => slot,
            };
            slots.insert(tag, joined);
        }
        OUROptSet { slots }
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
            .slots
            .keys()
            .filter(|tag| tag.actor == actor)
            .map(|tag| tag.counter)
            .max()
            .unwrap_or(0);
        Dot::new(actor, counter + 1)
    }

    /// The live tags currently holding `member`.
    pub fn tags(&self, member: &M) -> BTreeSet<Dot<A>> {
        self.slots
            .iter()
            .filter(|(_, slot)| !slot.removed && slot.version.member == *member)
            .map(|(tag, _)| tag.clone())
            .collect()
    }

    /// True if some live tag holds `member`.
    pub fn lookup(&self, member: &M) -> bool {
        self.slots
            .values()
            .any(|slot| !slot.removed && slot.version.member == *member)
    }

    /// The members held by live tags.
    pub fn values(&self) -> BTreeSet<M> {
        self.slots
            .values()
            .filter(|slot| !slot.removed)
            .map(|slot| slot.version.member.clone())
            .collect()
    }

    /// The persisted `(tag, slot)` elements.
    pub fn elements(&self) -> impl Iterator<Item = (&Dot<A>, &Slot<M>)> {
        self.slots.iter()
    }
}
