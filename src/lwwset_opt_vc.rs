use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::frontier::{Clocked, Frontier};
use crate::traits::{Actor, CmRDT, CvRDT};
use crate::vclock::VClock;

/// An add or remove of a member at a vector clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp<A: Ord> {
    /// causal context of the operation
    pub clock: VClock<A>,
    /// whether the operation was a remove
    pub removed: bool,
}

impl<A: Ord> Clocked for Stamp<A> {
    type Actor = A;

    fn clock(&self) -> &VClock<A> {
        &self.clock
    }
}

/// `LWWOptSetVC` is a last-writer-wins set with one slot per member,
/// ordered by vector clocks.
///
/// An operation that causally descends the slot replaces it, whether it
/// adds or removes. Operations concurrent with the slot are kept next to
/// it until a later one supersedes them all; while any of the concurrent
/// entries is a remove the member reads as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LWWOptSetVC<M: Ord, A: Ord> {
    entries: BTreeMap<M, Frontier<Stamp<A>>>,
}

/// Ops over a `LWWOptSetVC`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op<M, A: Ord> {
    /// Add a member
    Add {
        /// the member to add
        member: M,
        /// causal context of the add
        clock: VClock<A>,
    },
    /// Remove a member
    Rm {
        /// the member to remove
        member: M,
        /// causal context of the remove
        clock: VClock<A>,
    },
}

impl<M: Ord, A: Ord> Default for LWWOptSetVC<M, A> {
    fn default() -> Self {
        LWWOptSetVC {
            entries: BTreeMap::new(),
        }
    }
}

impl<M: Ord + Clone, A: Actor> CvRDT for LWWOptSetVC<M, A> {
    fn merge(&self, other: &Self) -> Self {
        let mut entries = self.entries.clone();
        for (member, theirs) in other.entries.iter() {
            let merged = match entries.get(member) {
                Some(ours) => ours.merge(theirs),
                None => theirs.clone(),
            };
            entries.insert(member.clone(), merged);
        }
        LWWOptSetVC { entries }
    }
}

impl<M: Ord + Clone, A: Actor> CmRDT for LWWOptSetVC<M, A> {
    type Op = Op<M, A>;

    fn apply(&self, op: Self::Op) -> Self {
        let (member, stamp) = match op {
            Op::Add { member, clock } => (member, Stamp { clock, removed: false }),
            Op::Rm { member, clock } => (member, Stamp { clock, removed: true }),
        };
        let slot = self
            .entries
            .get(&member)
            .map(|f| f.insert(stamp.clone()))
            .unwrap_or_else(|| Frontier::single(stamp));
        let mut entries = self.entries.clone();
        entries.insert(member, slot);
        LWWOptSetVC { entries }
    }
}

impl<M: Ord + Clone, A: Actor> LWWOptSetVC<M, A> {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the Op that adds `member` on behalf of `actor`.
    pub fn add(&self, member: M, actor: A) -> Op<M, A> {
        let clock = self.member_clock(&member).increment(actor);
        Op::Add { member, clock }
    }

    /// Build the Op that removes `member` on behalf of `actor`.
    pub fn rm(&self, member: M, actor: A) -> Op<M, A> {
        let clock = self.member_clock(&member).increment(actor);
        Op::Rm { member, clock }
    }

    /// True if every latest operation on `member` was an add.
    pub fn lookup(&self, member: &M) -> bool {
        self.entries
            .get(member)
            .map(|slot| !slot.is_empty() && slot.iter().all(|stamp| !stamp.removed))
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

    /// Join of every clock recorded for `member`.
    pub fn member_clock(&self, member: &M) -> VClock<A> {
        self.entries
            .get(member)
            .into_iter()
            .flat_map(|f| f.iter())
            .fold(VClock::new(), |acc, stamp| acc.merge(&stamp.clock))
    }

    /// The latest operations per member.
    pub fn elements(&self) -> impl Iterator<Item = (&M, &Frontier<Stamp<A>>)> {
        self.entries.iter()
    }
}
