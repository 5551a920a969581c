use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::frontier::Frontier;
use crate::traits::{Actor, CmRDT, CvRDT};
use crate::vclock::{CausalOrder, VClock};

/// `LWWSetVC` is a last-writer-wins element set ordered by vector clocks.
///
/// For every member the set keeps the causally latest add clocks and the
/// causally latest remove clocks. A member is present when one of its add
/// clocks strictly descends every remove clock; a remove concurrent with
/// the latest add wins.
///
/// ```
/// use crdt_algebra::{LWWSetVC, CmRDT};
/// let s = LWWSetVC::new();
/// let s = s.apply(s.add("x", "A"));
/// let s = s.apply(s.rm("x", "B"));
/// assert!(!s.lookup(&"x"));
/// let s = s.apply(s.add("x", "A"));
/// assert!(s.lookup(&"x"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LWWSetVC<M: Ord, A: Ord> {
    adds: BTreeMap<M, Frontier<VClock<A>>>,
    removes: BTreeMap<M, Frontier<VClock<A>>>,
}

/// Ops over a `LWWSetVC`.
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

fn record<M: Ord, A: Actor>(into: &mut BTreeMap<M, Frontier<VClock<A>>>, member: M, clock: VClock<A>) {
    let frontier = into
        .get(&member)
        .map(|f| f.insert(clock.clone()))
        .unwrap_or_else(|| Frontier::single(clock));
    into.insert(member, frontier);
}

impl<M: Ord, A: Ord> Default for LWWSetVC<M, A> {
    fn default() -> Self {
        LWWSetVC {
            adds: BTreeMap::new(),
            removes: BTreeMap::new(),
        }
    }
}

impl<M: Ord + Clone, A: Actor> CvRDT for LWWSetVC<M, A> {
    fn merge(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for (member, clocks) in other.adds.iter() {
            for clock in clocks.iter() {
                record(&mut merged.adds, member.clone(), clock.clone());
            }
        }
        for (member, clocks) in other.removes.iter() {
            for clock in clocks.iter() {
                record(&mut merged.removes, member.clone(), clock.clone());
            }
        }
        merged
    }
}

impl<M: Ord + Clone, A: Actor> CmRDT for LWWSetVC<M, A> {
    type Op = Op<M, A>;

    fn apply(&self, op: Self::Op) -> Self {
        let mut next = self.clone();
        match op {
            Op::Add { member, clock } => record(&mut next.adds, member, clock),
            Op::Rm { member, clock } => record(&mut next.removes, member, clock),
        }
        next
    }
}

impl<M: Ord + Clone, A: Actor> LWWSetVC<M, A> {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the Op that adds `member` on behalf of `actor`.
    ///
    /// The op descends every add and remove of `member` seen so far.
    pub fn add(&self, member: M, actor: A) -> Op<M, A> {
        let clock = self.member_clock(&member).increment(actor);
        Op::Add { member, clock }
    }

    /// Build the Op that removes `member` on behalf of `actor`.
    pub fn rm(&self, member: M, actor: A) -> Op<M, A> {
        let clock = self.member_clock(&member).increment(actor);
        Op::Rm { member, clock }
    }

    /// True if some add of `member` strictly descends all of its removes.
    pub fn lookup(&self, member: &M) -> bool {
        let adds = match self.adds.get(member) {
            Some(adds) => adds,
            None => return false,
        };
        let removes = self.removes.get(member);
        adds.iter().any(|added| {
            removes
                .map(|rms| rms.iter().all(|rm| added.compare(rm) == CausalOrder::After))
                .unwrap_or(true)
        })
    }

    /// The present members.
    pub fn values(&self) -> BTreeSet<M> {
        self.adds
            .keys()
            .filter(|m| self.lookup(m))
            .cloned()
            .collect()
    }

    /// Join of every clock recorded for `member`.
    pub fn member_clock(&self, member: &M) -> VClock<A> {
        self.adds
            .get(member)
            .into_iter()
            .chain(self.removes.get(member))
            .flat_map(|f| f.iter())
            .fold(VClock::new(), |acc, c| acc.merge(c))
    }

    /// Latest add clocks per member.
    pub fn adds(&self) -> &BTreeMap<M, Frontier<VClock<A>>> {
        &self.adds
    }

    /// Latest remove clocks per member.
    pub fn removes(&self) -> &BTreeMap<M, Frontier<VClock<A>>> {
        &self.removes
    }
}
