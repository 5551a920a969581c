use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::frontier::{Clocked, Frontier};
use crate::traits::{Actor, CvRDT, FunkyCmRDT, FunkyCvRDT};
use crate::vclock::{CausalOrder, VClock};

/// A value written at a vector clock by a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment<V, A: Ord> {
    /// the written value
    pub val: V,
    /// the causal context of the write
    pub clock: VClock<A>,
    /// the node that performed the write
    pub node: A,
}

impl<V, A: Ord> Clocked for Assignment<V, A> {
    type Actor = A;

    fn clock(&self) -> &VClock<A> {
        &self.clock
    }
}

/// `LWWRegVC` is a last-writer-wins register ordered by vector clocks.
///
/// Writes that causally descend the current value replace it. Concurrent
/// writes are all kept (as a multi-value register would) and the register
/// reads as the write of the lowest node among them, so replicas agree on
/// the value without agreeing on arrival order.
///
/// ```
/// use crdt_algebra::{LWWRegVC, FunkyCmRDT};
/// let reg = LWWRegVC::new();
/// let a = reg.apply(reg.write("apple", "B")).unwrap();
/// let b = reg.apply(reg.write("banana", "A")).unwrap();
///
/// // concurrent writes: the lowest node wins
/// let merged = a.apply(b.write_op().unwrap()).unwrap();
/// assert_eq!(merged.value(), Some(&"banana"));
///
/// // a write that has seen both replaces them
/// let merged = merged.apply(merged.write("cherry", "B")).unwrap();
/// assert_eq!(merged.value(), Some(&"cherry"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LWWRegVC<V, A: Ord> {
    vals: Frontier<Assignment<V, A>>,
}

impl<V, A: Ord> Default for LWWRegVC<V, A> {
    fn default() -> Self {
        LWWRegVC {
            vals: Frontier::new(),
        }
    }
}

impl<V: Clone + PartialEq, A: Actor> FunkyCmRDT for LWWRegVC<V, A> {
    type Op = Assignment<V, A>;

    /// Record a write. Marker reuse is only detected against the writes
    /// still held, see [`Error::ConflictingMarker`].

    fn apply(&self, op: Self::Op) -> Result<Self> {
        let conflicting = self.vals.iter().any(|existing| {
            existing.node == op.node
                && existing.val != op.val
                && match existing.clock.compare(&op.clock) {
                    CausalOrder::Before | CausalOrder::After => false,
                    _ => true,
                }
        });
        if conflicting {
            return Err(Error::ConflictingMarker);
        }
        Ok(LWWRegVC {
            vals: self.vals.insert(op),
        })
    }
}

impl<V: Clone + PartialEq, A: Actor> FunkyCvRDT for LWWRegVC<V, A> {
    fn merge(&self, other: &Self) -> Result<Self> {
        other
            .vals
            .iter()
            .try_fold(self.clone(), |reg, op| FunkyCmRDT::apply(&reg, op.clone()))
    }
}

impl<V: Clone + PartialEq, A: Actor> LWWRegVC<V, A> {
    /// An unassigned register.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the Op that writes `val` on behalf of `node`.
    ///
    /// The op's clock descends every write this replica has seen.
    pub fn write(&self, val: V, node: A) -> Assignment<V, A> {
        let clock = self.clock().increment(node.clone());
        Assignment { val, clock, node }
    }

    /// The assignment the register currently reads as.
    pub fn write_op(&self) -> Option<Assignment<V, A>> {
        self.winner().cloned()
    }

    /// The current value, `None` while unassigned.
    pub fn value(&self) -> Option<&V> {
        self.winner().map(|a| &a.val)
    }

    /// The writes that are currently concurrent with each other.
    pub fn concurrent_writes(&self) -> impl Iterator<Item = &Assignment<V, A>> {
        self.vals.iter()
    }

    /// A clock with latest versions of all actors operating on this register
    pub fn clock(&self) -> VClock<A> {
        self.vals
            .iter()
            .fold(VClock::new(), |acc, a| acc.merge(&a.clock))
    }

    fn winner(&self) -> Option<&Assignment<V, A>> {
        self.vals.iter().min_by(|a, b| a.node.cmp(&b.node))
    }
}
