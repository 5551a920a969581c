use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::traits::{Actor, CmRDT, CvRDT};
use crate::vclock::VClock;

/// A node's contribution to a counter: its running tally.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CounterElement<A> {
    /// the node's tally
    pub value: u64,
    /// the contributing node
    pub node: A,
}

impl<A> CounterElement<A> {
    /// Build an element from a tally and its node.
    pub fn new(value: u64, node: A) -> Self {
        CounterElement { value, node }
    }
}

/// `GCounter` is a grow-only witnessed counter.
///
/// Each node only ever raises its own tally, so merging keeps the highest
/// tally seen per node and the sum never decreases.
///
/// # Examples
///
/// ```
/// use crdt_algebra::{GCounter, CmRDT};
///
/// let a = GCounter::new();
/// let a = a.apply(a.inc("A", 2));
/// let b = GCounter::new();
/// let b = b.apply(b.inc("B", 2));
///
/// assert_eq!(a.sum(), b.sum());
///
/// let a = a.apply(a.inc("A", 1));
/// assert!(a.sum() > b.sum());
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct GCounter<A: Ord> {
    inner: VClock<A>,
}

impl<A: Actor> Default for GCounter<A> {
    fn default() -> Self {
        GCounter::new()
    }
}

impl<A: Actor> CmRDT for GCounter<A> {
    type Op = CounterElement<A>;

    fn apply(&self, op: Self::Op) -> Self {
        GCounter {
            inner: self.inner.witness(op.node, op.value),
        }
    }
}

impl<A: Actor> CvRDT for GCounter<A> {
    fn merge(&self, other: &Self) -> Self {
        GCounter {
            inner: self.inner.merge(&other.inner),
        }
    }
}

impl<A: Actor> GCounter<A> {
    /// Produce a new `GCounter`.
    pub fn new() -> Self {
        GCounter {
            inner: VClock::new(),
        }
    }

    /// Build a counter from persisted elements, keeping the max per node.
    pub fn from_elements<I: IntoIterator<Item = CounterElement<A>>>(elements: I) -> Self {
        elements
            .into_iter()
            .fold(GCounter::new(), |counter, e| counter.apply(e))
    }

    /// Generate Op to add `by` to `actor`'s tally.
    ///
    /// A tally saturates at `u64::MAX` instead of wrapping.
    pub fn inc(&self, actor: A, by: u64) -> CounterElement<A> {
        let value = self.inner.get(&actor).saturating_add(by);
        CounterElement::new(value, actor)
    }

    /// The tally recorded for `actor`.
    pub fn get(&self, actor: &A) -> u64 {
        self.inner.get(actor)
    }

    /// The per-node tallies, one element per node.
    pub fn elements(&self) -> impl Iterator<Item = CounterElement<A>> + '_ {
        self.inner
            .iter()
            .map(|(node, value)| CounterElement::new(*value, node.clone()))
    }

    /// Return the current sum of this counter.
    pub fn sum(&self) -> BigUint {
        self.inner.iter().map(|(_, value)| *value).sum()
    }
}
