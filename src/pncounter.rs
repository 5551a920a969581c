use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

use crate::gcounter::{CounterElement, GCounter};
use crate::traits::{Actor, CmRDT, CvRDT};

/// `PNCounter` allows the counter to be both incremented and decremented
/// by representing the increments (P) and the decrements (N) in separate
/// internal G-Counters.
///
/// Merge is implemented by merging the internal P and N counters.
/// The value of the counter is P minus N, and may be negative.
///
/// # Examples
///
/// ```
/// use crdt_algebra::{PNCounter, CmRDT};
/// use num_bigint::BigInt;
/// let a = PNCounter::new();
/// let a = a.apply(a.inc("A", 2));
/// let a = a.apply(a.dec("A", 3));
/// assert_eq!(a.sum(), BigInt::from(-1));
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct PNCounter<A: Ord> {
    p: GCounter<A>,
    n: GCounter<A>,
}

/// The Direction of an Op.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Dir {
    /// signals that the op increments the counter
    Pos,
    /// signals that the op decrements the counter
    Neg,
}

/// An Op which is produced through from mutating the counter
/// Ship these ops to other replicas to have them sync up.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub struct Op<A> {
    /// The new tally of the touched half
    pub element: CounterElement<A>,
    /// the direction to move the counter
    pub dir: Dir,
}

impl<A: Actor> Default for PNCounter<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Actor> CmRDT for PNCounter<A> {
    type Op = Op<A>;

    fn apply(&self, op: Self::Op) -> Self {
        match op.dir {
            Dir::Pos => PNCounter {
                p: self.p.apply(op.element),
                n: self.n.clone(),
            },
            Dir::Neg => PNCounter {
                p: self.p.clone(),
                n: self.n.apply(op.element),
            },
        }
    }
}

impl<A: Actor> CvRDT for PNCounter<A> {
    fn merge(&self, other: &Self) -> Self {
        PNCounter {
            p: self.p.merge(&other.p),
            n: self.n.merge(&other.n),
        }
    }
}

impl<A: Actor> PNCounter<A> {
    /// Produces a new `PNCounter`.
    pub fn new() -> Self {
        PNCounter {
            p: GCounter::new(),
            n: GCounter::new(),
        }
    }

    /// Rebuild a counter from its persisted addition and subtraction elements.
    pub fn from_elements<P, N>(additions: P, subtractions: N) -> Self
    where
        P: IntoIterator<Item = CounterElement<A>>,
        N: IntoIterator<Item = CounterElement<A>>,
    {
        PNCounter {
            p: GCounter::from_elements(additions),
            n: GCounter::from_elements(subtractions),
        }
    }

    /// Generate an Op to add `by` on behalf of `actor`.
    pub fn inc(&self, actor: A, by: u64) -> Op<A> {
        Op {
            element: self.p.inc(actor, by),
            dir: Dir::Pos,
        }
    }

    /// Generate an Op to subtract `by` on behalf of `actor`.
    pub fn dec(&self, actor: A, by: u64) -> Op<A> {
        Op {
            element: self.n.inc(actor, by),
            dir: Dir::Neg,
        }
    }

    /// The grow-only counter of additions.
    pub fn additions(&self) -> &GCounter<A> {
        &self.p
    }

    /// The grow-only counter of subtractions.
    pub fn subtractions(&self) -> &GCounter<A> {
        &self.n
    }

    /// Returns the current value of this counter (P-N).
    pub fn sum(&self) -> BigInt {
        BigInt::from(self.p.sum()) - BigInt::from(self.n.sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic() {
        let a = PNCounter::new();
        assert_eq!(a.sum(), BigInt::from(0));

        let a = a.apply(a.inc("A".to_string(), 1));
        assert_eq!(a.sum(), BigInt::from(1));

        let a = a.apply(a.inc("A".to_string(), 1));
        assert_eq!(a.sum(), BigInt::from(2));

        let a = a.apply(a.dec("A".to_string(), 1));
        assert_eq!(a.sum(), BigInt::from(1));

        let a = a.apply(a.inc("A".to_string(), 1));
        assert_eq!(a.sum(), BigInt::from(2));
    }

    #[test]
    fn test_subtract_can_exceed_add() {
        let a = PNCounter::new();
        let a = a.apply(a.dec("B", 4));
        assert_eq!(a.sum(), BigInt::from(-4));
        assert_eq!(a.additions().sum(), num_bigint::BigUint::from(0u8));
    }
}
