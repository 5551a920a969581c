//! The `vclock` module provides a generic vector clock implementation.
//!
//! # Examples
//!
//! ```
//! use crdt_algebra::{CausalOrder, VClock};
//! let a = VClock::new().increment("A").increment("A");
//! let b = VClock::new().increment("A");
//! assert!(a > b);
//! assert_eq!(b.compare(&a), CausalOrder::Before);
//! ```

use std::cmp::Ordering;
use std::collections::{btree_map, BTreeMap};
use std::fmt::{self, Display};
use std::iter::FromIterator;

use serde::{Deserialize, Serialize};

use quickcheck::{Arbitrary, Gen};

use crate::dot::Dot;
use crate::traits::{CmRDT, CvRDT};

/// A counter is used to track causality at a particular actor.
pub type Counter = u64;

/// The causal relation between two vector clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CausalOrder {
    /// Every entry is `<=` the other clock's, at least one is `<`.
    Before,
    /// Every entry is `>=` the other clock's, at least one is `>`.
    After,
    /// Neither clock descends from the other.
    Concurrent,
    /// All entries coincide.
    Equal,
}

impl CausalOrder {
    /// True if the first clock happened before the second.
    pub fn is_before(self) -> bool {
        self == CausalOrder::Before
    }

    /// True if the first clock happened after the second.
    pub fn is_after(self) -> bool {
        self == CausalOrder::After
    }

    /// True if neither clock descends from the other.
    pub fn is_concurrent(self) -> bool {
        self == CausalOrder::Concurrent
    }
}

/// A `VClock` is a standard vector clock.
/// It contains a set of "actors" and associated counters.
/// When a particular actor witnesses a mutation, their associated
/// counter in a `VClock` is incremented. `VClock` is typically used
/// as metadata for associated application data, rather than as the
/// container for application data. `VClock` just tracks causality.
/// It can tell you if something causally descends something else,
/// or if different replicas are "concurrent" (were mutated in
/// isolation, and need to be resolved externally).
///
/// Actors missing from the clock have an implied counter of 0 and
/// zero counters are never stored, so two clocks are equal exactly
/// when their causal histories are.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VClock<A: Ord> {
    dots: BTreeMap<A, Counter>,
}

impl<A: Ord> Default for VClock<A> {
    fn default() -> Self {
        VClock {
            dots: BTreeMap::new(),
        }
    }
}

impl<A: Ord> PartialOrd for VClock<A> {
    fn partial_cmp(&self, other: &VClock<A>) -> Option<Ordering> {
        match self.compare(other) {
            CausalOrder::Equal => Some(Ordering::Equal),
            CausalOrder::After => Some(Ordering::Greater),
            CausalOrder::Before => Some(Ordering::Less),
            CausalOrder::Concurrent => None,
        }
    }
}

impl<A: Ord + Display> Display for VClock<A> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<")?;
        for (i, (actor, count)) in self.dots.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", actor, count)?;
        }
        write!(f, ">")
    }
}

impl<A: Ord + Clone> CmRDT for VClock<A> {
    type Op = Dot<A>;

    fn apply(&self, dot: Self::Op) -> Self {
        self.witness(dot.actor, dot.counter)
    }
}

impl<A: Ord + Clone> CvRDT for VClock<A> {
    fn merge(&self, other: &Self) -> Self {
        let mut dots = self.dots.clone();
        for (actor, counter) in other.dots.iter() {
            let entry = dots.entry(actor.clone()).or_insert(0);
            if *counter > *entry {
                *entry = *counter;
            }
        }
        VClock { dots }
    }
}

impl<A: Ord> VClock<A> {
    /// Returns a new `VClock` instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the associated counter for this actor.
    /// All actors not in the vclock have an implied count of 0
    pub fn get(&self, actor: &A) -> Counter {
        self.dots.get(actor).cloned().unwrap_or(0)
    }

    /// Returns `true` if this vector clock contains nothing.
    pub fn is_empty(&self) -> bool {
        self.dots.is_empty()
    }

    /// Number of actors with a non-zero counter.
    pub fn len(&self) -> usize {
        self.dots.len()
    }

    /// Returns an iterator over the dots in this vclock
    pub fn iter(&self) -> impl Iterator<Item = (&A, &Counter)> {
        self.dots.iter()
    }

    /// Compares two clocks entry by entry, missing actors count as 0.
    ///
    /// ```
    /// use crdt_algebra::{CausalOrder, VClock};
    /// let a = VClock::new().increment("A");
    /// let b = VClock::new().increment("B");
    /// assert_eq!(a.compare(&b), CausalOrder::Concurrent);
    /// assert_eq!(a.compare(&a.clone()), CausalOrder::Equal);
    /// ```
    pub fn compare(&self, other: &VClock<A>) -> CausalOrder {
        let self_ahead = self.dots.iter().any(|(a, c)| *c > other.get(a));
        let other_ahead = other.dots.iter().any(|(a, c)| *c > self.get(a));

        match (self_ahead, other_ahead) {
            (false, false) => CausalOrder::Equal,
            (true, false) => CausalOrder::After,
            (false, true) => CausalOrder::Before,
            (true, true) => CausalOrder::Concurrent,
        }
    }

    /// True if two vector clocks have diverged.
    pub fn concurrent(&self, other: &VClock<A>) -> bool {
        self.compare(other).is_concurrent()
    }
}

impl<A: Ord + Clone> VClock<A> {
    /// Returns a new clock with `actor`'s counter bumped by one.
    ///
    /// ```
    /// use crdt_algebra::VClock;
    /// let a = VClock::new().increment("A");
    /// assert_eq!(a.get(&"A"), 1);
    /// assert_eq!(a.increment("A").get(&"A"), 2);
    /// ```
    pub fn increment(&self, actor: A) -> Self {
        let dot = self.inc(actor);
        self.apply(dot)
    }

    /// Generate the Dot that would increment `actor`'s counter.
    pub fn inc(&self, actor: A) -> Dot<A> {
        let next = self.get(&actor) + 1;
        Dot::new(actor, next)
    }

    /// For a particular actor, possibly store a new counter
    /// if it dominates.
    ///
    /// ```
    /// use crdt_algebra::VClock;
    /// let a = VClock::new().witness("A", 2);
    /// assert_eq!(a.witness("A", 1), a); // ignored because 2 dominates 1
    /// ```
    pub fn witness(&self, actor: A, counter: Counter) -> Self {
        let mut clock = self.clone();
        if counter > clock.get(&actor) {
            clock.dots.insert(actor, counter);
        }
        clock
    }

    /// Returns the common elements (same actor and counter)
    /// for two `VClock` instances.
    pub fn intersection(&self, other: &VClock<A>) -> VClock<A> {
        self.dots
            .iter()
            .filter(|(actor, counter)| other.get(actor) == **counter)
            .map(|(actor, counter)| (actor.clone(), *counter))
            .collect()
    }
}

impl<A: Ord> IntoIterator for VClock<A> {
    type Item = (A, Counter);
    type IntoIter = btree_map::IntoIter<A, Counter>;

    /// Consumes the vclock and returns an iterator over dots in the clock
    fn into_iter(self) -> Self::IntoIter {
        self.dots.into_iter()
    }
}

impl<A: Ord> FromIterator<(A, Counter)> for VClock<A> {
    fn from_iter<I: IntoIterator<Item = (A, Counter)>>(iter: I) -> Self {
        let mut dots = BTreeMap::new();
        for (actor, counter) in iter {
            if counter == 0 {
                continue;
            }
            let entry = dots.entry(actor).or_insert(0);
            if counter > *entry {
                *entry = counter;
            }
        }
        VClock { dots }
    }
}

impl<A: Ord> From<Vec<(A, Counter)>> for VClock<A> {
    fn from(vec: Vec<(A, Counter)>) -> Self {
        vec.into_iter().collect()
    }
}

impl<A: Ord> From<Dot<A>> for VClock<A> {
    fn from(dot: Dot<A>) -> Self {
        vec![(dot.actor, dot.counter)].into_iter().collect()
    }
}

impl<A: Ord + Arbitrary> Arbitrary for VClock<A> {
    fn arbitrary<G: Gen>(g: &mut G) -> Self {
        let witnesses = u8::arbitrary(g) % 7;
        (0..witnesses)
            .map(|_| (A::arbitrary(g), u64::from(u8::arbitrary(g) % 6) + 1))
            .collect()
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = VClock<A>>> {
        let mut smaller = vec![];
        for k in self.dots.keys() {
            let mut vc = self.clone();
            vc.dots.remove(k);
            smaller.push(vc)
        }
        Box::new(smaller.into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;

    quickcheck! {
        fn prop_from_iter_of_iter_is_nop(clock: VClock<u8>) -> bool {
            clock == clock.clone().into_iter().collect()
        }

        fn prop_compare_is_antisymmetric(a: VClock<u8>, b: VClock<u8>) -> bool {
            match a.compare(&b) {
                CausalOrder::Before => b.compare(&a) == CausalOrder::After,
                CausalOrder::After => b.compare(&a) == CausalOrder::Before,
                CausalOrder::Equal => b.compare(&a) == CausalOrder::Equal && a == b,
                CausalOrder::Concurrent => b.compare(&a) == CausalOrder::Concurrent,
            }
        }

        fn prop_merge_dominates_both(a: VClock<u8>, b: VClock<u8>) -> bool {
            let m = a.merge(&b);
            m >= a && m >= b
        }

        fn prop_increment_is_after(clock: VClock<u8>, actor: u8) -> bool {
            clock.increment(actor).compare(&clock) == CausalOrder::After
        }
    }

    #[test]
    fn test_zero_entries_are_implicit() {
        let a: VClock<u8> = vec![(1, 0), (2, 3)].into_iter().collect();
        let b: VClock<u8> = vec![(2, 3)].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
        assert_eq!(a.compare(&b), CausalOrder::Equal);
    }

    #[test]
    fn test_increment_returns_new_clock() {
        let a = VClock::new();
        let b = a.increment("A");
        assert!(a.is_empty());
        assert_eq!(b.get(&"A"), 1);
    }

    #[test]
    fn test_intersection() {
        let a: VClock<u8> = vec![(1, 4), (2, 3), (5, 9)].into_iter().collect();
        let b: VClock<u8> = vec![(1, 5), (2, 3), (5, 9)].into_iter().collect();
        let expected: VClock<u8> = vec![(2, 3), (5, 9)].into_iter().collect();
        assert_eq!(a.intersection(&b), expected);
    }
}
