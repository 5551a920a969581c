//! Antichains of vector-clocked entries.
//!
//! A `Frontier` keeps only the entries whose clocks are not strictly
//! dominated by another entry's clock, the same rule a multi-value register
//! uses to drop overwritten writes. Taking the maximal entries of a union is
//! commutative, associative and idempotent, so every vector-clock variant in
//! this crate stores its per-member (or per-tag) history as a `Frontier` and
//! resolves concurrency only when the state is read.

use serde::{Deserialize, Serialize};

use crate::vclock::{CausalOrder, VClock};

/// Something that carries the vector clock it was written at.
pub trait Clocked {
    /// The actor type of the clock.
    type Actor: Ord;

    /// The clock this entry was written at.
    fn clock(&self) -> &VClock<Self::Actor>;
}

impl<A: Ord> Clocked for VClock<A> {
    type Actor = A;

    fn clock(&self) -> &VClock<A> {
        self
    }
}

/// The causally maximal entries seen so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frontier<E> {
    entries: Vec<E>,
}

impl<E> Default for Frontier<E> {
    fn default() -> Self {
        Frontier {
            entries: Vec::new(),
        }
    }
}

impl<E: PartialEq> PartialEq for Frontier<E> {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().all(|e| other.entries.contains(e))
    }
}

impl<E: Eq> Eq for Frontier<E> {}

impl<E> Frontier<E> {
    /// An empty frontier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate over the maximal entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.entries.iter()
    }

    /// True if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of mutually concurrent entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<E: Clocked + Clone + PartialEq> Frontier<E> {
    /// A frontier holding a single entry.
    pub fn single(entry: E) -> Self {
        Frontier {
            entries: vec![entry],
        }
    }

    /// Returns a new frontier with `entry` recorded.
    ///
    /// Entries strictly dominated by `entry` are dropped, `entry` itself is
    /// dropped if an existing entry dominates it or is identical to it.
    pub fn insert(&self, entry: E) -> Self {
        let mut entries = Vec::with_capacity(self.entries.len() + 1);
        let mut seen = false;
        for existing in self.entries.iter() {
            match existing.clock().compare(entry.clock()) {
                CausalOrder::Before => continue,
                CausalOrder::After => seen = true,
                CausalOrder::Equal if existing == &entry => seen = true,
                _ => (),
            }
            entries.push(existing.clone());
        }
        if !seen {
            entries.push(entry);
        }
        Frontier { entries }
    }

    /// Least upper bound of two frontiers.
    pub fn merge(&self, other: &Self) -> Self {
        other
            .entries
            .iter()
            .fold(self.clone(), |acc, e| acc.insert(e.clone()))
    }

    /// True if some recorded entry's clock is at or after `clock`.
    pub fn covers(&self, clock: &VClock<E::Actor>) -> bool {
        self.entries.iter().any(|e| match e.clock().compare(clock) {
            CausalOrder::After | CausalOrder::Equal => true,
            _ => false,
        })
    }
}

impl<E: Clocked + Clone + PartialEq> std::iter::FromIterator<E> for Frontier<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Frontier::new(), |acc, e| acc.insert(e))
    }
}
