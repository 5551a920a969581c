use std::fmt::Debug;
use std::hash::Hash;

use crate::error::Result;

/// Actors are unique identifiers for every replica mutating a CRDT.
///
/// Their ordering carries no meaning beyond deterministic tie-breaks
/// between concurrent writes.
pub trait Actor: Ord + Clone + Hash + Debug {}
impl<A: Ord + Clone + Hash + Debug> Actor for A {}

/// Logical time supplied by the caller, e.g. a per-replica counter.
pub type Timestamp = u64;

/// State based CRDT's replicate by transmitting the entire CRDT state.
pub trait CvRDT: Sized {
    /// Merge the given CRDT into the current one, producing a new CRDT.
    ///
    /// Merge must be commutative, associative and idempotent.
    fn merge(&self, other: &Self) -> Self;
}

/// Operation based CRDT's replicate by transmitting each operation.
pub trait CmRDT: Sized {
    /// Op defines a mutation to the CRDT.
    /// As long as Op's from one actor are replayed in exactly the same order
    /// they were generated by that actor, the CRDT will converge. In other
    /// words, we must have a total ordering on each actors operations, while
    /// requiring only a partial order over all ops.
    type Op;

    /// Apply an Op to the CRDT, producing a new CRDT.
    fn apply(&self, op: Self::Op) -> Self;
}

/// A state based CRDT whose merge may detect an invariant violation.
pub trait FunkyCvRDT: Sized {
    /// Merge the given CRDT into the current one, producing a new CRDT.
    fn merge(&self, other: &Self) -> Result<Self>;
}

/// An operation based CRDT whose apply may detect an invariant violation.
pub trait FunkyCmRDT: Sized {
    /// Op defines a mutation to the CRDT.
    type Op;

    /// Apply an Op to the CRDT, producing a new CRDT.
    fn apply(&self, op: Self::Op) -> Result<Self>;
}
