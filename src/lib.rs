//! An algebra of serializable, immutable CRDT's: counters, registers and a
//! family of sets.
//!
//! [Conflict-free Replicated Data Types][crdt] (CRDTs) are data structures
//! which can be replicated across multiple networked nodes, and whose
//! properties allow for deterministic, local resolution of
//! possible inconsistencies which might result from concurrent
//! operations.
//!
//! Every type comes in two flavours of replication. State-based replicas
//! exchange whole values and combine them with [`CvRDT::merge`];
//! operation-based replicas exchange ops and replay them with
//! [`CmRDT::apply`]. Neither mutates in place: both return a new value.
//!
//! Several sets exist in a variant ordered by caller supplied timestamps
//! and a variant ordered by [`VClock`]s.
//!
//! ```
//! use crdt_algebra::{CmRDT, CvRDT, GCounter};
//! let a = GCounter::new();
//! let b = GCounter::new();
//! let a = a.apply(a.inc("A", 2));
//! let b = b.apply(b.inc("B", 3));
//! assert_eq!(a.merge(&b).sum(), num_bigint::BigUint::from(5u8));
//! ```
//!
//! [crdt]: https://en.wikipedia.org/wiki/Conflict-free_replicated_data_type
#![crate_type = "lib"]
#![deny(missing_docs)]

mod error;
pub use crate::error::{Error, Result};

mod traits;
pub use crate::traits::{Actor, CmRDT, CvRDT, FunkyCmRDT, FunkyCvRDT, Timestamp};

mod frontier;
pub use crate::frontier::{Clocked, Frontier};

/// This module contains the unique tag of a single event.
pub mod dot;

/// This module contains a Vector Clock.
pub mod vclock;

/// This module contains a Grow-only Counter.
pub mod gcounter;

/// This module contains a Positive-Negative Counter.
pub mod pncounter;

/// This module contains a Last-Write-Wins Register.
pub mod lwwreg;

/// This module contains a Last-Write-Wins Register ordered by vector clocks.
pub mod lwwreg_vc;

/// This module contains a structured value with field-wise patching.
pub mod structured;

/// This module contains a register of field-wise patches.
pub mod patchreg;

/// This module contains a Grow-only Set.
pub mod gset;

/// This module contains a Two-Phase Set.
pub mod pset;

/// This module contains a Two-Phase Set of unique members.
pub mod uset;

/// This module contains a Last-Write-Wins Set.
pub mod lwwset;

/// This module contains a Last-Write-Wins Set with one entry per member.
pub mod lwwset_opt;

/// This module contains a Last-Write-Wins Set ordered by vector clocks.
pub mod lwwset_vc;

/// This module contains a Last-Write-Wins Set with one entry per member,
/// ordered by vector clocks.
pub mod lwwset_opt_vc;

/// This module contains an Observed-Remove Set.
pub mod orset;

/// This module contains an Observed-Remove Set with one entry per tag.
pub mod orset_opt;

/// This module contains an Observed-Update-Remove Set.
pub mod ourset;

/// This module contains an Observed-Update-Remove Set with one slot per tag.
pub mod ourset_opt;

/// This module contains an Observed-Update-Remove Set ordered by vector clocks.
pub mod ourset_vc;

/// This module contains an Observed-Update-Remove Set with one slot per tag,
/// ordered by vector clocks.
pub mod ourset_opt_vc;

/// This module contains replica services backed by repositories.
pub mod service;

// Top-level re-exports for CRDT structures.
pub use crate::{
    dot::Dot,
    gcounter::{CounterElement, GCounter},
    gset::GSet,
    lwwreg::LWWReg,
    lwwreg_vc::LWWRegVC,
    lwwset::LWWSet,
    lwwset_opt::LWWOptSet,
    lwwset_opt_vc::LWWOptSetVC,
    lwwset_vc::LWWSetVC,
    orset::ORSet,
    orset_opt::OROptSet,
    ourset::OURSet,
    ourset_opt::OUROptSet,
    ourset_opt_vc::OUROptSetVC,
    ourset_vc::OURSetVC,
    patchreg::PatchReg,
    pncounter::PNCounter,
    pset::PSet,
    service::{CommutativeService, ConvergentService, MemoryRepository, Repository},
    structured::Value,
    uset::USet,
    vclock::{CausalOrder, VClock},
};
