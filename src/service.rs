//! Replica services: the glue between a CRDT value and wherever its state
//! is stored.
//!
//! A service owns a [`Repository`]. Every call loads the current state,
//! runs the pure CRDT operation on it and persists the result.
//!
//! The load, apply and persist steps are not atomic. A service must only be
//! driven by one thread at a time; callers that share a replica between
//! threads have to put the service behind a lock such as a `Mutex`,
//! otherwise concurrent calls can lose updates.
//!
//! # Examples
//!
//! ```
//! use crdt_algebra::{CommutativeService, GSet, MemoryRepository};
//! let mut a = CommutativeService::new(MemoryRepository::<GSet<u8>>::default());
//! let mut b = CommutativeService::new(MemoryRepository::<GSet<u8>>::default());
//!
//! let op = a.local(|s| s.add(4)).unwrap();
//! b.downstream(op).unwrap();
//! assert!(b.state().unwrap().lookup(&4));
//! ```

use std::fmt::Debug;
use std::marker::PhantomData;

use tracing::{debug, trace};

use crate::error::Error;
use crate::traits::{CmRDT, CvRDT, FunkyCmRDT, FunkyCvRDT};

/// Storage for the state of a single replica.
///
/// Errors raised by the CRDT algebra itself are converted into the
/// repository's error type, so services report both through one type.
pub trait Repository<S> {
    /// Error raised by the storage, or by the CRDT algebra.
    type Error: From<Error>;

    /// Read the current state.
    fn load(&self) -> Result<S, Self::Error>;

    /// Replace the stored state.
    fn persist(&mut self, state: S) -> Result<(), Self::Error>;
}

/// A repository holding the state in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryRepository<S> {
    state: S,
}

impl<S> MemoryRepository<S> {
    /// A repository seeded with `state`.
    pub fn new(state: S) -> Self {
        MemoryRepository { state }
    }
}

impl<S: Clone> Repository<S> for MemoryRepository<S> {
    type Error = Error;

    fn load(&self) -> Result<S, Error> {
        Ok(self.state.clone())
    }

    fn persist(&mut self, state: S) -> Result<(), Error> {
        self.state = state;
        Ok(())
    }
}

fn commit<S: Debug, R: Repository<S>>(repository: &mut R, state: S) -> Result<(), R::Error> {
    trace!(state = ?state, "persisting state");
    repository.persist(state)
}

fn load<S: Debug, R: Repository<S>>(repository: &R) -> Result<S, R::Error> {
    let state = repository.load()?;
    trace!(state = ?state, "loaded state");
    Ok(state)
}

/// A replica that propagates whole states.
///
/// Local changes return the new state, which is shipped to other replicas
/// and folded in there with [`merge`](ConvergentService::merge).
#[derive(Debug)]
pub struct ConvergentService<S, R> {
    repository: R,
    state: PhantomData<S>,
}

impl<S: Debug, R: Repository<S>> ConvergentService<S, R> {
    /// A service storing its state in `repository`.
    pub fn new(repository: R) -> Self {
        ConvergentService {
            repository,
            state: PhantomData,
        }
    }

    /// The current state of the replica.
    pub fn state(&self) -> Result<S, R::Error> {
        load(&self.repository)
    }

    /// The underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }
}

impl<S, R> ConvergentService<S, R>
where
    S: CmRDT + Clone + Debug,
    S::Op: Debug,
    R: Repository<S>,
{
    /// Apply the op built by `f` from the current state and return the new
    /// state for propagation.
    pub fn local<F: FnOnce(&S) -> S::Op>(&mut self, f: F) -> Result<S, R::Error> {
        let current = load(&self.repository)?;
        let op = f(&current);
        debug!(op = ?op, "applying local op");
        let next = current.apply(op);
        commit(&mut self.repository, next.clone())?;
        Ok(next)
    }
}

impl<S, R> ConvergentService<S, R>
where
    S: CvRDT + Clone + Debug,
    R: Repository<S>,
{
    /// Fold a remote state into this replica.
    pub fn merge(&mut self, remote: &S) -> Result<S, R::Error> {
        let current = load(&self.repository)?;
        debug!(remote = ?remote, "merging remote state");
        let next = current.merge(remote);
        commit(&mut self.repository, next.clone())?;
        Ok(next)
    }
}

impl<S, R> ConvergentService<S, R>
where
    S: FunkyCmRDT + Clone + Debug,
    S::Op: Debug,
    R: Repository<S>,
{
    /// Fallible form of [`local`](ConvergentService::local).
    pub fn try_local<F: FnOnce(&S) -> S::Op>(&mut self, f: F) -> Result<S, R::Error> {
        let current = load(&self.repository)?;
        let op = f(&current);
        debug!(op = ?op, "applying local op");
        let next = current.apply(op)?;
        commit(&mut self.repository, next.clone())?;
        Ok(next)
    }
}

impl<S, R> ConvergentService<S, R>
where
    S: FunkyCvRDT + Clone + Debug,
    R: Repository<S>,
{
    /// Fallible form of [`merge`](ConvergentService::merge).
    pub fn try_merge(&mut self, remote: &S) -> Result<S, R::Error> {
        let current = load(&self.repository)?;
        debug!(remote = ?remote, "merging remote state");
        let next = current.merge(remote)?;
        commit(&mut self.repository, next.clone())?;
        Ok(next)
    }
}

/// A replica that propagates operations.
///
/// Local changes return the op, which other replicas replay with
/// [`downstream`](CommutativeService::downstream). Nothing resends lost ops,
/// so delivery is the transport's problem.
#[derive(Debug)]
pub struct CommutativeService<S, R> {
    repository: R,
    state: PhantomData<S>,
}

impl<S: Debug, R: Repository<S>> CommutativeService<S, R> {
    /// A service storing its state in `repository`.
    pub fn new(repository: R) -> Self {
        CommutativeService {
            repository,
            state: PhantomData,
        }
    }

    /// The current state of the replica.
    pub fn state(&self) -> Result<S, R::Error> {
        load(&self.repository)
    }

    /// The underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }
}

impl<S, R> CommutativeService<S, R>
where
    S: CmRDT + Debug,
    S::Op: Clone + Debug,
    R: Repository<S>,
{
    /// Apply the op built by `f` from the current state and return it for
    /// propagation.
    pub fn local<F: FnOnce(&S) -> S::Op>(&mut self, f: F) -> Result<S::Op, R::Error> {
        let current = load(&self.repository)?;
        let op = f(&current);
        debug!(op = ?op, "applying local op");
        commit(&mut self.repository, current.apply(op.clone()))?;
        Ok(op)
    }

    /// Apply an op received from another replica.
    pub fn downstream(&mut self, op: S::Op) -> Result<(), R::Error> {
        let current = load(&self.repository)?;
        debug!(op = ?op, "applying downstream op");
        commit(&mut self.repository, current.apply(op))
    }
}

impl<S, R> CommutativeService<S, R>
where
    S: FunkyCmRDT + Debug,
    S::Op: Clone + Debug,
    R: Repository<S>,
{
    /// Fallible form of [`local`](CommutativeService::local).
    pub fn try_local<F: FnOnce(&S) -> S::Op>(&mut self, f: F) -> Result<S::Op, R::Error> {
        let current = load(&self.repository)?;
        let op = f(&current);
        debug!(op = ?op, "applying local op");
        commit(&mut self.repository, current.apply(op.clone())?)?;
        Ok(op)
    }

    /// Fallible form of [`downstream`](CommutativeService::downstream).
    pub fn try_downstream(&mut self, op: S::Op) -> Result<(), R::Error> {
        let current = load(&self.repository)?;
        debug!(op = ?op, "applying downstream op");
        commit(&mut self.repository, current.apply(op)?)
    }
}
