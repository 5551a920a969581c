use std::result;

use thiserror::Error;

/// CRDT Result alias to reduce redundency in function return types
pub type Result<T> = result::Result<T, Error>;

/// Possible CRDT error codes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Two different values were written under the same marker.
    ///
    /// Markers (timestamp + node, or clock + node) are used exactly once per
    /// value. We don't always check for this, users must design their system
    /// so that a node never reuses a marker for a different write.
    ///
    /// Registers ordered by vector clocks only compare a write against the
    /// writes they still hold. A reused marker arriving after a descendant
    /// has replaced the original write is dropped as stale instead of
    /// reported, so detection depends on delivery order.
    #[error("a marker was reused for a conflicting write")]
    ConflictingMarker,

    /// An operation addressed to one register was applied to another.
    #[error("operation for register {found} applied to register {expected}")]
    MismatchedId {
        /// id of the register receiving the operation
        expected: String,
        /// id carried by the operation
        found: String,
    },

    /// A register was built from an empty set of operations.
    #[error("cannot build a register from an empty set of operations")]
    EmptyOperations,
}
