use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::traits::{Actor, FunkyCmRDT, FunkyCvRDT, Timestamp};

/// A value together with the marker it was written under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment<V, A> {
    /// the written value
    pub val: V,
    /// caller supplied logical time of the write
    pub timestamp: Timestamp,
    /// the node that performed the write
    pub node: A,
}

impl<V, A: Ord> Assignment<V, A> {
    /// Build an assignment.
    pub fn new(val: V, timestamp: Timestamp, node: A) -> Self {
        Assignment {
            val,
            timestamp,
            node,
        }
    }

    /// True if this assignment should replace `other`.
    ///
    /// Greater timestamps win, equal timestamps go to the lowest node.
    fn wins_over(&self, other: &Self) -> bool {
        self.timestamp > other.timestamp
            || (self.timestamp == other.timestamp && self.node < other.node)
    }
}

/// `LWWReg` is a simple CRDT that contains an arbitrary value
/// along with the logical timestamp and node of the write that set it.
///
/// It is the responsibility of the user to guarantee that timestamps
/// issued by a node are monotonic. Writes with equal timestamps from
/// different nodes resolve to the write from the lowest node; the choice
/// is arbitrary but every replica makes the same one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LWWReg<V, A> {
    current: Option<Assignment<V, A>>,
}

impl<V, A> Default for LWWReg<V, A> {
    fn default() -> Self {
        LWWReg { current: None }
    }
}

impl<V: Clone + PartialEq, A: Actor> FunkyCmRDT for LWWReg<V, A> {
    type Op = Assignment<V, A>;

    fn apply(&self, op: Self::Op) -> Result<Self> {
        self.update(op.val, op.timestamp, op.node)
    }
}

impl<V: Clone + PartialEq, A: Actor> FunkyCvRDT for LWWReg<V, A> {
    fn merge(&self, other: &Self) -> Result<Self> {
        match &other.current {
            None => Ok(self.clone()),
            Some(op) => FunkyCmRDT::apply(self, op.clone()),
        }
    }
}

impl<V: Clone + PartialEq, A: Actor> LWWReg<V, A> {
    /// An unassigned register.
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates value witnessed by the given timestamp and node.
    /// An Err is returned if the same marker was already used
    /// for a different value.
    ///
    /// ```
    /// use crdt_algebra::LWWReg;
    /// let reg = LWWReg::new().update(1, 2, "A").unwrap();
    ///
    /// // updating with a smaller timestamp is a no-op
    /// assert_eq!(reg.update(2, 1, "A").unwrap(), reg);
    ///
    /// // updating with the existing marker fails
    /// assert!(reg.update(2, 2, "A").is_err());
    ///
    /// // equal timestamps go to the lowest node
    /// assert_eq!(reg.update(3, 2, "0").unwrap().value(), Some(&3));
    /// assert_eq!(reg.update(3, 2, "B").unwrap().value(), Some(&1));
    /// ```
    pub fn update(&self, val: V, timestamp: Timestamp, node: A) -> Result<Self> {
        let op = Assignment::new(val, timestamp, node);
        match &self.current {
            None => Ok(LWWReg { current: Some(op) }),
            Some(current) => {
                if current.timestamp == op.timestamp && current.node == op.node {
                    if current.val == op.val {
                        Ok(self.clone())
                    } else {
                        Err(Error::ConflictingMarker)
                    }
                } else if op.wins_over(current) {
                    Ok(LWWReg { current: Some(op) })
                } else {
                    // we've seen this write, or one that beats it
                    Ok(self.clone())
                }
            }
        }
    }

    /// The current value, `None` while unassigned.
    pub fn value(&self) -> Option<&V> {
        self.current.as_ref().map(|a| &a.val)
    }

    /// The winning assignment, `None` while unassigned.
    pub fn assignment(&self) -> Option<&Assignment<V, A>> {
        self.current.as_ref()
    }
}
