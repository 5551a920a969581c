use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::structured::Value;
use crate::traits::{Actor, FunkyCmRDT, FunkyCvRDT, Timestamp};

/// Orders the patches of a register for replay.
///
/// Earlier timestamps replay first. Among equal timestamps higher nodes
/// replay first, so the lowest node's patch lands last and wins every
/// field the patches both touch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Marker<A> {
    /// caller supplied logical time of the patch
    pub timestamp: Timestamp,
    /// the node that issued the patch
    pub node: A,
}

impl<A: Ord> Ord for Marker<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl<A: Ord> PartialOrd for Marker<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A partial update of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOp<I, A> {
    /// the entity this patch belongs to
    pub id: I,
    /// the fields to overwrite
    pub patch: Value,
    /// caller supplied logical time of the patch
    pub timestamp: Timestamp,
    /// the node that issued the patch
    pub node: A,
}

/// `PatchReg` is an operation based register over structured values
/// giving last-writer-wins per field instead of per value.
///
/// The register keeps every patch it has been sent for its entity and
/// reads by replaying them in timestamp order, each patch merged over the
/// result of the previous ones (see [`Value::merged`]).
///
/// ```
/// use crdt_algebra::{PatchReg, FunkyCmRDT};
/// use crdt_algebra::structured::Value;
///
/// let reg = PatchReg::new("user-1");
/// let name = reg.write(Value::object(vec![("name", "bob".into())]), 1, "A");
/// let age = reg.write(Value::object(vec![("age", 30.into())]), 2, "B");
///
/// // delivery order does not matter
/// let ab = reg.apply(name.clone()).and_then(|r| r.apply(age.clone())).unwrap();
/// let ba = reg.apply(age).and_then(|r| r.apply(name)).unwrap();
/// assert_eq!(ab.value(), ba.value());
/// assert_eq!(
///     ab.value(),
///     Some(Value::object(vec![("name", "bob".into()), ("age", 30.into())]))
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchReg<I, A: Ord> {
    id: I,
    patches: BTreeMap<Marker<A>, Value>,
}

impl<I, A> FunkyCmRDT for PatchReg<I, A>
where
    I: Clone + PartialEq + Debug,
    A: Actor,
{
    type Op = PatchOp<I, A>;

    fn apply(&self, op: Self::Op) -> Result<Self> {
        if op.id != self.id {
            return Err(Error::MismatchedId {
                expected: format!("{:?}", self.id),
                found: format!("{:?}", op.id),
            });
        }
        let marker = Marker {
            timestamp: op.timestamp,
            node: op.node,
        };
        match self.patches.get(&marker) {
            Some(existing) if existing == &op.patch => Ok(self.clone()),
            Some(_) => Err(Error::ConflictingMarker),
            None => {
                let mut patches = self.patches.clone();
                patches.insert(marker, op.patch);
                Ok(PatchReg {
                    id: self.id.clone(),
                    patches,
                })
            }
        }
    }
}

impl<I, A> FunkyCvRDT for PatchReg<I, A>
where
    I: Clone + PartialEq + Debug,
    A: Actor,
{
    fn merge(&self, other: &Self) -> Result<Self> {
        other
            .ops()
            .try_fold(self.clone(), |reg, op| FunkyCmRDT::apply(&reg, op))
    }
}

impl<I, A> PatchReg<I, A>
where
    I: Clone + PartialEq + Debug,
    A: Actor,
{
    /// A register for `id` that has not seen any patch.
    pub fn new(id: I) -> Self {
        PatchReg {
            id,
            patches: BTreeMap::new(),
        }
    }

    /// Rebuild a register from its persisted patches.
    ///
    /// Fails if `ops` is empty or addresses more than one entity.
    pub fn from_ops<T: IntoIterator<Item = PatchOp<I, A>>>(ops: T) -> Result<Self> {
        let mut ops = ops.into_iter();
        let first = ops.next().ok_or(Error::EmptyOperations)?;
        let reg = PatchReg::new(first.id.clone()).apply(first)?;
        ops.try_fold(reg, |reg, op| reg.apply(op))
    }

    /// Build the Op that patches this register.
    pub fn write(&self, patch: Value, timestamp: Timestamp, node: A) -> PatchOp<I, A> {
        PatchOp {
            id: self.id.clone(),
            patch,
            timestamp,
            node,
        }
    }

    /// The entity this register belongs to.
    pub fn id(&self) -> &I {
        &self.id
    }

    /// The recorded patches in replay order.
    pub fn ops(&self) -> impl Iterator<Item = PatchOp<I, A>> + '_ {
        self.patches.iter().map(move |(marker, patch)| PatchOp {
            id: self.id.clone(),
            patch: patch.clone(),
            timestamp: marker.timestamp,
            node: marker.node.clone(),
        })
    }

    /// Replays every patch, `None` if nothing was written yet.
    pub fn value(&self) -> Option<Value> {
        if self.patches.is_empty() {
            return None;
        }
        Some(
            self.patches
                .values()
                .fold(Value::Null, |acc, patch| acc.merged(patch)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(fields: Vec<(&str, Value)>) -> Value {
        Value::object(fields)
    }

    #[test]
    fn test_later_patch_wins_the_field() {
        let reg = PatchReg::new(7);
        let reg = reg
            .apply(reg.write(obj(vec![("title", "draft".into()), ("pages", 3.into())]), 1, "A"))
            .unwrap();
        let reg = reg.apply(reg.write(obj(vec![("TITLE", "final".into())]), 2, "B")).unwrap();
        assert_eq!(
            reg.value(),
            Some(obj(vec![("pages", 3.into()), ("title", "final".into())]))
        );
    }

    #[test]
    fn test_equal_timestamps_lowest_node_wins_each_field() {
        let reg = PatchReg::new(7);
        let from_b = reg.write(obj(vec![("x", 1.into()), ("y", 1.into())]), 5, "B");
        let from_a = reg.write(obj(vec![("x", 2.into())]), 5, "A");
        let ab = reg.apply(from_a.clone()).and_then(|r| r.apply(from_b.clone())).unwrap();
        let ba = reg.apply(from_b).and_then(|r| r.apply(from_a)).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.value(), Some(obj(vec![("x", 2.into()), ("y", 1.into())])));
    }

    #[test]
    fn test_duplicate_patch_is_a_noop() {
        let reg = PatchReg::new(1);
        let op = reg.write(obj(vec![("a", true.into())]), 1, "A");
        let once = reg.apply(op.clone()).unwrap();
        assert_eq!(once.apply(op).unwrap(), once);
    }

    #[test]
    fn test_mismatched_id_is_rejected() {
        let reg: PatchReg<u32, &str> = PatchReg::new(1);
        let op = PatchReg::new(2).write(Value::Null, 1, "A");
        assert_eq!(
            reg.apply(op),
            Err(Error::MismatchedId {
                expected: "1".to_string(),
                found: "2".to_string()
            })
        );
    }

    #[test]
    fn test_from_ops() {
        let empty: Vec<PatchOp<u32, &str>> = vec![];
        assert_eq!(PatchReg::from_ops(empty), Err(Error::EmptyOperations));

        let reg = PatchReg::new(3);
        let ops = vec![
            reg.write(obj(vec![("a", 1.into())]), 2, "A"),
            reg.write(obj(vec![("a", 0.into()), ("b", 0.into())]), 1, "A"),
        ];
        let rebuilt = PatchReg::from_ops(ops).unwrap();
        assert_eq!(rebuilt.id(), &3);
        assert_eq!(rebuilt.value(), Some(obj(vec![("a", 1.into()), ("b", 0.into())])));

        let mixed = vec![reg.write(Value::Null, 1, "A"), PatchReg::new(4).write(Value::Null, 2, "A")];
        assert!(PatchReg::from_ops(mixed).is_err());
    }

    #[test]
    fn test_reused_marker_conflicts() {
        let reg = PatchReg::new(1);
        let reg = reg.apply(reg.write(obj(vec![("a", 1.into())]), 1, "A")).unwrap();
        let clash = reg.write(obj(vec![("a", 2.into())]), 1, "A");
        assert_eq!(reg.apply(clash), Err(Error::ConflictingMarker));
    }
}
