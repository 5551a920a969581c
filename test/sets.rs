use std::collections::BTreeSet;
use std::fmt::Debug;

use crdt_algebra::*;

const REPLICAS: u8 = 3;
const MEMBERS: u8 = 8;

/// The members a replica reads as present.
trait Present {
    fn present(&self) -> BTreeSet<u8>;
}

macro_rules! impl_present {
    ($($set:ty),*) => {
        $(
            impl Present for $set {
                fn present(&self) -> BTreeSet<u8> {
                    self.values()
                }
            }
        )*
    };
}

impl_present!(
    GSet<u8>,
    PSet<u8>,
    USet<u8>,
    LWWSet<u8>,
    LWWOptSet<u8>,
    LWWSetVC<u8, u8>,
    LWWOptSetVC<u8, u8>,
    ORSet<u8, u8>,
    OROptSet<u8, u8>,
    OURSet<u8, u8>,
    OUROptSet<u8, u8>,
    OURSetVC<u8, u8>,
    OUROptSetVC<u8, u8>
);

/// A set replica able to invent a local op from a random primitive.
trait Replica: CmRDT + CvRDT + Present + Clone + Default + PartialEq + Debug
where
    Self::Op: Clone + Debug,
{
    fn local(&self, actor: u8, member: u8, choice: u8, timestamp: u64) -> Self::Op;
}

impl Replica for GSet<u8> {
    fn local(&self, _: u8, member: u8, _: u8, _: u64) -> Self::Op {
        self.add(member)
    }
}

impl Replica for PSet<u8> {
    fn local(&self, _: u8, member: u8, choice: u8, _: u64) -> Self::Op {
        if choice % 2 == 1 && self.lookup(&member) {
            self.rm(member)
        } else {
            self.add(member)
        }
    }
}

impl Replica for USet<u8> {
    fn local(&self, _: u8, member: u8, choice: u8, _: u64) -> Self::Op {
        if choice % 2 == 1 && self.lookup(&member) {
            self.rm(member)
        } else {
            self.add(member)
        }
    }
}

impl Replica for LWWSet<u8> {
    fn local(&self, _: u8, member: u8, choice: u8, timestamp: u64) -> Self::Op {
        match choice % 2 {
            0 => self.add(member, timestamp),
            _ => self.rm(member, timestamp),
        }
    }
}

impl Replica for LWWOptSet<u8> {
    fn local(&self, _: u8, member: u8, choice: u8, timestamp: u64) -> Self::Op {
        match choice % 2 {
            0 => self.add(member, timestamp),
            _ => self.rm(member, timestamp),
        }
    }
}

impl Replica for LWWSetVC<u8, u8> {
    fn local(&self, actor: u8, member: u8, choice: u8, _: u64) -> Self::Op {
        match choice % 2 {
            0 => self.add(member, actor),
            _ => self.rm(member, actor),
        }
    }
}

impl Replica for LWWOptSetVC<u8, u8> {
    fn local(&self, actor: u8, member: u8, choice: u8, _: u64) -> Self::Op {
        match choice % 2 {
            0 => self.add(member, actor),
            _ => self.rm(member, actor),
        }
    }
}

impl Replica for ORSet<u8, u8> {
    fn local(&self, actor: u8, member: u8, choice: u8, _: u64) -> Self::Op {
        match choice % 2 {
            0 => self.add(member, actor),
            _ => self.rm(member),
        }
    }
}

impl Replica for OROptSet<u8, u8> {
    fn local(&self, actor: u8, member: u8, choice: u8, _: u64) -> Self::Op {
        match choice % 2 {
            0 => self.add(member, actor),
            _ => self.rm(member),
        }
    }
}

impl Replica for OURSet<u8, u8> {
    fn local(&self, actor: u8, member: u8, choice: u8, timestamp: u64) -> Self::Op {
        let tags: Vec<Dot<u8>> = self.adds().keys().cloned().collect();
        match choice % 3 {
            1 => self.rm(&member),
            2 if !tags.is_empty() => {
                let tag = tags[member as usize % tags.len()].clone();
                self.update(tag, member, timestamp)
            }
            _ => self.add(member, actor, timestamp),
        }
    }
}

impl Replica for OUROptSet<u8, u8> {
    fn local(&self, actor: u8, member: u8, choice: u8, timestamp: u64) -> Self::Op {
        let tags: Vec<Dot<u8>> = self.elements().map(|(tag, _)| tag.clone()).collect();
        match choice % 3 {
            1 => self.rm(&member),
            2 if !tags.is_empty() => {
                let tag = tags[member as usize % tags.len()].clone();
                self.update(tag, member, timestamp)
            }
            _ => self.add(member, actor, timestamp),
        }
    }
}

impl Replica for OURSetVC<u8, u8> {
    fn local(&self, actor: u8, member: u8, choice: u8, _: u64) -> Self::Op {
        let tags: Vec<Dot<u8>> = self.adds().keys().cloned().collect();
        match choice % 3 {
            1 => self.rm(&member),
            2 if !tags.is_empty() => {
                let tag = tags[member as usize % tags.len()].clone();
                self.update(tag, member, actor)
            }
            _ => self.add(member, actor),
        }
    }
}

impl Replica for OUROptSetVC<u8, u8> {
    fn local(&self, actor: u8, member: u8, choice: u8, _: u64) -> Self::Op {
        let tags: Vec<Dot<u8>> = self.elements().map(|(tag, _)| tag.clone()).collect();
        match choice % 3 {
            1 => self.rm(&member),
            2 if !tags.is_empty() => {
                let tag = tags[member as usize % tags.len()].clone();
                self.update(tag, member, actor)
            }
            _ => self.add(member, actor),
        }
    }
}

/// Drive `REPLICAS` replicas with the primitives, returning their states
/// and the log of every op in the order it was produced.
fn replicate<S: Replica>(prims: &[(u8, u8, u8)]) -> (Vec<S>, Vec<S::Op>)
where
    S::Op: Clone + Debug,
{
    let isolated: Vec<_> = prims
        .iter()
        .map(|&(actor, member, choice)| (actor, member, choice, false))
        .collect();
    replicate_synced(&isolated)
}

/// Like `replicate`, but a primitive with `sync` set pulls the next
/// replica's state in before writing, so ops descend other actors' writes.
fn replicate_synced<S: Replica>(prims: &[(u8, u8, u8, bool)]) -> (Vec<S>, Vec<S::Op>)
where
    S::Op: Clone + Debug,
{
    let mut replicas: Vec<S> = (0..REPLICAS).map(|_| S::default()).collect();
    let mut log = Vec::new();
    for (i, &(actor, member, choice, sync)) in prims.iter().enumerate() {
        let actor = actor % REPLICAS;
        let idx = actor as usize;
        if sync {
            let peer = replicas[(idx + 1) % REPLICAS as usize].clone();
            replicas[idx] = replicas[idx].merge(&peer);
        }
        let op = replicas[idx].local(actor, member % MEMBERS, choice, i as u64 / 2);
        replicas[idx] = replicas[idx].apply(op.clone());
        log.push(op);
    }
    (replicas, log)
}

fn merge_all<S: Replica>(replicas: &[S]) -> S
where
    S::Op: Clone + Debug,
{
    replicas
        .iter()
        .fold(S::default(), |acc, replica| acc.merge(replica))
}

fn merge_commutes<S: Replica>(prims: Vec<(u8, u8, u8)>) -> bool
where
    S::Op: Clone + Debug,
{
    let (r, _) = replicate::<S>(&prims);
    let ab = S::default().merge(&r[0]).merge(&r[1]);
    let ba = S::default().merge(&r[1]).merge(&r[0]);
    ab == ba
}

fn merge_associates<S: Replica>(prims: Vec<(u8, u8, u8)>) -> bool
where
    S::Op: Clone + Debug,
{
    let (r, _) = replicate::<S>(&prims);
    r[0].merge(&r[1]).merge(&r[2]) == r[0].merge(&r[1].merge(&r[2]))
}

fn merge_is_idempotent<S: Replica>(prims: Vec<(u8, u8, u8)>) -> bool
where
    S::Op: Clone + Debug,
{
    let (r, _) = replicate::<S>(&prims);
    r.iter().all(|replica| replica.merge(replica) == *replica)
}

fn redelivery_is_noop<S: Replica>(prims: Vec<(u8, u8, u8)>) -> bool
where
    S::Op: Clone + Debug,
{
    let (r, log) = replicate::<S>(&prims);
    let merged = merge_all(&r);
    log.into_iter().all(|op| {
        let once = merged.apply(op.clone());
        once == merged && once.apply(op) == once
    })
}

fn replay_matches_merge<S: Replica>(prims: Vec<(u8, u8, u8)>) -> bool
where
    S::Op: Clone + Debug,
{
    let (r, log) = replicate::<S>(&prims);
    let merged = merge_all(&r);
    let replayed = log
        .into_iter()
        .fold(S::default(), |state, op| state.apply(op));
    if replayed != merged {
        println!("merged: {:?}", merged);
        println!("replayed: {:?}", replayed);
        return false;
    }
    true
}

fn merge_order_is_irrelevant<S: Replica>(prims: Vec<(u8, u8, u8)>) -> bool
where
    S::Op: Clone + Debug,
{
    let (r, _) = replicate::<S>(&prims);
    let forward = merge_all(&r);
    let mut reversed = r.clone();
    reversed.reverse();
    let backward = merge_all(&reversed);
    let twice = forward.merge(&backward);
    forward == backward && twice == forward
}

fn synced_merge_is_a_join<S: Replica>(prims: Vec<(u8, u8, u8, bool)>) -> bool
where
    S::Op: Clone + Debug,
{
    let (r, _) = replicate_synced::<S>(&prims);
    let commutes = r[0].merge(&r[1]) == r[1].merge(&r[0]);
    let associates = r[0].merge(&r[1]).merge(&r[2]) == r[0].merge(&r[1].merge(&r[2]));
    let idempotent = r.iter().all(|replica| replica.merge(replica) == *replica);
    commutes && associates && idempotent
}

fn synced_replay_reads_as_merge<S: Replica>(prims: Vec<(u8, u8, u8, bool)>) -> bool
where
    S::Op: Clone + Debug,
{
    let (r, log) = replicate_synced::<S>(&prims);
    let merged = merge_all(&r);
    let replayed = log
        .into_iter()
        .fold(S::default(), |state, op| state.apply(op));
    replayed.present() == merged.present()
}

fn reordered_replay_matches_merge<S: Replica>(prims: Vec<(u8, u8, u8, bool)>, seed: usize) -> bool
where
    S::Op: Clone + Debug,
{
    let (r, log) = replicate_synced::<S>(&prims);
    let merged = merge_all(&r);
    let reversed = log
        .iter()
        .rev()
        .cloned()
        .fold(S::default(), |state, op| state.apply(op));
    let mut rotated = log;
    if !rotated.is_empty() {
        let mid = seed % rotated.len();
        rotated.rotate_left(mid);
    }
    let rotated = rotated
        .into_iter()
        .fold(S::default(), |state, op| state.apply(op));
    reversed == merged && rotated == merged
}

macro_rules! set_properties {
    ($name:ident, $set:ty) => {
        mod $name {
            use super::*;

            quickcheck! {
                fn prop_merge_commutes(prims: Vec<(u8, u8, u8)>) -> bool {
                    merge_commutes::<$set>(prims)
                }

                fn prop_merge_associates(prims: Vec<(u8, u8, u8)>) -> bool {
                    merge_associates::<$set>(prims)
                }

                fn prop_merge_is_idempotent(prims: Vec<(u8, u8, u8)>) -> bool {
                    merge_is_idempotent::<$set>(prims)
                }

                fn prop_redelivery_is_noop(prims: Vec<(u8, u8, u8)>) -> bool {
                    redelivery_is_noop::<$set>(prims)
                }

                fn prop_replay_matches_merge(prims: Vec<(u8, u8, u8)>) -> bool {
                    replay_matches_merge::<$set>(prims)
                }

                fn prop_merge_order_is_irrelevant(prims: Vec<(u8, u8, u8)>) -> bool {
                    merge_order_is_irrelevant::<$set>(prims)
                }

                fn prop_synced_merge_is_a_join(prims: Vec<(u8, u8, u8, bool)>) -> bool {
                    synced_merge_is_a_join::<$set>(prims)
                }

                fn prop_synced_replay_reads_as_merge(prims: Vec<(u8, u8, u8, bool)>) -> bool {
                    synced_replay_reads_as_merge::<$set>(prims)
                }
            }
        }
    };
}

/// Sets whose ops commute, so any delivery order converges.
macro_rules! delivery_order_properties {
    ($name:ident, $set:ty) => {
        mod $name {
            use super::*;

            quickcheck! {
                fn prop_reordered_replay_matches_merge(
                    prims: Vec<(u8, u8, u8, bool)>,
                    seed: usize
                ) -> bool {
                    reordered_replay_matches_merge::<$set>(prims, seed)
                }
            }
        }
    };
}

set_properties!(gset_laws, GSet<u8>);
set_properties!(pset_laws, PSet<u8>);
set_properties!(uset_laws, USet<u8>);
set_properties!(lwwset_laws, LWWSet<u8>);
set_properties!(lwwset_opt_laws, LWWOptSet<u8>);
set_properties!(lwwset_vc_laws, LWWSetVC<u8, u8>);
set_properties!(lwwset_opt_vc_laws, LWWOptSetVC<u8, u8>);
set_properties!(orset_laws, ORSet<u8, u8>);
set_properties!(orset_opt_laws, OROptSet<u8, u8>);
set_properties!(ourset_laws, OURSet<u8, u8>);
set_properties!(ourset_opt_laws, OUROptSet<u8, u8>);
set_properties!(ourset_vc_laws, OURSetVC<u8, u8>);
set_properties!(ourset_opt_vc_laws, OUROptSetVC<u8, u8>);

delivery_order_properties!(gset_delivery, GSet<u8>);
delivery_order_properties!(lwwset_delivery, LWWSet<u8>);
delivery_order_properties!(lwwset_opt_delivery, LWWOptSet<u8>);
delivery_order_properties!(lwwset_vc_delivery, LWWSetVC<u8, u8>);
delivery_order_properties!(lwwset_opt_vc_delivery, LWWOptSetVC<u8, u8>);

#[test]
fn test_pset_removal_is_permanent() {
    let s = PSet::new();
    let s = s.apply(s.add("x"));
    let s = s.apply(s.rm("x"));
    let s = s.apply(s.add("x"));
    assert!(!s.lookup(&"x"));
}

#[test]
fn test_orset_second_tag_survives() {
    let tag1 = Dot::new("A", 1);
    let tag2 = Dot::new("A", 2);
    let s = ORSet::new()
        .apply(crdt_algebra::orset::Op::Add { member: "x", tag: tag1.clone() })
        .apply(crdt_algebra::orset::Op::Add { member: "x", tag: tag2 })
        .apply(crdt_algebra::orset::Op::Rm { member: "x", tags: vec![tag1].into_iter().collect() });
    assert!(s.lookup(&"x"));
}

#[test]
fn test_lww_opt_set_timeline() {
    let s = LWWOptSet::new();
    let at_10 = s.apply(s.add("x", 10));
    let at_20 = at_10.apply(at_10.rm("x", 20));
    let at_30 = at_20.apply(at_20.add("x", 30));
    assert!(!at_20.lookup(&"x"));
    assert!(at_30.lookup(&"x"));
}

#[test]
fn test_lww_set_tolerates_reordering() {
    let s = LWWSet::new();
    let ops = vec![s.add(1, 10), s.rm(1, 20), s.add(1, 30)];
    let forward = ops.iter().cloned().fold(LWWSet::new(), |s, op| s.apply(op));
    let backward = ops.into_iter().rev().fold(LWWSet::new(), |s, op| s.apply(op));
    assert_eq!(forward, backward);
    assert!(forward.lookup(&1));
}
