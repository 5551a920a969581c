use std::collections::BTreeSet;

use crdt_algebra::*;
use num_bigint::{BigInt, BigUint};
use quickcheck_macros::quickcheck;

const ACTOR_MAX: u8 = 11;

#[quickcheck]
fn prop_merge_converges(incs: Vec<(u8, u8)>) -> bool {
    let mut results = BTreeSet::new();

    // Every way of spreading the increments over replicas
    // has to merge into the same sum.
    for i in 2..ACTOR_MAX {
        let mut witnesses: Vec<GCounter<u8>> =
            (0..i).map(|_| GCounter::new()).collect();
        for (actor, by) in incs.iter() {
            let index = (*actor % i) as usize;
            let next = {
                let witness = &witnesses[index];
                witness.apply(witness.inc(*actor, u64::from(*by)))
            };
            witnesses[index] = next;
        }
        let merged = witnesses
            .iter()
            .fold(GCounter::new(), |acc, w| acc.merge(w));
        results.insert(merged.sum());
    }
    results.len() == 1
}

#[test]
fn test_three_nodes_sum() {
    let counter = GCounter::from_elements(vec![
        CounterElement::new(7, "nodeA"),
        CounterElement::new(17, "nodeB"),
        CounterElement::new(9, "nodeC"),
    ]);
    assert_eq!(counter.sum(), BigUint::from(33u8));
}

#[test]
fn test_merge_keeps_max_per_node() {
    let a = GCounter::from_elements(vec![CounterElement::new(5, "A"), CounterElement::new(1, "B")]);
    let b = GCounter::from_elements(vec![CounterElement::new(3, "A"), CounterElement::new(4, "B")]);
    let merged = a.merge(&b);
    assert_eq!(merged.get(&"A"), 5);
    assert_eq!(merged.get(&"B"), 4);
    assert_eq!(merged, b.merge(&a));
    assert_eq!(merged.elements().count(), 2);
}

#[test]
fn test_sum_does_not_overflow() {
    let counter = GCounter::from_elements(vec![
        CounterElement::new(u64::max_value(), 1u8),
        CounterElement::new(u64::max_value(), 2u8),
    ]);
    assert_eq!(counter.sum(), BigUint::from(u64::max_value()) * BigUint::from(2u8));
}

#[quickcheck]
fn prop_tally_never_decreases(start: u64, by: u64) -> bool {
    let counter = GCounter::new().apply(CounterElement::new(start, 'A'));
    let next = counter.apply(counter.inc('A', by));
    next.get(&'A') >= start && next.sum() >= counter.sum()
}

#[test]
fn test_inc_on_a_full_tally_saturates() {
    let a = PNCounter::new();
    let a = a.apply(a.inc("A", u64::max_value()));
    let a = a.apply(a.inc("A", 1)).apply(a.dec("A", 1));
    assert_eq!(a.additions().get(&"A"), u64::max_value());
    assert_eq!(a.sum(), BigInt::from(u64::max_value()) - BigInt::from(1));
}
