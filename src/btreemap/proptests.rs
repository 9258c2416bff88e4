use crate::BTreeMap;
use proptest::collection::btree_set as pset;
use proptest::collection::vec as pvec;
use proptest::prelude::*;
use std::collections::{BTreeMap as StdBTreeMap, BTreeSet};
use test_strategy::proptest;

// Keys are drawn from a small range so that operations often hit existing keys.
const KEY_RANGE: std::ops::Range<u16> = 0..512;

#[derive(Debug, Clone)]
enum Operation {
    Insert { key: u16, value: u32 },
    Iter { from: usize, len: usize },
    Get(u16),
    Remove(u16),
    ContainsValue(u32),
    PopFirst,
    PopLast,
}

// A custom strategy that gives unequal weights to the different operations.
// Note that `Insert` has a higher weight than the removals so that, on average,
// maps are growing in size the more operations are executed.
fn op_strategy() -> impl Strategy<Value = Operation> {
    prop_oneof![
        6 => (KEY_RANGE, any::<u32>()).prop_map(|(key, value)| Operation::Insert { key, value }),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(from, len)| Operation::Iter { from, len }),
        2 => KEY_RANGE.prop_map(Operation::Get),
        3 => KEY_RANGE.prop_map(Operation::Remove),
        1 => any::<u32>().prop_map(Operation::ContainsValue),
        1 => Just(Operation::PopFirst),
        1 => Just(Operation::PopLast),
    ]
}

// Runs a comprehensive test for the major BTreeMap operations.
// Results are validated against a standard BTreeMap, and the structure of the
// tree is checked after every operation.
#[proptest(cases = 32)]
fn comprehensive(
    #[strategy(2..8usize)] degree: usize,
    #[strategy(pvec(op_strategy(), 100..2_000))] ops: Vec<Operation>,
) {
    let mut btree = BTreeMap::with_degree(degree).unwrap();
    let mut std_btree = StdBTreeMap::new();

    for op in ops.into_iter() {
        execute_operation(&mut std_btree, &mut btree, op);
        btree.validate();
    }

    assert_eq!(
        btree.in_order_keys(),
        std_btree.keys().copied().collect::<Vec<_>>()
    );
}

// A comprehensive fuzz test that runs until it's explicitly terminated. To run:
//
// ```
// cargo t comprehensive_fuzz -- --ignored --nocapture 2> comprehensive_fuzz.log
// ```
//
// comprehensive_fuzz.log contains all the operations to help triage a failure.
#[test]
#[ignore]
fn comprehensive_fuzz() {
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;
    let mut runner = TestRunner::default();

    let mut btree = BTreeMap::with_degree(3).unwrap();
    let mut std_btree = StdBTreeMap::new();

    let mut i = 0;

    loop {
        let op = op_strategy().new_tree(&mut runner).unwrap().current();
        execute_operation(&mut std_btree, &mut btree, op);
        i += 1;
        if i % 1000 == 0 {
            btree.validate();
            println!("=== Step {i} ===");
            println!("=== BTree Size: {}", btree.len());
        }
    }
}

#[proptest(cases = 10)]
fn insert(
    #[strategy(2..8usize)] degree: usize,
    #[strategy(pset(any::<u64>(), 500..3_000))] keys: BTreeSet<u64>,
) {
    let mut btree = BTreeMap::with_degree(degree).unwrap();
    for key in keys.iter() {
        assert_eq!(btree.insert(*key, *key), None);
    }
    btree.validate();

    for key in keys.iter() {
        // Assert we retrieved the old value correctly.
        assert_eq!(btree.insert(*key, 0), Some(*key));
        // Assert we retrieved the new value correctly.
        assert_eq!(btree.get(key), Some(&0));
    }

    assert_eq!(btree.len(), keys.len());
    btree.validate();
}

#[proptest]
fn map_min_max(#[strategy(pvec(any::<u64>(), 10..100))] keys: Vec<u64>) {
    let mut map = BTreeMap::with_degree(2).unwrap();
    assert_eq!(map.first_key_value(), None);
    assert_eq!(map.last_key_value(), None);

    for (n, key) in keys.iter().enumerate() {
        map.insert(*key, *key);

        let min = keys[0..=n].iter().min().unwrap();
        let max = keys[0..=n].iter().max().unwrap();

        assert_eq!(map.first_key_value(), Some((min, min)));
        assert_eq!(map.last_key_value(), Some((max, max)));
    }
}

#[proptest(cases = 64)]
fn remove_in_any_order(
    #[strategy(2..6usize)] degree: usize,
    #[strategy(pset(0..10_000u32, 1..400))] keys: BTreeSet<u32>,
    seed: u64,
) {
    let mut btree = BTreeMap::with_degree(degree).unwrap();
    btree.put_all(keys.iter().map(|k| (*k, *k)));
    btree.validate();

    // Remove in a pseudo-random order derived from the seed.
    let mut order: Vec<u32> = keys.iter().copied().collect();
    order.sort_by_key(|k| (*k as u64).wrapping_mul(seed | 1).rotate_left(17));

    for (removed, key) in order.iter().enumerate() {
        assert_eq!(btree.remove(key), Some(*key));
        assert!(!btree.contains_key(key));
        assert_eq!(btree.len(), keys.len() - removed - 1);
        btree.validate();
    }

    assert!(btree.is_empty());
    assert_eq!(btree.height(), 1);
}

fn execute_operation(
    std_btree: &mut StdBTreeMap<u16, u32>,
    btree: &mut BTreeMap<u16, u32>,
    op: Operation,
) {
    match op {
        Operation::Insert { key, value } => {
            eprintln!("Insert({key}, {value})");
            assert_eq!(btree.insert(key, value), std_btree.insert(key, value));
        }
        Operation::Iter { from, len } => {
            assert_eq!(std_btree.len(), btree.len());
            if std_btree.is_empty() {
                return;
            }

            let from = from % std_btree.len();
            let len = len % std_btree.len();

            eprintln!("Iterate({from}, {len})");
            let std_iter = std_btree.iter().skip(from).take(len);
            let iter = btree.iter().skip(from).take(len);
            assert!(std_iter.eq(iter));
        }
        Operation::Get(key) => {
            eprintln!("Get({key})");
            assert_eq!(btree.get(&key), std_btree.get(&key));
            assert_eq!(btree.contains_key(&key), std_btree.contains_key(&key));
        }
        Operation::Remove(key) => {
            eprintln!("Remove({key})");
            assert_eq!(btree.remove(&key), std_btree.remove(&key));
        }
        Operation::ContainsValue(value) => {
            eprintln!("ContainsValue({value})");
            assert_eq!(
                btree.contains_value(&value),
                std_btree.values().any(|v| *v == value)
            );
        }
        Operation::PopFirst => {
            eprintln!("PopFirst");
            assert_eq!(btree.pop_first(), std_btree.pop_first());
        }
        Operation::PopLast => {
            eprintln!("PopLast");
            assert_eq!(btree.pop_last(), std_btree.pop_last());
        }
    };
}
