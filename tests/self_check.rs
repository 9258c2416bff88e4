use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use resident_btree::{is_sorted, BTreeMap};
use std::collections::BTreeSet;
use tracing_subscriber::EnvFilter;

// Routes the map's tracing events to the test output. Set `RUST_LOG=trace` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// Draws `n` distinct random keys.
fn random_keys(rng: &mut ChaCha8Rng, n: usize) -> Vec<u64> {
    let mut seen = BTreeSet::new();
    let mut keys = Vec::with_capacity(n);
    while keys.len() < n {
        let key = rng.gen::<u64>();
        if seen.insert(key) {
            keys.push(key);
        }
    }
    keys
}

// Inserts random keys into a wide tree, removes them in a shuffled order and then
// reinserts all of them at once, checking the map at every step.
#[test]
fn self_check() {
    init_tracing();
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let keys = random_keys(&mut rng, 5_000);

    let mut map = BTreeMap::with_degree(50).unwrap();
    for (i, key) in keys.iter().enumerate() {
        assert_eq!(map.insert(*key, i), None);
        if i % 500 == 0 {
            assert!(is_sorted(&map.in_order_keys()));
        }
    }
    assert!(is_sorted(&map.in_order_keys()));
    map.validate();

    for (i, key) in keys.iter().enumerate() {
        assert_eq!(map.get(key), Some(&i));
    }

    let mut removal_order = keys.clone();
    removal_order.shuffle(&mut rng);
    for (removed, key) in removal_order.iter().enumerate() {
        assert!(map.remove(key).is_some());
        assert!(!map.contains_key(key));
        if removed % 500 == 0 {
            assert!(is_sorted(&map.in_order_keys()));
            map.validate();
        }
    }
    assert!(map.is_empty());

    map.put_all(keys.iter().map(|key| (*key, 0)));
    assert_eq!(map.len(), keys.len());
    assert!(keys.iter().all(|key| map.contains_key(key)));
    map.validate();
}

#[test]
fn random_stress() {
    init_tracing();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut keys = random_keys(&mut rng, 1_000);

    let mut map = BTreeMap::with_degree(10).unwrap();
    for key in keys.iter() {
        map.insert(*key, *key);
        assert!(is_sorted(&map.in_order_keys()));
    }
    map.validate();

    keys.shuffle(&mut rng);
    for key in keys.iter() {
        assert_eq!(map.remove(key), Some(*key));
        assert!(is_sorted(&map.in_order_keys()));
        assert!(!map.contains_key(key));
    }

    assert!(map.is_empty());
    assert_eq!(map.height(), 1);
}

// Mixes insertions and removals over a small key space so that overwrites and
// absent removals are frequent.
#[test]
fn mixed_workload_for_small_degrees() {
    init_tracing();
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    for degree in 2..=5 {
        let mut map = BTreeMap::with_degree(degree).unwrap();
        let mut model = std::collections::BTreeMap::new();

        for _ in 0..5_000 {
            let key = rng.gen_range(0..300u32);
            if rng.gen_bool(0.6) {
                let value = rng.gen::<u32>();
                assert_eq!(map.insert(key, value), model.insert(key, value));
            } else {
                assert_eq!(map.remove(&key), model.remove(&key));
            }
        }

        map.validate();
        assert_eq!(map.len(), model.len());
        assert!(map.iter().eq(model.iter()));
    }
}
