#![doc = include_str!("../README.md")]
pub mod btreemap;
pub mod config;
mod error;

pub use btreemap::{BTreeMap, Iter, Keys, Values};
pub use config::{Config, DEFAULT_DEGREE, MIN_DEGREE};
pub use error::Error;

/// Returns true if every item is less than or equal to the one after it.
///
/// ```rust
/// use resident_btree::{is_sorted, BTreeMap};
///
/// let map: BTreeMap<_, _> = [(3, 'c'), (1, 'a'), (2, 'b')].into_iter().collect();
/// assert!(is_sorted(&map.in_order_keys()));
/// assert!(!is_sorted(&[2, 1]));
/// ```
pub fn is_sorted<T: PartialOrd>(items: &[T]) -> bool {
    items.windows(2).all(|pair| pair[0] <= pair[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_sorted_accepts_trivial_and_equal_runs() {
        assert!(is_sorted::<u32>(&[]));
        assert!(is_sorted(&[7]));
        assert!(is_sorted(&[1, 1, 2, 3, 3]));
        assert!(!is_sorted(&[1, 3, 2]));
    }
}
