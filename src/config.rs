//! Construction-time settings of a [`BTreeMap`](crate::BTreeMap).
use crate::Error;
use std::fmt;

/// The smallest minimum degree a B-tree can have (a 2-3-4 tree).
pub const MIN_DEGREE: usize = 2;

/// The minimum degree used when none is given.
/// This constant is taken from Rust's std implementation of BTreeMap.
pub const DEFAULT_DEGREE: usize = 6;

type KeyExtractor<K, V> = Box<dyn Fn(&V) -> K>;

/// Settings fixed for the whole lifetime of a map.
///
/// * `degree` is the minimum degree `t`: every node other than the root holds
///   between `t - 1` and `2t - 1` entries.
/// * the optional key extractor derives a value's key, which lets
///   [`contains_value`](crate::BTreeMap::contains_value) run a logarithmic lookup
///   instead of scanning every entry.
///
/// ```rust
/// use resident_btree::{BTreeMap, Config};
///
/// let config = Config::new(4).unwrap().with_key_extractor(|user: &(u32, String)| user.0);
/// let mut users = BTreeMap::with_config(config);
/// users.insert(7, (7, "ada".to_string()));
///
/// assert!(users.contains_value(&(7, "ada".to_string())));
/// ```
pub struct Config<K, V> {
    degree: usize,
    key_extractor: Option<KeyExtractor<K, V>>,
}

impl<K, V> Config<K, V> {
    /// Creates a config with the given minimum degree and no key extractor.
    pub fn new(degree: usize) -> Result<Self, Error> {
        if degree < MIN_DEGREE {
            return Err(Error::InvalidDegree { degree });
        }

        Ok(Self {
            degree,
            key_extractor: None,
        })
    }

    /// Sets the function used to derive the key of a value.
    ///
    /// The function must agree with how entries are inserted: for every pair
    /// `(k, v)` stored in the map, `f(&v) == k`.
    pub fn with_key_extractor(mut self, f: impl Fn(&V) -> K + 'static) -> Self {
        self.key_extractor = Some(Box::new(f));
        self
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Returns the key of `value` if a key extractor is configured.
    pub(crate) fn extract_key(&self, value: &V) -> Option<K> {
        self.key_extractor.as_ref().map(|f| f(value))
    }

    pub(crate) fn has_key_extractor(&self) -> bool {
        self.key_extractor.is_some()
    }
}

impl<K, V> Default for Config<K, V> {
    fn default() -> Self {
        Self {
            degree: DEFAULT_DEGREE,
            key_extractor: None,
        }
    }
}

impl<K, V> fmt::Debug for Config<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("degree", &self.degree)
            .field("key_extractor", &self.has_key_extractor())
            .finish()
    }
}
