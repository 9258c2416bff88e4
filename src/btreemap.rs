//! This module implements an ordered key/value map based on a B-Tree whose
//! nodes all live in memory.
//!
//! The tree follows the classic CLRS layout: every node stores sorted entries,
//! internal nodes store one more child than entries, and all leaves sit at the
//! same depth. With minimum degree `b`:
//!
//! ```text
//! every node            <= 2b - 1 entries
//! every non-root node   >=  b - 1 entries
//! every internal node    = entries + 1 children
//! ```
//!
//! Both insertion and removal make a single pass from the root down:
//!
//! * insertion splits every full node before descending into it, so the leaf
//!   that finally receives the entry always has room. Splitting a full root is
//!   the only way the tree grows in height.
//! * removal makes sure every node it descends into (other than the root) holds
//!   at least `b` entries, borrowing from or merging with a sibling when needed.
//!   Collapsing an empty root onto its only child is the only way the tree
//!   shrinks in height.
mod iter;
mod node;

use crate::{Config, Error};
pub use iter::{Iter, Keys, Values};
use node::{Entry, Node, NodeType};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use tracing::{debug, trace};

#[cfg(test)]
mod proptests;

/// A B-Tree map whose nodes are kept in memory.
///
/// Keys are unique and kept in ascending order. Lookups, insertions and removals
/// visit `O(log n)` nodes, each of which is searched in `O(log b)`.
///
/// # Example
///
/// ```rust
/// use resident_btree::BTreeMap;
///
/// let mut map = BTreeMap::with_degree(2).unwrap();
/// for i in 1..=13 {
///     map.insert(i, i * 10);
/// }
///
/// assert_eq!(map.get(&8), Some(&80));
/// assert_eq!(map.remove(&8), Some(80));
/// assert_eq!(map.first_key_value(), Some((&1, &10)));
/// assert_eq!(map.len(), 12);
/// ```
///
/// The map is not synchronized. Sharing one across threads requires external
/// locking, such as a `Mutex` or `RwLock` around the whole map.
pub struct BTreeMap<K, V> {
    // The root is always present. An empty map has an empty leaf as its root.
    root: Box<Node<K, V>>,

    // The number of elements in the map.
    length: usize,

    config: Config<K, V>,
}

/// What a removal is looking for while it descends the tree.
enum Target<'a, Q: ?Sized> {
    Key(&'a Q),
    // The entry with the smallest key in the subtree.
    Min,
    // The entry with the largest key in the subtree.
    Max,
}

impl<Q: ?Sized> Clone for Target<'_, Q> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Q: ?Sized> Copy for Target<'_, Q> {}

impl<Q: Ord + ?Sized> Target<'_, Q> {
    /// Like [`Node::search`]: `Ok` holds the index of the targeted entry in
    /// `node`, `Err` the child to descend into.
    fn locate<K: Borrow<Q>, V>(&self, node: &Node<K, V>) -> Result<usize, usize> {
        match (self, node.node_type()) {
            (Target::Key(key), _) => node.search(*key),
            (Target::Min, NodeType::Leaf) => Ok(0),
            (Target::Min, NodeType::Internal) => Err(0),
            (Target::Max, NodeType::Leaf) => node.entries_len().checked_sub(1).ok_or(0),
            (Target::Max, NodeType::Internal) => Err(node.entries_len()),
        }
    }
}

impl<K, V> BTreeMap<K, V> {
    /// Creates an empty map with the [default degree](crate::DEFAULT_DEGREE).
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty map with the given minimum degree.
    ///
    /// Fails with [`Error::InvalidDegree`] if `degree < 2`.
    pub fn with_degree(degree: usize) -> Result<Self, Error> {
        Ok(Self::with_config(Config::new(degree)?))
    }

    /// Creates an empty map from a validated [`Config`].
    pub fn with_config(config: Config<K, V>) -> Self {
        debug!(
            degree = config.degree(),
            key_extractor = config.has_key_extractor(),
            "created B-tree map"
        );

        Self {
            root: Box::new(Node::new(NodeType::Leaf, config.degree())),
            length: 0,
            config,
        }
    }

    /// Returns the minimum degree of the tree.
    pub fn degree(&self) -> usize {
        self.config.degree()
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns the number of levels in the tree. A map whose root is a leaf,
    /// including an empty map, has a height of 1.
    pub fn height(&self) -> usize {
        let mut node = &*self.root;
        let mut height = 1;
        while !node.is_leaf() {
            node = node.child(0);
            height += 1;
        }
        height
    }

    /// Removes all elements from the map.
    pub fn clear(&mut self) {
        let discarded = self.length;
        self.root = Box::new(Node::new(NodeType::Leaf, self.degree()));
        self.length = 0;
        debug!(discarded, "cleared B-tree map");
    }

    /// Returns the first key-value pair in the map. The key in this
    /// pair is the minimum key in the map.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        if self.is_empty() {
            return None;
        }
        Some(self.root.get_min())
    }

    /// Returns the last key-value pair in the map. The key in this
    /// pair is the maximum key in the map.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        if self.is_empty() {
            return None;
        }
        Some(self.root.get_max())
    }

    /// Returns an iterator over the entries of the map, sorted by key.
    ///
    /// # Example
    ///
    /// ```rust
    /// use resident_btree::BTreeMap;
    /// let mut map = BTreeMap::new();
    ///
    /// map.insert(2, "two");
    /// map.insert(1, "one");
    ///
    /// let entries: Vec<_> = map.iter().collect();
    /// assert_eq!(entries, vec![(&1, &"one"), (&2, &"two")]);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self)
    }

    /// Returns an iterator over the keys of the map, in ascending order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        self.iter().into()
    }

    /// Returns an iterator over the values of the map, sorted by key.
    pub fn values(&self) -> Values<'_, K, V> {
        self.iter().into()
    }

    /// Returns all the keys of the map in ascending order.
    ///
    /// The sequence is computed afresh on every call with a recursive in-order
    /// walk. Use [`keys`](Self::keys) for a lazy, borrowing alternative.
    pub fn in_order_keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        let mut keys = Vec::with_capacity(self.length);
        self.root.collect_keys(&mut keys);
        keys
    }

    fn root(&self) -> &Node<K, V> {
        &self.root
    }
}

impl<K: Ord, V> BTreeMap<K, V> {
    /// Inserts a key-value pair into the map.
    ///
    /// The previous value of the key, if present, is returned and the length of
    /// the map is unchanged.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let b = self.degree();

        // If the root is full, we need to introduce a new node as the root.
        //
        // NOTE: In the case where we are overwriting an existing key, then introducing
        // a new root node isn't strictly necessary. However, that's a micro-optimization
        // that adds more complexity than it's worth.
        if self.root.is_full(b) {
            let old_root = std::mem::replace(
                &mut self.root,
                Box::new(Node::new(NodeType::Internal, b)),
            );

            // The new root has the old root as its only child.
            self.root.push_child(old_root);

            // Split the old (full) root.
            self.root.split_child(0, b);
            trace!(height = self.height(), "split the root");
        }

        let previous = Self::insert_nonfull(&mut self.root, key, value, b);
        if previous.is_none() {
            self.length += 1;
        }
        previous
    }

    /// Inserts an entry into a node that is *not full*.
    fn insert_nonfull(node: &mut Node<K, V>, key: K, value: V, b: usize) -> Option<V> {
        // We're guaranteed by the caller that the provided node is not full.
        debug_assert!(!node.is_full(b));

        match node.search(&key) {
            // The key is already in the node. Overwrite it and return the previous value.
            Ok(idx) => Some(node.replace_value(idx, value)),
            Err(mut idx) => match node.node_type() {
                NodeType::Leaf => {
                    // The node is a non-full leaf.
                    // Insert the entry at the proper location.
                    node.insert_entry(idx, (key, value));
                    None
                }
                NodeType::Internal => {
                    if node.child(idx).is_full(b) {
                        // The child is full. Split the child.
                        node.split_child(idx, b);

                        // The children have now changed. The median that moved up sits
                        // at `idx` and decides which half the key belongs to.
                        match key.cmp(node.key(idx)) {
                            Ordering::Less => {}
                            Ordering::Greater => idx += 1,
                            Ordering::Equal => return Some(node.replace_value(idx, value)),
                        }
                    }

                    Self::insert_nonfull(node.child_mut(idx), key, value, b)
                }
            },
        }
    }

    /// Inserts every pair of `pairs`, in order.
    ///
    /// Each pair is inserted as by [`insert`](Self::insert); later pairs
    /// overwrite earlier ones with the same key.
    pub fn put_all<I>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in pairs {
            self.insert(key, value);
        }
    }

    /// Returns the value for the given key, if it exists.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Self::traverse(&self.root, key).map(|(node, idx)| node.value(idx))
    }

    /// Returns a mutable reference to the value for the given key, if it exists.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Self::traverse_mut(&mut self.root, key)
    }

    /// Returns true if the key exists.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Self::traverse(&self.root, key).is_some()
    }

    /// Returns true if some entry holds `value`.
    ///
    /// With a key extractor configured, this looks up the value's key in
    /// `O(log n)`. Otherwise every entry is compared in an `O(n)` scan.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        match self.config.extract_key(value) {
            Some(key) => self.contains_key(&key),
            None => self.root.contains_value(value),
        }
    }

    /// Recursively traverses from `node`, returning the node and index holding `key`.
    /// Stops at a leaf if not found.
    fn traverse<'a, Q>(node: &'a Node<K, V>, key: &Q) -> Option<(&'a Node<K, V>, usize)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match node.search(key) {
            Ok(idx) => Some((node, idx)),
            Err(idx) => match node.node_type() {
                NodeType::Leaf => None,
                NodeType::Internal => Self::traverse(node.child(idx), key),
            },
        }
    }

    fn traverse_mut<'a, Q>(node: &'a mut Node<K, V>, key: &Q) -> Option<&'a mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match node.search(key) {
            Ok(idx) => Some(node.value_mut(idx)),
            Err(idx) => match node.node_type() {
                NodeType::Leaf => None,
                NodeType::Internal => Self::traverse_mut(node.child_mut(idx), key),
            },
        }
    }

    /// Removes a key from the map, returning the previous value at the key if it exists.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes a key from the map, returning the stored key and value if the key
    /// was in the map.
    ///
    /// Removing an absent key leaves the tree exactly as it was.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        // The descent rebalances nodes as it goes, which is only worth doing when
        // there is an entry to remove.
        if !self.contains_key(key) {
            return None;
        }
        self.remove_target(Target::Key(key))
    }

    /// Removes and returns the first element in the map. The key of this element is the minimum
    /// key that was in the map.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.remove_target(Target::<K>::Min)
    }

    /// Removes and returns the last element in the map. The key of this element is the maximum
    /// key that was in the map.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.remove_target(Target::<K>::Max)
    }

    fn remove_target<Q>(&mut self, target: Target<'_, Q>) -> Option<Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if self.is_empty() {
            return None;
        }

        let b = self.degree();
        let removed = Self::remove_helper(&mut self.root, target, b);
        if removed.is_some() {
            self.length -= 1;
        }

        if self.root.entries_len() == 0 && !self.root.is_leaf() {
            // The root's last entry was merged into its only remaining child.
            // That child becomes the new root.
            let new_root = self
                .root
                .pop_child()
                .expect("An internal node must have children.");
            debug_assert_eq!(self.root.children_len(), 0);

            self.root = new_root;
            trace!(height = self.height(), "collapsed the root");
        }

        removed
    }

    /// A helper method for recursively removing an entry from the B-tree.
    ///
    /// Unless `node` is the root, it holds at least `b` entries, so one can be
    /// removed from it without it needing to be merged into a sibling.
    fn remove_helper<Q>(
        node: &mut Node<K, V>,
        target: Target<'_, Q>,
        b: usize,
    ) -> Option<Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match (node.node_type(), target.locate(node)) {
            // Case 1: The node is a leaf node and the key exists in it.
            // This is the simplest case. The key is removed from the leaf.
            (NodeType::Leaf, Ok(idx)) => Some(node.remove_entry(idx)),
            // Key not found.
            (NodeType::Leaf, Err(_)) => None,
            // Case 2: The node is an internal node and the key exists in it.
            (NodeType::Internal, Ok(idx)) => Some(Self::remove_existing(node, idx, target, b)),
            // Case 3: The node is an internal node and the key does NOT exist in it.
            (NodeType::Internal, Err(idx)) => Self::remove_absent(node, idx, target, b),
        }
    }

    /// Removes the entry at `idx` of the internal `node`, returning it.
    fn remove_existing<Q>(
        node: &mut Node<K, V>,
        idx: usize,
        target: Target<'_, Q>,
        b: usize,
    ) -> Entry<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if node.child(idx).can_remove_entry_without_merging(b) {
            // Case 2.a: A key can be removed from the left child without merging.
            //
            //                       parent
            //                  [..., key, ...]
            //                       /   \
            //            [left child]   [...]
            //           /            \
            //        [...]         [..., key predecessor]
            //
            // In this case, we remove the key's predecessor from the left child's
            // subtree and put it in place of `key`.
            let predecessor = Self::descend::<K>(node, idx, Target::Max, b)
                .expect("A non-empty subtree has a maximum");
            return node.swap_entry(idx, predecessor);
        }

        if node.child(idx + 1).can_remove_entry_without_merging(b) {
            // Case 2.b: A key can be removed from the right child without merging.
            //
            //                       parent
            //                  [..., key, ...]
            //                       /   \
            //                   [...]   [right child]
            //                          /             \
            //              [key successor, ...]     [...]
            //
            // Symmetric to 2.a, with the key's successor.
            let successor = Self::descend::<K>(node, idx + 1, Target::Min, b)
                .expect("A non-empty subtree has a minimum");
            return node.swap_entry(idx, successor);
        }

        // Case 2.c: Both the left and right child are at their minimum sizes.
        //
        //                       parent
        //                  [..., key, ...]
        //                       /   \
        //            [left child]   [right child]
        //
        // In this case, we merge (left child, key, right child) into a single
        // node of 2b - 1 entries and recurse on it to delete `key`.
        //
        // If `parent` becomes empty (which can only happen if it's the root),
        // the merged child becomes the new root once the removal is done.
        debug_assert!(node.child(idx).at_minimum(b));
        debug_assert!(node.child(idx + 1).at_minimum(b));

        let median_idx = node.merge_children(idx);
        debug_assert_eq!(target.locate(node.child(idx)), Ok(median_idx));

        Self::descend(node, idx, target, b).expect("The merged child holds the key")
    }

    /// Removes the target from the subtree of `node` at child `idx`, first making
    /// sure that child can lose an entry.
    fn remove_absent<Q>(
        node: &mut Node<K, V>,
        idx: usize,
        target: Target<'_, Q>,
        b: usize,
    ) -> Option<Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if node.child(idx).can_remove_entry_without_merging(b) {
            // The child has enough entries. Recurse to delete the key from it.
            return Self::descend(node, idx, target, b);
        }

        // An entry can't be removed from the child without merging.
        // See if it has a sibling that can lend one.
        let left_len = (idx > 0).then(|| node.child(idx - 1).entries_len());
        let right_len = (idx < node.entries_len()).then(|| node.child(idx + 1).entries_len());

        // Borrow from the sibling with more entries. A tie goes to the right sibling.
        let from_left = left_len > right_len;
        let max_len = if from_left { left_len } else { right_len };

        if max_len.is_some_and(|len| len > b - 1) {
            // Case 3.a: rotate an entry from the sibling through the parent.
            if from_left {
                node.rotate_from_left(idx);
            } else {
                node.rotate_from_right(idx);
            }
            return Self::descend(node, idx, target, b);
        }

        // Case 3.b: Both the left and right siblings are at their minimum sizes.
        if idx > 0 {
            // Merge child into left sibling if it exists.
            node.merge_children(idx - 1);
            Self::descend(node, idx - 1, target, b)
        } else {
            // Merge the right sibling into child.
            node.merge_children(idx);
            Self::descend(node, idx, target, b)
        }
    }

    /// Recurses into child `idx` of `node`.
    fn descend<Q>(
        node: &mut Node<K, V>,
        idx: usize,
        target: Target<'_, Q>,
        b: usize,
    ) -> Option<Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let child = node.child_mut(idx);
        debug_assert!(
            child.can_remove_entry_without_merging(b),
            "descending into a node with {} entries, fewer than {b}",
            child.entries_len()
        );

        let removed = Self::remove_helper(child, target, b);

        debug_assert!(
            child.entries_len() >= b - 1,
            "removal left a node with {} entries, fewer than {}",
            child.entries_len(),
            b - 1
        );
        removed
    }

    /// Walks the whole tree and panics on the first broken invariant: fill
    /// bounds, key order within and across nodes, leaf depth, and the element
    /// count.
    pub fn validate(&self) {
        let (count, _) = self.root.validate(self.degree(), true, None, None);
        assert_eq!(
            count, self.length,
            "the tree holds {count} entries but its length is {}",
            self.length
        );
    }
}

impl<K, V> Default for BTreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> Extend<(K, V)> for BTreeMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.put_all(iter);
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for BTreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.put_all(iter);
        map
    }
}

impl<'a, K, V> IntoIterator for &'a BTreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for BTreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Prints the keys of the tree one level per line, each node in brackets.
///
/// ```text
/// [3, 6]
/// [1, 2] [4, 5] [7, 8, 9]
/// ```
impl<K: fmt::Display, V> fmt::Display for BTreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut level = vec![&*self.root];
        while !level.is_empty() {
            let mut next_level = Vec::new();
            for (i, node) in level.into_iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                f.write_str("[")?;
                for (j, (key, _)) in node.entries().iter().enumerate() {
                    if j > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}")?;
                }
                f.write_str("]")?;
                next_level.extend((0..node.children_len()).map(move |c| node.child(c)));
            }
            writeln!(f)?;
            level = next_level;
        }
        Ok(())
    }
}
