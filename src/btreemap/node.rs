use std::borrow::Borrow;
use std::cmp::Ordering;


#[derive(Debug, PartialEq, Copy, Clone, Eq)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum NodeType {
    Leaf,
    Internal,
}

/// A key/value pair stored in a node. Entries are ordered by key only.
pub type Entry<K, V> = (K, V);

/// A node of a B-Tree with minimum degree `b`.
///
/// Nodes do not store their degree; every method that depends on the fill
/// bounds receives it from the owning map.
#[derive(Debug)]
pub struct Node<K, V> {
    // Sorted by key. At most `2b - 1` entries.
    entries: Vec<Entry<K, V>>,
    // For the entry at position I, children[I] holds the keys smaller than it and
    // children[I + 1] the keys greater than it. Empty for leaves.
    children: Vec<Box<Node<K, V>>>,
    node_type: NodeType,
}

impl<K, V> Node<K, V> {
    /// Creates an empty node with room for a full node of minimum degree `b`.
    pub fn new(node_type: NodeType, b: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity(b)),
            children: match node_type {
                NodeType::Leaf => Vec::new(),
                NodeType::Internal => Vec::with_capacity(capacity(b) + 1),
            },
            node_type,
        }
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn is_leaf(&self) -> bool {
        self.node_type == NodeType::Leaf
    }

    /// Searches for the key in the node's entries.
    ///
    /// If the key is found then `Result::Ok` is returned, containing the index
    /// of the matching key. If the key is not found then `Result::Err` is
    /// returned, containing the index where a matching key could be inserted
    /// while maintaining sorted order. For internal nodes that index is also
    /// the child whose subtree would hold the key.
    pub fn search<Q>(&self, key: &Q) -> Result<usize, usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.entries.binary_search_by(|(k, _)| k.borrow().cmp(key))
    }

    /// Returns the number of entries in the node.
    pub fn entries_len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the number of children in the node.
    pub fn children_len(&self) -> usize {
        self.children.len()
    }

    /// Returns true if the node cannot store anymore entries, false otherwise.
    pub fn is_full(&self, b: usize) -> bool {
        self.entries.len() >= capacity(b)
    }

    /// Returns true if the node is at the minimum required size, false otherwise.
    pub fn at_minimum(&self, b: usize) -> bool {
        self.entries.len() < b
    }

    /// Returns true if an entry can be removed without having to merge it into another node
    /// (i.e. without going below the minimum size of a node).
    pub fn can_remove_entry_without_merging(&self, b: usize) -> bool {
        !self.at_minimum(b)
    }

    pub fn key(&self, idx: usize) -> &K {
        &self.entries[idx].0
    }

    pub fn value(&self, idx: usize) -> &V {
        &self.entries[idx].1
    }

    pub fn value_mut(&mut self, idx: usize) -> &mut V {
        &mut self.entries[idx].1
    }

    pub fn entry(&self, idx: usize) -> (&K, &V) {
        let (k, v) = &self.entries[idx];
        (k, v)
    }

    pub fn entries(&self) -> &[Entry<K, V>] {
        &self.entries
    }

    pub fn child(&self, idx: usize) -> &Node<K, V> {
        &self.children[idx]
    }

    pub fn child_mut(&mut self, idx: usize) -> &mut Node<K, V> {
        &mut self.children[idx]
    }

    /// Inserts the given child at the given index.
    pub fn insert_child(&mut self, idx: usize, child: Box<Node<K, V>>) {
        debug_assert_eq!(self.node_type, NodeType::Internal);
        self.children.insert(idx, child)
    }

    /// Pushes the child to the far right of the node.
    pub fn push_child(&mut self, child: Box<Node<K, V>>) {
        debug_assert_eq!(self.node_type, NodeType::Internal);
        self.children.push(child)
    }

    /// Removes the child at the given index.
    pub fn remove_child(&mut self, idx: usize) -> Box<Node<K, V>> {
        self.children.remove(idx)
    }

    /// Pops the right-most child of the node.
    pub fn pop_child(&mut self) -> Option<Box<Node<K, V>>> {
        self.children.pop()
    }

    /// Inserts a new entry at the specified index.
    pub fn insert_entry(&mut self, idx: usize, entry: Entry<K, V>) {
        self.entries.insert(idx, entry);
    }

    /// Removes the entry at the specified index.
    pub fn remove_entry(&mut self, idx: usize) -> Entry<K, V> {
        self.entries.remove(idx)
    }

    /// Adds a new entry at the back of the node.
    pub fn push_entry(&mut self, entry: Entry<K, V>) {
        self.entries.push(entry);
    }

    /// Removes an entry from the back of the node.
    pub fn pop_entry(&mut self) -> Option<Entry<K, V>> {
        self.entries.pop()
    }

    /// Swaps the entry at index `idx` with the given entry, returning the old entry.
    pub fn swap_entry(&mut self, idx: usize, entry: Entry<K, V>) -> Entry<K, V> {
        std::mem::replace(&mut self.entries[idx], entry)
    }

    /// Overwrites the value at index `idx`, returning the previous value.
    pub fn replace_value(&mut self, idx: usize, value: V) -> V {
        std::mem::replace(&mut self.entries[idx].1, value)
    }

    /// Returns the entry with min key in the subtree.
    ///
    /// PRECONDITION: the subtree is not empty.
    pub fn get_min(&self) -> (&K, &V) {
        match self.node_type {
            NodeType::Leaf => self.entry(0),
            NodeType::Internal => self.children[0].get_min(),
        }
    }

    /// Returns the entry with the max key in the subtree.
    ///
    /// PRECONDITION: the subtree is not empty.
    pub fn get_max(&self) -> (&K, &V) {
        match self.node_type {
            NodeType::Leaf => self.entry(self.entries.len() - 1),
            NodeType::Internal => self
                .children
                .last()
                .expect("An internal node must have children.")
                .get_max(),
        }
    }

    /// Moves the entries and children above the median into a new sibling and
    /// returns the median entry together with that sibling.
    ///
    /// ```text
    ///   [ 1  2  3  4  5 ]   (b = 3)
    /// ```
    ///
    /// becomes `[ 1  2 ]`, median `3`, sibling `[ 4  5 ]`.
    pub fn split(&mut self, b: usize) -> (Entry<K, V>, Node<K, V>) {
        debug_assert!(self.is_full(b));

        let mut sibling = Node::new(self.node_type, b);
        sibling.entries.extend(self.entries.drain(b..));
        if self.node_type == NodeType::Internal {
            sibling.children.extend(self.children.drain(b..));
        }

        let median = self
            .pop_entry()
            .expect("An initially full node cannot be empty");

        debug_assert_eq!(self.entries.len(), b - 1);
        debug_assert_eq!(sibling.entries.len(), b - 1);
        (median, sibling)
    }

    /// Takes as input the index of a full child and splits it into two, promoting
    /// its median into this node.
    ///
    /// Example:
    /// ```text
    ///                          [ ... M   Y ... ]
    ///                                  |
    ///                        [ P  Q  R  S  T ]
    /// ```
    ///
    /// After splitting becomes:
    /// ```text
    ///                         [ ... M  R  Y ... ]
    ///                                 / \
    ///                         [ P  Q ]   [ S  T ]
    /// ```
    pub fn split_child(&mut self, full_child_idx: usize, b: usize) {
        // The node must not be full.
        debug_assert!(!self.is_full(b));

        let (median, sibling) = self.children[full_child_idx].split(b);
        self.insert_child(full_child_idx + 1, Box::new(sibling));
        self.insert_entry(full_child_idx, median);
    }

    /// Merges the entries and children of the `source` node into self, along with the median entry.
    ///
    /// PRECONDITION:
    ///   * `self` and `source` are of the same node type.
    ///   * keys of `self` < median < keys of `source`
    ///
    /// POSTCONDITION:
    ///   * all the entries of `source`, as well as the median, are appended to `self`.
    pub fn merge(&mut self, mut source: Node<K, V>, median: Entry<K, V>)
    where
        K: Ord,
    {
        debug_assert_eq!(self.node_type, source.node_type);
        debug_assert!(self.entries.last().map_or(true, |(k, _)| k < &median.0));
        debug_assert!(source.entries.first().map_or(true, |(k, _)| &median.0 < k));

        self.entries.push(median);
        self.entries.append(&mut source.entries);
        // Move the children (if any exist).
        self.children.append(&mut source.children);
    }

    /// Merges the children at `idx` and `idx + 1`, pulling down the entry that
    /// separates them. Returns the position of the pulled-down entry inside the
    /// merged child, which stays at index `idx`.
    ///
    /// ```text
    ///                [ ... 3 ... ]                      [ ... ... ]
    ///                     / \            becomes             |
    ///               [ 1 2 ]  [ 4 5 ]                   [ 1 2 3 4 5 ]
    /// ```
    pub fn merge_children(&mut self, idx: usize) -> usize
    where
        K: Ord,
    {
        let right = self.children.remove(idx + 1);
        let median = self.entries.remove(idx);

        let left = &mut self.children[idx];
        let median_idx = left.entries_len();
        left.merge(*right, median);
        median_idx
    }

    /// Moves the last entry of the child at `idx - 1` up into this node and the
    /// separating entry down to the front of the child at `idx`.
    ///
    /// ```text
    ///                            [d] (parent)
    ///                           /   \
    ///  (left sibling) [a, b, c]     [e, f] (child)
    ///                         \
    ///                         [c']
    /// ```
    ///
    /// becomes:
    ///
    /// ```text
    ///                            [c] (parent)
    ///                           /   \
    ///       (left sibling) [a, b]   [d, e, f] (child)
    ///                              /
    ///                            [c']
    /// ```
    pub fn rotate_from_left(&mut self, idx: usize) {
        let left_sibling = &mut self.children[idx - 1];
        let lifted = left_sibling
            .pop_entry()
            .expect("A sibling that lends an entry cannot be empty");
        let last_child = left_sibling.pop_child();

        let lowered = self.swap_entry(idx - 1, lifted);

        let child = &mut self.children[idx];
        child.insert_entry(0, lowered);
        match last_child {
            Some(last_child) => {
                debug_assert_eq!(child.node_type, NodeType::Internal);
                child.insert_child(0, last_child);
            }
            None => debug_assert_eq!(child.node_type, NodeType::Leaf),
        }
    }

    /// Moves the first entry of the child at `idx + 1` up into this node and the
    /// separating entry down to the back of the child at `idx`.
    pub fn rotate_from_right(&mut self, idx: usize) {
        let right_sibling = &mut self.children[idx + 1];
        let lifted = right_sibling.remove_entry(0);
        let first_child = match right_sibling.node_type {
            NodeType::Internal => Some(right_sibling.remove_child(0)),
            NodeType::Leaf => None,
        };

        let lowered = self.swap_entry(idx, lifted);

        let child = &mut self.children[idx];
        child.push_entry(lowered);
        if let Some(first_child) = first_child {
            debug_assert_eq!(child.node_type, NodeType::Internal);
            child.push_child(first_child);
        }
    }

    /// Returns true if any entry in the subtree holds `value`, visiting the
    /// subtree depth-first.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.entries.iter().any(|(_, v)| v == value)
            || self.children.iter().any(|child| child.contains_value(value))
    }

    /// Appends the keys of the subtree to `keys` in ascending order.
    pub fn collect_keys(&self, keys: &mut Vec<K>)
    where
        K: Clone,
    {
        match self.node_type {
            NodeType::Leaf => keys.extend(self.entries.iter().map(|(k, _)| k.clone())),
            NodeType::Internal => {
                for (child, (k, _)) in self.children.iter().zip(self.entries.iter()) {
                    child.collect_keys(keys);
                    keys.push(k.clone());
                }
                if let Some(last) = self.children.last() {
                    last.collect_keys(keys);
                }
            }
        }
    }

    /// Checks the structure of the subtree rooted at this node and returns the
    /// number of entries it holds and the depth of its leaves.
    ///
    /// `lower` and `upper` are the exclusive key bounds inherited from the
    /// ancestors. Panics on the first violated invariant.
    pub fn validate(
        &self,
        b: usize,
        is_root: bool,
        lower: Option<&K>,
        upper: Option<&K>,
    ) -> (usize, usize)
    where
        K: Ord,
    {
        let len = self.entries.len();
        assert!(len <= capacity(b), "node holds {len} entries, more than {}", capacity(b));
        if !is_root {
            assert!(len >= b - 1, "non-root node holds {len} entries, fewer than {}", b - 1);
        }

        for pair in self.entries.windows(2) {
            assert_eq!(pair[0].0.cmp(&pair[1].0), Ordering::Less, "node entries are not sorted");
        }
        if let (Some(lower), Some((first, _))) = (lower, self.entries.first()) {
            assert!(lower < first, "entry is not greater than its left separator");
        }
        if let (Some(upper), Some((last, _))) = (upper, self.entries.last()) {
            assert!(last < upper, "entry is not smaller than its right separator");
        }

        match self.node_type {
            NodeType::Leaf => {
                assert!(self.children.is_empty(), "leaf node has children");
                (len, 1)
            }
            NodeType::Internal => {
                assert!(len > 0, "internal node has no entries");
                assert_eq!(
                    self.children.len(),
                    len + 1,
                    "internal node has {len} entries but {} children",
                    self.children.len()
                );

                let mut total = len;
                let mut leaf_depth = None;
                for (i, child) in self.children.iter().enumerate() {
                    let child_lower = if i == 0 { lower } else { Some(self.key(i - 1)) };
                    let child_upper = if i == len { upper } else { Some(self.key(i)) };
                    let (count, depth) = child.validate(b, false, child_lower, child_upper);
                    total += count;
                    match leaf_depth {
                        None => leaf_depth = Some(depth),
                        Some(expected) => {
                            assert_eq!(expected, depth, "leaves are at different depths")
                        }
                    }
                }
                (total, leaf_depth.unwrap_or(0) + 1)
            }
        }
    }
}

/// The maximum number of entries per node of minimum degree `b`.
pub fn capacity(b: usize) -> usize {
    2 * b - 1
}
