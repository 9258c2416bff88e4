use super::{node::Node, BTreeMap};
use std::iter::FusedIterator;

/// An indicator of the current position in the map.
enum Cursor<'a, K, V> {
    Node(&'a Node<K, V>),
    Position { node: &'a Node<K, V>, next: Index },
}

/// An index into a node's child or entry.
enum Index {
    Child(usize),
    Entry(usize),
}

/// An iterator over the entries of a [`BTreeMap`], sorted by key.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K, V> {
    // A stack of cursors indicating the current position in the tree.
    cursors: Vec<Cursor<'a, K, V>>,

    // The number of entries not yet yielded.
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(map: &'a BTreeMap<K, V>) -> Self {
        Self {
            // Initialize the cursors with the root of the map.
            cursors: vec![Cursor::Node(map.root())],
            remaining: map.len(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.cursors.pop()? {
                Cursor::Node(node) => {
                    self.cursors.push(Cursor::Position {
                        next: if node.is_leaf() {
                            // Iterate on leaf nodes starting from the first entry.
                            Index::Entry(0)
                        } else {
                            // Iterate on internal nodes starting from the first child.
                            Index::Child(0)
                        },
                        node,
                    });
                }

                Cursor::Position {
                    node,
                    next: Index::Child(child_idx),
                } => {
                    // After iterating on the child, iterate on the next _entry_ in this node.
                    // The entry immediately after the child has the same index as the child's.
                    self.cursors.push(Cursor::Position {
                        node,
                        next: Index::Entry(child_idx),
                    });

                    // Add the child to the top of the cursors to be iterated on first.
                    self.cursors.push(Cursor::Node(node.child(child_idx)));
                }

                Cursor::Position {
                    node,
                    next: Index::Entry(entry_idx),
                } => {
                    if entry_idx >= node.entries_len() {
                        // No more entries to iterate on in this node.
                        continue;
                    }

                    self.cursors.push(Cursor::Position {
                        next: if node.is_leaf() {
                            Index::Entry(entry_idx + 1)
                        } else {
                            Index::Child(entry_idx + 1)
                        },
                        node,
                    });

                    self.remaining -= 1;
                    return Some(node.entry(entry_idx));
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// An iterator over the keys of a [`BTreeMap`], in ascending order.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Keys<'a, K, V>(Iter<'a, K, V>);

impl<'a, K, V> From<Iter<'a, K, V>> for Keys<'a, K, V> {
    fn from(iter: Iter<'a, K, V>) -> Self {
        Self(iter)
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// An iterator over the values of a [`BTreeMap`], in the order of their keys.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Values<'a, K, V>(Iter<'a, K, V>);

impl<'a, K, V> From<Iter<'a, K, V>> for Values<'a, K, V> {
    fn from(iter: Iter<'a, K, V>) -> Self {
        Self(iter)
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
