use crate::compare::Compare;
use crate::node::Node;

/// Stack vector, large enough for the path of any tree: even at order 2 a tree of
/// height 64 would hold at least 2^64 - 1 keys.
pub(crate) type StkVec<T> = arrayvec::ArrayVec<T, 64>;

/// The owner of a node on a [`Path`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    /// The tree's root.
    Root,
    /// Child `index` of the node at path depth `parent`.
    Child { parent: usize, index: usize },
}

/// One step of a [`Path`].
///
/// `index` is `Ok(i)` when the key sits at pair `i` of the node, otherwise `Err(i)` where
/// `i` is where the key would be inserted, which is also the child the search continued into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PathEntry {
    pub slot: Slot,
    pub index: Result<usize, usize>,
}

/// Route from the root to a key, or to the place the key belongs.
#[derive(Debug)]
pub(crate) struct Path {
    entries: StkVec<PathEntry>,
}

impl Path {
    /// Binary search each node from the root down, stopping at a match or after a leaf.
    ///
    /// An empty tree gives a single `Root` entry with index `Err(0)`: the key becomes the new root.
    pub fn locate<K, V, C>(root: Option<&Node<K, V>>, key: &K, cmp: &C) -> Self
    where
        C: Compare<K>,
    {
        let mut entries = StkVec::new();
        let mut slot = Slot::Root;
        let Some(mut node) = root else {
            entries.push(PathEntry {
                slot,
                index: Err(0),
            });
            return Self { entries };
        };
        loop {
            let index = node.search(key, cmp);
            entries.push(PathEntry { slot, index });
            match index {
                Err(child) if !node.is_leaf() => {
                    slot = Slot::Child {
                        parent: entries.len() - 1,
                        index: child,
                    };
                    node = &*node.children[child];
                }
                _ => break,
            }
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The deepest entry.
    pub fn last(&self) -> &PathEntry {
        &self.entries[self.entries.len() - 1]
    }

    /// Index of the node at `depth` within its parent (0 for the root).
    pub fn child_index(&self, depth: usize) -> usize {
        match self.entries[depth].slot {
            Slot::Root => 0,
            Slot::Child { index, .. } => index,
        }
    }

    /// The node owned by the slot at `depth`.
    pub fn node<'a, K, V>(&self, root: &'a Node<K, V>, depth: usize) -> &'a Node<K, V> {
        let mut node = root;
        for (d, entry) in self.entries[..=depth].iter().enumerate().skip(1) {
            if let Slot::Child { parent, index } = entry.slot {
                debug_assert_eq!(parent + 1, d);
                node = &*node.children[index];
            }
        }
        node
    }

    /// The node owned by the slot at `depth`, mutably.
    pub fn node_mut<'a, K, V>(&self, root: &'a mut Node<K, V>, depth: usize) -> &'a mut Node<K, V> {
        let mut node = root;
        for (d, entry) in self.entries[..=depth].iter().enumerate().skip(1) {
            if let Slot::Child { parent, index } = entry.slot {
                debug_assert_eq!(parent + 1, d);
                node = &mut *node.children[index];
            }
        }
        node
    }

    /// Turn a match in an internal node into a descent to its in-order predecessor.
    ///
    /// The found entry becomes `Err(i)` (descend into child `i`), then entries are pushed
    /// down the rightmost edge of that subtree. The new last entry is `Ok` at the last
    /// pair of a leaf.
    pub fn descend_to_predecessor<K, V>(&mut self, root: &Node<K, V>) {
        let depth = self.entries.len() - 1;
        let Ok(found) = self.entries[depth].index else {
            return;
        };
        self.entries[depth].index = Err(found);
        let mut node: &Node<K, V> = &self.node(root, depth).children[found];
        let mut slot = Slot::Child {
            parent: depth,
            index: found,
        };
        loop {
            let last = node.len();
            if node.is_leaf() {
                self.entries.push(PathEntry {
                    slot,
                    index: Ok(last - 1),
                });
                return;
            }
            self.entries.push(PathEntry {
                slot,
                index: Err(last),
            });
            slot = Slot::Child {
                parent: self.entries.len() - 1,
                index: last,
            };
            node = &*node.children[last];
        }
    }
}
