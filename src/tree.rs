use crate::compare::{Compare, Natural};
use crate::cursor::{InfixCursor, InfixCursorMut, Iter, IterMut, Keys, Values};
use crate::error::{Error, Result};
use crate::node::Node;
use crate::path::Path;
use crate::DEFAULT_ORDER;
use std::{cmp::Ordering, fmt, mem};

/// B-tree map of order `t`, ordered by a comparator `C`.
///
/// Every node holds at most `2t - 1` pairs and every node except the root at least `t - 1`,
/// and all leaves are at the same depth.
///
/// General guide to implementation:
///
/// The tree owns an optional root `Node`; each node owns its children. Operations start
/// by building a `Path` (see the `path` module) from the root to the key, then walk that path
/// bottom-up: insertion splits full nodes and pushes medians upwards, deletion swaps an
/// internal key with its predecessor and then borrows from or merges with siblings.
pub struct BTree<K, V, C = Natural> {
    t: usize,
    len: usize,
    root: Option<Box<Node<K, V>>>,
    cmp: C,
}

impl<K, V> BTree<K, V, Natural> {
    /// Returns a new, empty tree of order `t` using the natural key order.
    ///
    /// Fails with [`Error::InvalidOrder`] if `t < 2` or `t` is too large to allocate nodes for.
    pub fn new(t: usize) -> Result<Self> {
        Self::with_comparator(t, Natural)
    }
}

impl<K, V> Default for BTree<K, V, Natural> {
    /// Empty tree of order [`DEFAULT_ORDER`].
    fn default() -> Self {
        Self {
            t: DEFAULT_ORDER,
            len: 0,
            root: None,
            cmp: Natural,
        }
    }
}

impl<K, V, C> BTree<K, V, C> {
    /// Returns a new, empty tree of order `t` ordered by `cmp`.
    ///
    /// Fails with [`Error::InvalidOrder`] if `t < 2`, or if `t` is so large that a node
    /// of `2t - 1` pairs cannot be laid out in memory.
    pub fn with_comparator(t: usize, cmp: C) -> Result<Self> {
        if t < 2 || !Node::<K, V>::order_fits(t) {
            return Err(Error::InvalidOrder(t));
        }
        Ok(Self {
            t,
            len: 0,
            root: None,
            cmp,
        })
    }

    /// The order `t` of the tree.
    #[must_use]
    pub fn order(&self) -> usize {
        self.t
    }

    /// Maximum number of pairs in a node, `2t - 1`.
    #[must_use]
    pub fn max_keys(&self) -> usize {
        2 * self.t - 1
    }

    /// Minimum number of pairs in a node other than the root, `t - 1`.
    #[must_use]
    pub fn min_keys(&self) -> usize {
        self.t - 1
    }

    /// Get number of key-value pairs in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Is the tree empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels, 0 for an empty tree.
    #[must_use]
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut node = self.root.as_deref();
        while let Some(n) = node {
            height += 1;
            node = n.children.first().map(|c| &**c);
        }
        height
    }

    /// The comparator ordering the keys.
    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    /// Remove all pairs, releasing every node.
    pub fn clear(&mut self) {
        self.len = 0;
        self.root = None;
    }

    /// Move the contents out into a new tree with the same order and comparator,
    /// leaving `self` empty.
    pub fn take(&mut self) -> Self
    where
        C: Clone,
    {
        Self {
            t: self.t,
            len: mem::take(&mut self.len),
            root: self.root.take(),
            cmp: self.cmp.clone(),
        }
    }

    /// Cursor at the smallest key.
    #[must_use]
    pub fn begin_infix(&self) -> InfixCursor<'_, K, V> {
        InfixCursor::new(self.root.as_deref())
    }

    /// Exhausted cursor, equal to any cursor that has moved past the largest key.
    #[must_use]
    pub fn end_infix(&self) -> InfixCursor<'_, K, V> {
        InfixCursor::new(None)
    }

    /// Cursor at the smallest key that permits value mutation.
    pub fn begin_infix_mut(&mut self) -> InfixCursorMut<'_, K, V> {
        InfixCursorMut::new(self.root.as_deref_mut())
    }

    /// Get iterator of references to key-value pairs in ascending key order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.begin_infix(), self.len)
    }

    /// Get iterator of mutable references to values, in ascending key order.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let len = self.len;
        IterMut::new(self.begin_infix_mut(), len)
    }

    /// Get iterator of references to keys.
    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(self.iter())
    }

    /// Get iterator of references to values.
    #[must_use]
    pub fn values(&self) -> Values<'_, K, V> {
        Values(self.iter())
    }

    /// Get references to first key and value.
    #[must_use]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.begin_infix().get().map(|(_, _, k, v)| (k, v))
    }

    /// Get references to last key and value.
    #[must_use]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let mut node = self.root.as_deref()?;
        while let Some(last) = node.children.last() {
            node = &**last;
        }
        node.pairs.last().map(|(k, v)| (k, v))
    }
}

impl<K, V, C: Compare<K>> BTree<K, V, C> {
    fn locate(&self, key: &K) -> Path {
        Path::locate(self.root.as_deref(), key, &self.cmp)
    }

    /// Insert a key-value pair.
    ///
    /// Fails with [`Error::DuplicateKey`] if the key is already present, in which case
    /// the tree is unchanged.
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        let path = self.locate(&key);
        let Some(root) = self.root.as_deref_mut() else {
            let mut leaf = Node::leaf(self.t);
            leaf.insert_at(0, (key, value), None);
            self.root = Some(leaf);
            self.len = 1;
            log::trace!("created root leaf, order {}", self.t);
            return Ok(());
        };
        let mut at = match path.last().index {
            Ok(_) => return Err(Error::DuplicateKey),
            Err(at) => at,
        };

        let (mut pair, mut right) = ((key, value), None);
        let mut depth = path.len() - 1;
        let grown = loop {
            let node = path.node_mut(root, depth);
            if !node.is_full() {
                node.insert_at(at, pair, right);
                break None;
            }
            let (med, sibling) = node.split(at, pair, right);
            if depth == 0 {
                break Some((med, sibling));
            }
            at = path.child_index(depth);
            depth -= 1;
            (pair, right) = (med, Some(sibling));
        };

        if let Some((med, sibling)) = grown {
            if let Some(old) = self.root.take() {
                self.root = Some(Node::new_root(self.t, old, med, sibling));
                log::debug!("root split, height now {}", self.height());
            }
        }
        self.len += 1;
        Ok(())
    }

    /// Replace the value for an existing key, returning the old value.
    ///
    /// A missing key is logged as a warning and reported as [`Error::KeyNotFound`];
    /// nothing is written.
    pub fn update(&mut self, key: &K, value: V) -> Result<V> {
        match self.obtain_mut(key) {
            Ok(v) => Ok(mem::replace(v, value)),
            Err(e) => {
                log::warn!("key for update was not found");
                Err(e)
            }
        }
    }

    /// Get reference to the value corresponding to the key.
    pub fn obtain(&self, key: &K) -> Result<&V> {
        let path = self.locate(key);
        match (path.last().index, self.root.as_deref()) {
            (Ok(i), Some(root)) => Ok(&path.node(root, path.len() - 1).pairs[i].1),
            _ => Err(Error::KeyNotFound),
        }
    }

    /// Get a mutable reference to the value corresponding to the key.
    pub fn obtain_mut(&mut self, key: &K) -> Result<&mut V> {
        let path = self.locate(key);
        match (path.last().index, self.root.as_deref_mut()) {
            (Ok(i), Some(root)) => Ok(&mut path.node_mut(root, path.len() - 1).pairs[i].1),
            _ => Err(Error::KeyNotFound),
        }
    }

    /// Does the tree have an entry for the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.locate(key).last().index.is_ok()
    }

    /// Remove a key, returning its value.
    ///
    /// Fails with [`Error::KeyNotFound`] if the key is absent, in which case the tree is unchanged.
    pub fn dispose(&mut self, key: &K) -> Result<V> {
        let mut path = self.locate(key);
        let (Ok(found), Some(root)) = (path.last().index, self.root.as_deref_mut()) else {
            return Err(Error::KeyNotFound);
        };

        let depth = path.len() - 1;
        let (_, value) = if path.node(root, depth).is_leaf() {
            path.node_mut(root, depth).remove_at(found)
        } else {
            path.descend_to_predecessor(root);
            let pred = path.node_mut(root, path.len() - 1).remove_last();
            path.node_mut(root, depth).replace(found, pred)
        };
        rebalance(root, &path, self.t - 1)?;

        if self.root.as_ref().is_some_and(|r| r.len() == 0) {
            self.root = self.root.take().and_then(|mut r| r.children.pop());
            log::debug!("root collapsed, height now {}", self.height());
        }
        self.len -= 1;
        Ok(value)
    }

    /// Pairs with keys between `lower` and `upper` in ascending order. Each bound is
    /// included or excluded according to its flag.
    ///
    /// Scans from the smallest key and stops at the first key past `upper`.
    pub fn obtain_between(
        &self,
        lower: &K,
        upper: &K,
        lower_inclusive: bool,
        upper_inclusive: bool,
    ) -> Vec<(&K, &V)> {
        let mut range = Vec::new();
        let mut cursor = self.begin_infix();
        while let Some((_, _, k, v)) = cursor.get() {
            match self.cmp.compare(k, upper) {
                Ordering::Greater => break,
                Ordering::Equal if !upper_inclusive => break,
                _ => {}
            }
            match self.cmp.compare(k, lower) {
                Ordering::Greater => range.push((k, v)),
                Ordering::Equal if lower_inclusive => range.push((k, v)),
                _ => {}
            }
            cursor.advance();
        }
        range
    }

    /// Check the tree invariants, panicking if any is broken.
    #[cfg(test)]
    pub(crate) fn check(&self) {
        fn walk<K, V>(
            n: &Node<K, V>,
            depth: usize,
            leaf_depth: &mut Option<usize>,
            t: usize,
            is_root: bool,
        ) -> usize {
            assert!(n.len() <= 2 * t - 1, "node overflow");
            if !is_root {
                assert!(n.len() >= t - 1, "node underflow");
            }
            assert!(n.len() > 0, "empty node");
            if n.is_leaf() {
                match leaf_depth {
                    Some(d) => assert_eq!(*d, depth, "leaves at different depths"),
                    None => *leaf_depth = Some(depth),
                }
                return n.len();
            }
            assert_eq!(n.children.len(), n.len() + 1, "child count");
            let mut count = n.len();
            for c in n.children.iter() {
                count += walk(c, depth + 1, leaf_depth, t, false);
            }
            count
        }
        let Some(root) = self.root.as_deref() else {
            assert_eq!(self.len, 0);
            return;
        };
        let count = walk(root, 0, &mut None, self.t, true);
        assert_eq!(count, self.len, "len mismatch");

        let mut prev: Option<&K> = None;
        for (k, _) in self.iter() {
            if let Some(p) = prev {
                assert_eq!(self.cmp.compare(p, k), Ordering::Less, "keys out of order");
            }
            prev = Some(k);
        }
    }
}

/// Restore minimum occupancy along `path` after a removal from its last node.
///
/// Works upwards: borrow from a sibling with spare pairs and stop, otherwise merge
/// with a sibling and continue with the parent.
fn rebalance<K, V>(root: &mut Node<K, V>, path: &Path, min: usize) -> Result<()> {
    let mut depth = path.len() - 1;
    while depth > 0 && path.node(root, depth).len() < min {
        let pos = path.child_index(depth);
        let parent = path.node_mut(root, depth - 1);
        if pos > 0 && parent.children[pos - 1].len() > min {
            parent.borrow_from_left(pos);
            return Ok(());
        }
        if pos < parent.len() && parent.children[pos + 1].len() > min {
            parent.borrow_from_right(pos);
            return Ok(());
        }
        parent.merge_children(pos.saturating_sub(1))?;
        log::trace!("merged children at depth {}", depth);
        depth -= 1;
    }
    Ok(())
}

impl<K: Clone, V: Clone, C: Clone> Clone for BTree<K, V, C> {
    /// Deep copy: the clone shares no nodes with the original.
    fn clone(&self) -> Self {
        Self {
            t: self.t,
            len: self.len,
            root: self.root.clone(),
            cmp: self.cmp.clone(),
        }
    }
}

impl<K: PartialEq, V: PartialEq, C> PartialEq for BTree<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, C> Eq for BTree<K, V, C> {}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for BTree<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, C> IntoIterator for &'a BTree<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, C> IntoIterator for &'a mut BTree<K, V, C> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;
    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

#[cfg(feature = "serde")]
use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize,
};

#[cfg(feature = "serde")]
impl<K, V, C> Serialize for BTree<K, V, C>
where
    K: Serialize,
    V: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
struct BTreeVisitor<K, V, C> {
    marker: std::marker::PhantomData<fn() -> BTree<K, V, C>>,
}

#[cfg(feature = "serde")]
impl<'de, K, V, C> Visitor<'de> for BTreeVisitor<K, V, C>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
    C: Compare<K> + Default,
{
    type Value = BTree<K, V, C>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map with unique keys")
    }

    fn visit_map<M>(self, mut access: M) -> std::result::Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut tree = BTree::with_comparator(DEFAULT_ORDER, C::default())
            .map_err(serde::de::Error::custom)?;
        while let Some((key, value)) = access.next_entry()? {
            tree.insert(key, value).map_err(serde::de::Error::custom)?;
        }
        Ok(tree)
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, C> Deserialize<'de> for BTree<K, V, C>
where
    K: Deserialize<'de>,
    V: Deserialize<'de>,
    C: Compare<K> + Default,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(BTreeVisitor {
            marker: std::marker::PhantomData,
        })
    }
}
