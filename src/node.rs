use crate::compare::Compare;
use crate::error::{Error, Result};
use crate::vecs::FixedCapVec;
use std::mem;

type PairVec<K, V> = FixedCapVec<(K, V)>;
type ChildVec<K, V> = FixedCapVec<Box<Node<K, V>>>;

/// Node of a tree of order t.
///
/// `pairs` has capacity `2t - 1`. An internal node has `children` with capacity `2t`
/// and always holds `pairs.len() + 1` children. A leaf has a zero capacity `children`,
/// so a node never changes between leaf and internal.
#[derive(Debug, Clone)]
pub(crate) struct Node<K, V> {
    pub(crate) pairs: PairVec<K, V>,
    pub(crate) children: ChildVec<K, V>,
}

impl<K, V> Node<K, V> {
    pub fn leaf(t: usize) -> Box<Self> {
        Box::new(Self {
            pairs: PairVec::new(2 * t - 1),
            children: ChildVec::new(0),
        })
    }

    fn internal(t: usize) -> Box<Self> {
        Box::new(Self {
            pairs: PairVec::new(2 * t - 1),
            children: ChildVec::new(2 * t),
        })
    }

    /// Can nodes of order `t` be allocated? Both `2t - 1` pairs and `2t` children
    /// must have a representable layout.
    pub fn order_fits(t: usize) -> bool {
        t.checked_mul(2).is_some_and(|cap| {
            PairVec::<K, V>::fits(cap.saturating_sub(1)) && ChildVec::<K, V>::fits(cap)
        })
    }

    /// New root holding only `med`, with `left` and `right` as its children.
    pub fn new_root(t: usize, left: Box<Self>, med: (K, V), right: Box<Self>) -> Box<Self> {
        let mut root = Self::internal(t);
        root.pairs.push(med);
        root.children.push(left);
        root.children.push(right);
        root
    }

    /// Number of key-value pairs held.
    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.cap() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.pairs.is_full()
    }

    pub fn search<C>(&self, key: &K, cmp: &C) -> std::result::Result<usize, usize>
    where
        C: Compare<K>,
    {
        self.pairs.search(|(k, _)| cmp.compare(k, key))
    }

    /// Shift-insert `pair` at `at`. A subtree split off to the right of the pair goes
    /// immediately after it, at child index `at + 1`.
    pub fn insert_at(&mut self, at: usize, pair: (K, V), right: Option<Box<Self>>) {
        self.pairs.insert(at, pair);
        if let Some(right) = right {
            self.children.insert(at + 1, right);
        }
    }

    /// Split a full node around its median while inserting `pair` (and `right`) at `at`.
    ///
    /// Everything after the median moves to a new sibling, the pending pair goes into
    /// whichever half brackets `at`, and the median is returned for the parent level.
    pub fn split(
        &mut self,
        at: usize,
        pair: (K, V),
        right: Option<Box<Self>>,
    ) -> ((K, V), Box<Self>) {
        let med = self.pairs.len() / 2;
        let children = if self.is_leaf() {
            ChildVec::new(0)
        } else {
            self.children.split_off(med + 1)
        };
        let mut sibling = Box::new(Self {
            pairs: self.pairs.split_off(med + 1),
            children,
        });
        let promoted = self.pairs.remove(med);
        if at > med {
            sibling.insert_at(at - med - 1, pair, right);
        } else {
            self.insert_at(at, pair, right);
        }
        (promoted, sibling)
    }

    pub fn remove_at(&mut self, at: usize) -> (K, V) {
        self.pairs.remove(at)
    }

    pub fn remove_last(&mut self) -> (K, V) {
        self.pairs.remove(self.pairs.len() - 1)
    }

    /// Replace the pair at `at`, returning the old one.
    pub fn replace(&mut self, at: usize, pair: (K, V)) -> (K, V) {
        mem::replace(&mut self.pairs[at], pair)
    }

    /// Rotate right through separator `pos - 1`: child `pos - 1` gives its last pair
    /// (and last child) to child `pos`.
    pub fn borrow_from_left(&mut self, pos: usize) {
        let (left, right) = self.children.split_at_mut(pos);
        let (lender, node) = (&mut left[pos - 1], &mut right[0]);
        let up = lender.remove_last();
        let down = mem::replace(&mut self.pairs[pos - 1], up);
        node.pairs.insert(0, down);
        if let Some(child) = lender.children.pop() {
            node.children.insert(0, child);
        }
    }

    /// Rotate left through separator `pos`: child `pos + 1` gives its first pair
    /// (and first child) to child `pos`.
    pub fn borrow_from_right(&mut self, pos: usize) {
        let (left, right) = self.children.split_at_mut(pos + 1);
        let (node, lender) = (&mut left[pos], &mut right[0]);
        let up = lender.remove_at(0);
        let down = mem::replace(&mut self.pairs[pos], up);
        node.pairs.push(down);
        if !lender.is_leaf() {
            node.children.push(lender.children.remove(0));
        }
    }

    /// Merge child `index + 1` and the separator between them into child `index`.
    pub fn merge_children(&mut self, index: usize) -> Result<()> {
        if index >= self.pairs.len() {
            return Err(Error::InvalidMergeTarget {
                index,
                separators: self.pairs.len(),
            });
        }
        let separator = self.pairs.remove(index);
        let mut right = self.children.remove(index + 1);
        let left = &mut self.children[index];
        left.pairs.push(separator);
        left.pairs.append(&mut right.pairs);
        left.children.append(&mut right.children);
        Ok(())
    }
}
