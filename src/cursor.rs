//! In-order (infix) cursors and the iterators built on them.
//!
//! A cursor keeps an explicit stack of `(node, index)` frames from the root to the
//! current pair, so traversal needs no recursion and can be resumed at any point.
//! Cursors borrow the tree, so it cannot be modified while one is alive.

use crate::node::Node;
use crate::path::StkVec;
use std::{fmt, iter::FusedIterator, marker::PhantomData, ptr::NonNull};

/// Frame stack shared by [`InfixCursor`] and [`InfixCursorMut`].
struct RawCursor<K, V> {
    stack: StkVec<(NonNull<Node<K, V>>, usize)>,
}

impl<K, V> Clone for RawCursor<K, V> {
    fn clone(&self) -> Self {
        Self {
            stack: self.stack.clone(),
        }
    }
}

impl<K, V> RawCursor<K, V> {
    fn new(root: Option<&Node<K, V>>) -> Self {
        let mut c = Self {
            stack: StkVec::new(),
        };
        if let Some(root) = root {
            c.push_leftmost(root);
        }
        c
    }

    fn push_leftmost(&mut self, mut node: &Node<K, V>) {
        while node.len() > 0 {
            self.stack.push((NonNull::from(node), 0));
            if node.is_leaf() {
                break;
            }
            node = &*node.children[0];
        }
    }

    fn is_end(&self) -> bool {
        self.stack.is_empty()
    }

    /// Depth, index and pointer of the current pair.
    /// # Safety
    ///
    /// The nodes on the stack must still be alive and unchanged.
    unsafe fn current(&self) -> Option<(usize, usize, *mut (K, V))> {
        let &(node, index) = self.stack.last()?;
        let pair = node.as_ref().pairs.ptr_at(index);
        Some((self.stack.len() - 1, index, pair))
    }

    /// Step to the in-order successor.
    /// # Safety
    ///
    /// The nodes on the stack must still be alive and unchanged.
    unsafe fn advance(&mut self) {
        let Some(top) = self.stack.last_mut() else {
            panic!("advance called on an exhausted infix cursor");
        };
        let node = top.0.as_ref();
        if !node.is_leaf() {
            top.1 += 1;
            let next = top.1;
            self.push_leftmost(&node.children[next]);
            return;
        }
        if top.1 + 1 < node.len() {
            top.1 += 1;
            return;
        }
        self.stack.pop();
        // A parent frame at index == len has already yielded all of its pairs.
        while let Some(&(node, index)) = self.stack.last() {
            if index < node.as_ref().len() {
                break;
            }
            self.stack.pop();
        }
    }
}

impl<K, V> PartialEq for RawCursor<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.stack.last() == other.stack.last()
    }
}

/// Cursor over the pairs of a [`BTree`](crate::BTree) in ascending key order.
///
/// Returned by [`BTree::begin_infix`](crate::BTree::begin_infix) and
/// [`BTree::end_infix`](crate::BTree::end_infix). Two cursors are equal when both are
/// exhausted or both are at the same pair.
///
/// ```
///     use infix_btree::BTree;
///     let mut tree = BTree::new(2).unwrap();
///     for k in [3, 1, 2] {
///         tree.insert(k, k * 10).unwrap();
///     }
///     let mut c = tree.begin_infix();
///     let mut keys = Vec::new();
///     while c != tree.end_infix() {
///         let (_depth, _index, k, _v) = c.get().unwrap();
///         keys.push(*k);
///         c.advance();
///     }
///     assert_eq!(keys, [1, 2, 3]);
/// ```
pub struct InfixCursor<'a, K, V> {
    raw: RawCursor<K, V>,
    _pd: PhantomData<&'a Node<K, V>>,
}

unsafe impl<'a, K: Sync, V: Sync> Send for InfixCursor<'a, K, V> {}
unsafe impl<'a, K: Sync, V: Sync> Sync for InfixCursor<'a, K, V> {}

impl<'a, K, V> InfixCursor<'a, K, V> {
    pub(crate) fn new(root: Option<&'a Node<K, V>>) -> Self {
        Self {
            raw: RawCursor::new(root),
            _pd: PhantomData,
        }
    }

    /// Returns `(depth, index, key, value)` for the current pair, where `depth` is 0 at
    /// the root and `index` is the position of the pair within its node.
    /// `None` once the cursor is exhausted.
    #[must_use]
    pub fn get(&self) -> Option<(usize, usize, &'a K, &'a V)> {
        unsafe {
            let (depth, index, pair) = self.raw.current()?;
            Some((depth, index, &(*pair).0, &(*pair).1))
        }
    }

    /// Move to the next pair in key order.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is already exhausted.
    pub fn advance(&mut self) {
        unsafe { self.raw.advance() }
    }

    /// Is the cursor past the last pair?
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.raw.is_end()
    }
}

impl<'a, K, V> Clone for InfixCursor<'a, K, V> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            _pd: PhantomData,
        }
    }
}

impl<'a, K, V> PartialEq for InfixCursor<'a, K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<'a, K, V> Eq for InfixCursor<'a, K, V> {}

impl<'a, K: fmt::Debug, V: fmt::Debug> fmt::Debug for InfixCursor<'a, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(cur) => f.debug_tuple("InfixCursor").field(&cur).finish(),
            None => f.write_str("InfixCursor(end)"),
        }
    }
}

/// Cursor like [`InfixCursor`] that can also modify values.
///
/// Returned by [`BTree::begin_infix_mut`](crate::BTree::begin_infix_mut). The cursor holds
/// the tree mutably, so the exhausted cursor to compare against is [`InfixCursorMut::end`]
/// rather than one obtained from the tree.
///
/// ```
///     use infix_btree::{BTree, InfixCursorMut};
///     let mut tree = BTree::new(2).unwrap();
///     for k in [3, 1, 2] {
///         tree.insert(k, k).unwrap();
///     }
///     let mut c = tree.begin_infix_mut();
///     while c != InfixCursorMut::end() {
///         let (_depth, _index, _k, v) = c.get_mut().unwrap();
///         *v *= 10;
///         c.advance();
///     }
///     assert_eq!(tree.obtain(&2), Ok(&20));
/// ```
pub struct InfixCursorMut<'a, K, V> {
    raw: RawCursor<K, V>,
    _pd: PhantomData<&'a mut Node<K, V>>,
}

unsafe impl<'a, K: Send, V: Send> Send for InfixCursorMut<'a, K, V> {}
unsafe impl<'a, K: Sync, V: Sync> Sync for InfixCursorMut<'a, K, V> {}

impl<'a, K, V> InfixCursorMut<'a, K, V> {
    pub(crate) fn new(root: Option<&'a mut Node<K, V>>) -> Self {
        Self {
            raw: RawCursor::new(root.map(|r| &*r)),
            _pd: PhantomData,
        }
    }

    /// Exhausted cursor, equal to any mutable cursor that has moved past the largest key.
    #[must_use]
    pub fn end() -> Self {
        Self::new(None)
    }

    /// Returns `(depth, index, key, value)` for the current pair.
    #[must_use]
    pub fn get(&self) -> Option<(usize, usize, &K, &V)> {
        unsafe {
            let (depth, index, pair) = self.raw.current()?;
            Some((depth, index, &(*pair).0, &(*pair).1))
        }
    }

    /// Returns `(depth, index, key, value)` for the current pair, with a mutable value.
    pub fn get_mut(&mut self) -> Option<(usize, usize, &K, &mut V)> {
        unsafe {
            let (depth, index, pair) = self.raw.current()?;
            Some((depth, index, &(*pair).0, &mut (*pair).1))
        }
    }

    /// Move to the next pair in key order.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is already exhausted.
    pub fn advance(&mut self) {
        unsafe { self.raw.advance() }
    }

    /// Is the cursor past the last pair? Same as comparing with [`InfixCursorMut::end`].
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.raw.is_end()
    }
}

impl<'a, K, V> PartialEq for InfixCursorMut<'a, K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

/// Iterator returned by [`BTree::iter`](crate::BTree::iter).
pub struct Iter<'a, K, V> {
    cursor: InfixCursor<'a, K, V>,
    len: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(cursor: InfixCursor<'a, K, V>, len: usize) -> Self {
        Self { cursor, len }
    }
}

impl<'a, K, V> Clone for Iter<'a, K, V> {
    fn clone(&self) -> Self {
        Self {
            cursor: self.cursor.clone(),
            len: self.len,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        let (_, _, k, v) = self.cursor.get()?;
        self.cursor.advance();
        self.len -= 1;
        Some((k, v))
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}
impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {
    fn len(&self) -> usize {
        self.len
    }
}
impl<'a, K, V> FusedIterator for Iter<'a, K, V> {}

/// Iterator returned by [`BTree::iter_mut`](crate::BTree::iter_mut).
pub struct IterMut<'a, K, V> {
    cursor: InfixCursorMut<'a, K, V>,
    len: usize,
}

impl<'a, K, V> IterMut<'a, K, V> {
    pub(crate) fn new(cursor: InfixCursorMut<'a, K, V>, len: usize) -> Self {
        Self { cursor, len }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    fn next(&mut self) -> Option<Self::Item> {
        unsafe {
            // Each pair is visited once, so the returned references never alias.
            let (_, _, pair) = self.cursor.raw.current()?;
            self.cursor.raw.advance();
            self.len -= 1;
            let pair = &mut *pair;
            Some((&pair.0, &mut pair.1))
        }
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}
impl<'a, K, V> ExactSizeIterator for IterMut<'a, K, V> {
    fn len(&self) -> usize {
        self.len
    }
}
impl<'a, K, V> FusedIterator for IterMut<'a, K, V> {}

/// Iterator returned by [`BTree::keys`](crate::BTree::keys).
#[derive(Clone)]
pub struct Keys<'a, K, V>(pub(crate) Iter<'a, K, V>);
impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, _)| k)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}
impl<'a, K, V> ExactSizeIterator for Keys<'a, K, V> {
    fn len(&self) -> usize {
        self.0.len()
    }
}
impl<'a, K, V> FusedIterator for Keys<'a, K, V> {}

/// Iterator returned by [`BTree::values`](crate::BTree::values).
#[derive(Clone)]
pub struct Values<'a, K, V>(pub(crate) Iter<'a, K, V>);
impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(_, v)| v)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}
impl<'a, K, V> ExactSizeIterator for Values<'a, K, V> {
    fn len(&self) -> usize {
        self.0.len()
    }
}
impl<'a, K, V> FusedIterator for Values<'a, K, V> {}
