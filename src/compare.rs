//! Key comparators.

use std::cmp::Ordering;

/// Three-way key comparison used to order a [`BTree`](crate::BTree).
///
/// The comparison must be a total order, and must not change while keys are in the tree.
///
/// Any `Fn(&K, &K) -> Ordering` is a comparator:
///
/// ```
///     use infix_btree::BTree;
///     let mut descending = BTree::with_comparator(2, |a: &i32, b: &i32| b.cmp(a)).unwrap();
///     for k in [3, 1, 2] {
///         descending.insert(k, k * 10).unwrap();
///     }
///     let keys: Vec<i32> = descending.keys().copied().collect();
///     assert_eq!(keys, [3, 2, 1]);
/// ```
pub trait Compare<K: ?Sized> {
    /// Compare `a` with `b`.
    fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// Comparator that uses the natural ([`Ord`]) order of the keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Natural;

impl<K: Ord + ?Sized> Compare<K> for Natural {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

impl<K: ?Sized, F> Compare<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self(a, b)
    }
}
