use crate::*;
use std::rc::Rc;

/// Keys inserted by the 2-3-4 tree scenarios.
const SCENARIO: [i32; 8] = [10, 20, 5, 6, 12, 30, 7, 17];

const SCENARIO_SORTED: [i32; 8] = [5, 6, 7, 10, 12, 17, 20, 30];

fn scenario_tree() -> BTree<i32, i32> {
    let mut t = BTree::new(2).unwrap();
    for k in SCENARIO {
        t.insert(k, k * 10).unwrap();
        t.check();
    }
    t
}

fn keys_of<C>(t: &BTree<i32, i32, C>) -> Vec<i32> {
    t.keys().copied().collect()
}

/// Keys held at `depth`, left to right, read from the cursor.
fn level<C>(t: &BTree<i32, i32, C>, depth: usize) -> Vec<i32> {
    let mut result = Vec::new();
    let mut c = t.begin_infix();
    while let Some((d, _, k, _)) = c.get() {
        if d == depth {
            result.push(*k);
        }
        c.advance();
    }
    result
}

/// Visit 0..n in a scrambled but deterministic order; n must be prime.
fn scrambled(n: usize) -> impl Iterator<Item = usize> {
    (0..n).map(move |i| (i * 7919 + 13) % n)
}

#[test]
fn invalid_order_test() {
    assert_eq!(BTree::<i32, i32>::new(1).unwrap_err(), Error::InvalidOrder(1));
    assert_eq!(BTree::<i32, i32>::new(0).unwrap_err(), Error::InvalidOrder(0));
    let t = BTree::<i32, i32>::new(2).unwrap();
    assert_eq!((t.order(), t.max_keys(), t.min_keys()), (2, 3, 1));
    let d = BTree::<i32, i32>::default();
    assert_eq!(d.order(), DEFAULT_ORDER);
    assert!(d.is_empty());
}

#[test]
fn oversized_order_test() {
    for t in [usize::MAX, usize::MAX / 2 + 1, usize::MAX / 4] {
        assert_eq!(BTree::<i32, i32>::new(t).unwrap_err(), Error::InvalidOrder(t));
        let by_cmp = BTree::<u64, String, _>::with_comparator(t, |a: &u64, b: &u64| a.cmp(b));
        assert_eq!(by_cmp.unwrap_err(), Error::InvalidOrder(t));
    }

    // Any accepted order must allow inserts.
    let big = 1 << 16;
    let mut t = BTree::new(big).unwrap();
    assert_eq!(t.max_keys(), 2 * big - 1);
    for i in 0..100 {
        t.insert(i, i).unwrap();
    }
    t.check();
    assert_eq!(t.height(), 1);
}

#[test]
fn split_promotes_median_test() {
    let mut t = BTree::new(2).unwrap();
    for k in [10, 20, 5] {
        t.insert(k, k).unwrap();
    }
    assert_eq!(t.height(), 1);
    assert_eq!(level(&t, 0), [5, 10, 20]);

    // Root leaf is full, so inserting 6 splits it around 10.
    t.insert(6, 6).unwrap();
    t.check();
    assert_eq!(t.height(), 2);
    assert_eq!(level(&t, 0), [10]);
    assert_eq!(level(&t, 1), [5, 6, 20]);
}

#[test]
fn scenario_shape_test() {
    let t = scenario_tree();
    assert_eq!(t.len(), 8);
    assert_eq!(t.height(), 2);
    assert_eq!(level(&t, 0), [10, 20]);
    assert_eq!(level(&t, 1), [5, 6, 7, 12, 17, 30]);
    assert_eq!(keys_of(&t), [5, 6, 7, 10, 12, 17, 20, 30]);
}

#[test]
fn cursor_depth_index_test() {
    let t = scenario_tree();
    let mut seen = Vec::new();
    let mut c = t.begin_infix();
    while c != t.end_infix() {
        let (d, i, k, v) = c.get().unwrap();
        assert_eq!(*v, k * 10);
        seen.push((d, i, *k));
        c.advance();
    }
    assert_eq!(
        seen,
        [
            (1, 0, 5),
            (1, 1, 6),
            (1, 2, 7),
            (0, 0, 10),
            (1, 0, 12),
            (1, 1, 17),
            (0, 1, 20),
            (1, 0, 30)
        ]
    );
    assert!(c.is_end());
    assert!(c.get().is_none());
}

#[test]
fn cursor_equality_test() {
    let t = scenario_tree();
    let a = t.begin_infix();
    let mut b = t.begin_infix();
    assert_eq!(a, b);
    b.advance();
    assert_ne!(a, b);
    let mut a2 = a.clone();
    a2.advance();
    assert_eq!(a2, b);

    let empty = BTree::<i32, i32>::new(2).unwrap();
    assert_eq!(empty.begin_infix(), empty.end_infix());
    assert!(empty.begin_infix().is_end());
}

#[test]
#[should_panic(expected = "exhausted")]
fn cursor_advance_past_end_test() {
    let mut t = BTree::new(2).unwrap();
    t.insert(1, 1).unwrap();
    let mut c = t.begin_infix();
    c.advance();
    assert!(c.is_end());
    c.advance();
}

#[test]
fn cursor_mut_test() {
    let mut t = scenario_tree();
    let mut c = t.begin_infix_mut();
    while let Some((_, _, k, v)) = c.get_mut() {
        *v = k + 1;
        c.advance();
    }
    assert!(c.is_end());
    assert!(c == InfixCursorMut::end());
    for (k, v) in t.iter() {
        assert_eq!(*v, k + 1);
    }

    let mut c = t.begin_infix_mut();
    let mut seen = 0;
    while c != InfixCursorMut::end() {
        let (d, i, k, v) = c.get_mut().unwrap();
        assert_eq!(*v, k + 1);
        assert!(d <= 1 && i < 3);
        *v += 1;
        seen += 1;
        c.advance();
    }
    assert_eq!(seen, 8);
    for (k, v) in t.iter_mut() {
        assert_eq!(*v, k + 2);
        *v -= 1;
    }

    let mut empty = BTree::<i32, i32>::new(2).unwrap();
    assert!(empty.begin_infix_mut() == InfixCursorMut::end());
    for (_, v) in &mut t {
        *v *= 2;
    }
    for (k, v) in t.iter_mut() {
        assert_eq!(*v, (k + 1) * 2);
    }
}

#[test]
fn duplicate_insert_test() {
    let mut t = scenario_tree();
    let before = t.clone();
    assert_eq!(t.insert(12, 0), Err(Error::DuplicateKey));
    assert_eq!(t.insert(10, 0), Err(Error::DuplicateKey));
    assert_eq!(t, before);
    assert_eq!(t.obtain(&12), Ok(&120));
    t.check();
}

#[test]
fn obtain_update_test() {
    let mut t = scenario_tree();
    for k in SCENARIO {
        assert_eq!(t.obtain(&k), Ok(&(k * 10)));
        assert!(t.contains_key(&k));
    }
    assert_eq!(t.obtain(&99), Err(Error::KeyNotFound));
    assert!(!t.contains_key(&99));

    assert_eq!(t.update(&7, 700), Ok(70));
    assert_eq!(t.obtain(&7), Ok(&700));
    *t.obtain_mut(&20).unwrap() += 1;
    assert_eq!(t.obtain(&20), Ok(&201));

    let before = t.clone();
    assert_eq!(t.update(&99, 1), Err(Error::KeyNotFound));
    assert_eq!(t.obtain_mut(&99), Err(Error::KeyNotFound));
    assert_eq!(t, before);

    let empty = BTree::<i32, i32>::new(2).unwrap();
    assert_eq!(empty.obtain(&1), Err(Error::KeyNotFound));
}

#[test]
fn dispose_leaf_test() {
    let mut t = scenario_tree();
    assert_eq!(t.dispose(&5), Ok(50));
    t.check();
    assert_eq!(keys_of(&t), [6, 7, 10, 12, 17, 20, 30]);
    assert_eq!(level(&t, 0), [10, 20]);
    assert_eq!(t.dispose(&5), Err(Error::KeyNotFound));
    assert_eq!(t.len(), 7);
}

#[test]
fn dispose_internal_uses_predecessor_test() {
    let mut t = scenario_tree();
    assert_eq!(t.dispose(&10), Ok(100));
    t.check();
    assert_eq!(level(&t, 0), [7, 20]);
    assert_eq!(level(&t, 1), [5, 6, 12, 17, 30]);
}

#[test]
fn dispose_borrow_and_merge_test() {
    let mut t = scenario_tree();

    // [30] empties, left sibling [12, 17] lends 17 through the root.
    t.dispose(&30).unwrap();
    t.check();
    assert_eq!(level(&t, 0), [10, 17]);
    assert_eq!(level(&t, 1), [5, 6, 7, 12, 20]);

    // [12] empties, [5, 6, 7] lends 7.
    t.dispose(&12).unwrap();
    t.check();
    assert_eq!(level(&t, 0), [7, 17]);
    assert_eq!(level(&t, 1), [5, 6, 10, 20]);

    // [20] empties, [10] cannot lend, so they merge around 17.
    t.dispose(&20).unwrap();
    t.check();
    assert_eq!(level(&t, 0), [7]);
    assert_eq!(level(&t, 1), [5, 6, 10, 17]);

    // Leftmost leaf borrows from the right.
    t.dispose(&5).unwrap();
    t.dispose(&6).unwrap();
    t.check();
    assert_eq!(level(&t, 0), [10]);
    assert_eq!(level(&t, 1), [7, 17]);

    // Merge empties the root, which collapses.
    t.dispose(&17).unwrap();
    t.check();
    assert_eq!(t.height(), 1);
    assert_eq!(level(&t, 0), [7, 10]);

    t.dispose(&7).unwrap();
    t.dispose(&10).unwrap();
    t.check();
    assert!(t.is_empty());
    assert_eq!(t.height(), 0);
    assert_eq!(t.begin_infix(), t.end_infix());
}

#[test]
fn dispose_all_orders_test() {
    for order in [2, 3, 5] {
        let n = 1009;
        let orders: [Vec<usize>; 3] = [
            (0..n).collect(),
            (0..n).rev().collect(),
            (0..n).map(|i| (i * 31 + 7) % n).collect(),
        ];
        for removal in orders.iter() {
            let mut t = BTree::new(order).unwrap();
            for i in scrambled(n) {
                t.insert(i, i).unwrap();
            }
            t.check();
            assert_eq!(t.len(), n);
            for (done, i) in removal.iter().enumerate() {
                assert_eq!(t.dispose(i), Ok(*i));
                if done % 97 == 0 {
                    t.check();
                }
            }
            t.check();
            assert!(t.is_empty());
            assert!(t.first_key_value().is_none());
        }
    }
}

#[test]
fn large_insert_test() {
    for order in [2, 3, 4, 20] {
        let n = 10007;
        let mut t = BTree::new(order).unwrap();
        for i in scrambled(n) {
            t.insert(i, i * 2).unwrap();
        }
        t.check();
        assert_eq!(t.len(), n);
        for (i, (k, v)) in t.iter().enumerate() {
            assert_eq!((*k, *v), (i, i * 2));
        }
        assert_eq!(t.first_key_value(), Some((&0, &0)));
        assert_eq!(t.last_key_value(), Some((&(n - 1), &((n - 1) * 2))));
        assert_eq!(t.iter().len(), n);
        assert_eq!(t.values().sum::<usize>(), (0..n).map(|i| i * 2).sum::<usize>());
    }
}

#[test]
fn obtain_between_test() {
    let t = scenario_tree();
    let keys = |r: Vec<(&i32, &i32)>| r.into_iter().map(|(k, _)| *k).collect::<Vec<_>>();
    assert_eq!(keys(t.obtain_between(&6, &17, true, false)), [6, 7, 10, 12]);
    assert_eq!(keys(t.obtain_between(&6, &17, false, true)), [7, 10, 12, 17]);
    assert_eq!(keys(t.obtain_between(&6, &17, true, true)), [6, 7, 10, 12, 17]);
    assert_eq!(keys(t.obtain_between(&0, &100, false, false)), SCENARIO_SORTED);
    assert!(t.obtain_between(&18, &19, true, true).is_empty());
    assert!(t.obtain_between(&17, &6, true, true).is_empty());
    assert!(t.obtain_between(&10, &10, false, true).is_empty());
    assert_eq!(t.obtain_between(&10, &10, true, true), [(&10, &100)]);
}

#[test]
fn comparator_test() {
    let mut t = BTree::with_comparator(2, |a: &i32, b: &i32| b.cmp(a)).unwrap();
    for k in SCENARIO {
        t.insert(k, k).unwrap();
    }
    t.check();
    let mut expect = SCENARIO_SORTED.to_vec();
    expect.reverse();
    assert_eq!(keys_of(&t), expect);
    assert_eq!(t.first_key_value(), Some((&30, &30)));
    assert_eq!(
        t.obtain_between(&20, &7, true, false)
            .into_iter()
            .map(|(k, _)| *k)
            .collect::<Vec<_>>(),
        [20, 17, 12, 10]
    );
    t.dispose(&20).unwrap();
    t.check();
}

#[test]
fn clone_is_deep_test() {
    let mut a = scenario_tree();
    let b = a.clone();
    assert_eq!(a, b);
    a.dispose(&10).unwrap();
    a.update(&5, 0).unwrap();
    a.insert(1, 1).unwrap();
    assert_ne!(a, b);
    assert_eq!(keys_of(&b), SCENARIO_SORTED);
    assert_eq!(b.obtain(&5), Ok(&50));
    b.check();
    a.check();

    // Changing the copy leaves the source alone too.
    let a = scenario_tree();
    let mut b = a.clone();
    b.update(&30, 0).unwrap();
    for k in SCENARIO {
        b.dispose(&k).unwrap();
        b.check();
    }
    assert!(b.is_empty());
    b.insert(99, 99).unwrap();
    a.check();
    assert_eq!(keys_of(&a), SCENARIO_SORTED);
    assert_eq!(a.obtain(&30), Ok(&300));
    assert!(!a.contains_key(&99));
}

#[test]
fn take_and_clear_test() {
    let mut a = scenario_tree();
    let b = a.take();
    assert!(a.is_empty());
    assert_eq!(a.height(), 0);
    assert_eq!(a.order(), 2);
    a.check();
    assert_eq!(b.len(), 8);
    assert_eq!(keys_of(&b), SCENARIO_SORTED);

    // The source stays usable.
    a.insert(1, 1).unwrap();
    assert_eq!(keys_of(&a), [1]);

    let mut c = b.clone();
    c.clear();
    assert!(c.is_empty());
    assert_eq!(c.begin_infix(), c.end_infix());
    c.insert(3, 3).unwrap();
    c.check();
}

#[test]
fn drop_releases_values_test() {
    let rc = Rc::new(());
    {
        let mut t = BTree::new(2).unwrap();
        for i in 0..500 {
            t.insert(i, rc.clone()).unwrap();
        }
        assert_eq!(Rc::strong_count(&rc), 501);
        for i in 0..100 {
            drop(t.dispose(&i).unwrap());
        }
        assert_eq!(Rc::strong_count(&rc), 401);
        let copy = t.clone();
        assert_eq!(Rc::strong_count(&rc), 801);
        drop(copy);
        assert_eq!(Rc::strong_count(&rc), 401);
        assert_eq!(t.insert(150, rc.clone()), Err(Error::DuplicateKey));
        assert_eq!(Rc::strong_count(&rc), 401);
    }
    assert_eq!(Rc::strong_count(&rc), 1);
}

#[test]
fn string_keys_test() {
    let mut t = BTree::new(3).unwrap();
    for i in (0..300).rev() {
        t.insert(format!("key{:04}", i), i).unwrap();
    }
    t.check();
    assert_eq!(t.obtain(&"key0042".to_string()), Ok(&42));
    for i in (0..300).step_by(2) {
        t.dispose(&format!("key{:04}", i)).unwrap();
    }
    t.check();
    assert_eq!(t.len(), 150);
    assert_eq!(t.keys().next().map(String::as_str), Some("key0001"));
}

#[test]
fn debug_format_test() {
    let mut t = BTree::new(2).unwrap();
    t.insert(2, "b").unwrap();
    t.insert(1, "a").unwrap();
    assert_eq!(format!("{:?}", t), r#"{1: "a", 2: "b"}"#);
    let c = t.begin_infix();
    assert_eq!(format!("{:?}", c), r#"InfixCursor((0, 0, 1, "a"))"#);
    assert_eq!(format!("{:?}", t.end_infix()), "InfixCursor(end)");
}

#[cfg(feature = "serde")]
#[test]
fn serde_test() {
    let t = scenario_tree();
    let json = serde_json::to_string(&t).unwrap();
    assert_eq!(
        json,
        r#"{"5":50,"6":60,"7":70,"10":100,"12":120,"17":170,"20":200,"30":300}"#
    );
    let back: BTree<i32, i32> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, t);
    assert_eq!(back.order(), DEFAULT_ORDER);
    back.check();
}
