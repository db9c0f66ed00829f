#![deny(missing_docs)]

//! This crate implements [BTree], an in-memory B-tree map of runtime order `t`.
//!
//! Every node holds between `t - 1` and `2t - 1` key-value pairs (the root may hold fewer),
//! and all leaves are at the same depth. Keys are unique and ordered by a [Compare]
//! implementation, [Natural] (the [Ord] order) by default.
//!
//! Pairs are visited in ascending key order with an [InfixCursor], which also reports the
//! depth and in-node index of each pair, or with the usual iterators.
//!
//! # Example
//!
//! ```
//!     use infix_btree::{BTree, Error};
//!     let mut capitals = BTree::new(3).unwrap();
//!     capitals.insert("England", "London").unwrap();
//!     capitals.insert("France", "Paris").unwrap();
//!     assert_eq!(capitals.insert("France", "Lyon"), Err(Error::DuplicateKey));
//!     println!("The capital of France is {}", capitals.obtain(&"France").unwrap());
//!     capitals.dispose(&"England").unwrap();
//!     assert_eq!(capitals.len(), 1);
//! ```
//!
//!# Features
//!
//! This crate supports the following cargo features:
//! - `serde` : enables serialisation of [BTree] via serde crate.
//! - `unsafe-optim` : omits bounds assertions in node storage for release builds.

pub mod compare;
pub mod cursor;
pub mod error;

mod node;
mod path;
mod tree;
mod vecs;

pub use compare::{Compare, Natural};
pub use cursor::{InfixCursor, InfixCursorMut, Iter, IterMut, Keys, Values};
pub use error::{Error, Result};
pub use tree::BTree;

/// Default order t, used by [BTree::default] and deserialization. Nodes hold at most 39 pairs.
pub const DEFAULT_ORDER: usize = 20;

// Tests.

/* mimalloc cannot be used with miri */
#[cfg(all(test, not(miri)))]
use mimalloc::MiMalloc;

#[cfg(all(test, not(miri)))]
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[cfg(test)]
mod mytests;
