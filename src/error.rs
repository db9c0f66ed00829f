//! Error types for [`BTree`](crate::BTree) operations.

use thiserror::Error;

/// Convenient Result type alias, `Result<T>` is `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by tree operations.
///
/// Every error is reported before the tree is modified, so a failed call leaves
/// the tree exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The tree was constructed with an order below 2.
    #[error("invalid order {0}: a B-tree needs t >= 2")]
    InvalidOrder(usize),

    /// The key is already present in the tree.
    #[error("duplicate key")]
    DuplicateKey,

    /// The key is not present in the tree.
    #[error("key not found")]
    KeyNotFound,

    /// A merge named a child pair that does not exist in the parent node.
    ///
    /// This indicates a bug in rebalancing.
    #[error("cannot merge child {index} with its right sibling: parent has {separators} separators")]
    InvalidMergeTarget {
        /// Index of the left child of the requested merge.
        index: usize,
        /// Number of separator keys in the parent.
        separators: usize,
    },
}
