//! Ordered map and set containers built on a parent-linked binary search tree.
//!
//! Positions are handed out as [`Cursor`]s that step through the tree in
//! order without an auxiliary stack, STL iterator style.
#![warn(missing_docs)]

mod bst_cursor;
mod bst_map;
mod bst_node;
mod bst_set;
mod bst_tree;
mod error;

pub use bst_cursor::{Cursor, IntoIter, IntoKeys, Iter, IterMut, Keys, Values};
pub use bst_map::TreeMap;
pub use bst_set::TreeSet;
pub use bst_tree::Tree;
pub use error::{Error, Result};
