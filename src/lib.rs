//! Binary search tree map for Rust.
//!
//! This crate provides [`BSTreeMap`], an ordered key-value map stored as an
//! explicit binary search tree. Beside the familiar `BTreeMap`-style API it
//! exposes the shape of the tree:
//!
//! - Pre-order, in-order and post-order traversal, forwards and backwards, through
//!   iterators and [`Cursor`]s that report their [`depth`](Cursor::depth)
//! - Single, double and big rotations on any node through [`Structure`]
//! - A compile-time [`Policy`] whose hooks run after searches, after inserts and
//!   on erase, so balancing variants can be layered on the plain tree
//! - A pluggable [`NodeAllocator`]; a refused allocation leaves the tree unchanged
//!
//! # Example
//!
//! ```
//! use bstree::{BSTreeMap, Error, PostOrder};
//!
//! let mut scores = BSTreeMap::new();
//! scores.insert("Carol", 92).unwrap();
//! scores.insert("Alice", 100).unwrap();
//! scores.insert("Dave", 71).unwrap();
//! scores.insert("Bob", 85).unwrap();
//!
//! // Standard map operations
//! assert_eq!(scores.get("Bob"), Some(&85));
//! assert_eq!(scores.at("Eve"), Err(Error::KeyNotFound));
//! assert!(scores.keys().copied().eq(["Alice", "Bob", "Carol", "Dave"]));
//!
//! // The tree keeps its insertion shape: "Carol" is the root.
//! let post: Vec<_> = scores.post_order().map(|(k, _)| *k).collect();
//! assert_eq!(post, ["Bob", "Alice", "Dave", "Carol"]);
//!
//! // Cursors walk any order and know where they are.
//! let cursor = scores.cursor_first::<PostOrder>();
//! assert_eq!(cursor.key(), Ok(&"Bob"));
//! assert_eq!(cursor.depth(), Some(2));
//!
//! // Rotations reshape the tree without changing its contents.
//! let root = scores.structure().root().unwrap();
//! scores.structure_mut().rotate_right(root).unwrap();
//! let new_root = scores.structure().root().unwrap();
//! assert_eq!(scores.structure().key(new_root), Ok(&"Alice"));
//! assert!(scores.keys().copied().eq(["Alice", "Bob", "Carol", "Dave"]));
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **Stable handles** - Nodes live in a generational arena; a [`Handle`] to an
//!   erased node is reported as stale instead of aliasing a new one
//! - **Fallible growth** - Insertion returns [`Error::AllocationFailed`] rather than aborting
//!
//! # Implementation
//!
//! Nodes hold a key and parent/left/right links; values live in a parallel arena so
//! mutable iteration never aliases the links it walks. Every traversal steps with
//! parent links alone, so cursors are a single handle and need no stack.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
// NOTE: Mutable iteration hands out values while walking links, which needs raw pointers.
// #![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod allocator;
mod comparator;
mod error;
mod order;
mod policy;
mod raw;

pub mod bstree_map;

pub use allocator::{Bounded, Global, NodeAllocator};
pub use bstree_map::{BSTreeMap, Cursor, CursorMut, IntoIter, Iter, IterMut, Keys, Range, Structure, Values, ValuesMut};
pub use comparator::{ByFn, Comparator, Descending, Natural};
pub use error::{Error, Result};
pub use order::{InOrder, Order, PostOrder, PreOrder, ReverseInOrder, ReversePostOrder, ReversePreOrder, Reversed};
pub use policy::{Plain, Policy};
pub use raw::{Handle, Removed};
