//! A height-balanced (AVL) ordered map for Rust.
//!
//! This crate provides [`AvlTreeMap`], an ordered key-value map kept as an AVL
//! tree: every node's two subtrees differ in height by at most one, so
//! [`find`](AvlTreeMap::find), [`insert`](AvlTreeMap::insert) and
//! [`remove`](AvlTreeMap::remove) are O(log n) in the worst case.
//!
//! # Example
//!
//! ```
//! use avl_tree::{AvlTreeMap, Error};
//!
//! let mut scores = AvlTreeMap::new();
//! scores.insert("Alice", 100);
//! scores.insert("Bob", 85);
//! scores.insert("Carol", 92);
//!
//! assert_eq!(scores.find("Bob"), Ok(&85));
//! assert_eq!(scores.remove("Dave"), Err(Error::NotFound));
//!
//! // In-order traversal yields keys in ascending order.
//! let names: Vec<_> = scores.iter().map(|(name, _)| *name).collect();
//! assert_eq!(names, ["Alice", "Bob", "Carol"]);
//!
//! // Structural self-check, for tests and debugging.
//! assert!(scores.debug_check_invariants());
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **Write-once entries** - Stored keys and values are never overwritten in place
//! - **Arena storage** - Nodes live in a slot vector addressed by handles, so
//!   dropping a map never recurses
//!
//! # Implementation
//!
//! Insertion and removal descend recursively and rebalance on the way back
//! up, rotating wherever a node's balance factor leaves `-1..=1`. A node with
//! two children is removed by swapping it, as a whole node, with its in-order
//! predecessor and then unlinking it from its new position. Rotations and
//! swaps are reported through the [`log`] facade at `trace` level.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod error;
mod raw;

pub mod avl_tree_map;

pub use avl_tree_map::AvlTreeMap;
pub use error::{Error, Result, Violation};
