//! An in-memory ordered index of roster records for Rust.
//!
//! This crate provides [`OrderedIndex`], an unbalanced binary search tree of [`Record`]s
//! keyed by surname and id, with:
//!
//! - [`insert`](OrderedIndex::insert) - Add a record; duplicate keys are kept
//! - [`remove`](OrderedIndex::remove) - Take out one record by key, or report [`IndexError::NotFound`]
//! - [`contains`](OrderedIndex::contains) - Check whether a key is stored
//! - [`enumerate_in_order`](OrderedIndex::enumerate_in_order) - Snapshot every record in key order
//!
//! # Example
//!
//! ```
//! use roster_tree::{FirstYear, OrderedIndex, Record, SecondYear};
//!
//! let mut roster = OrderedIndex::new();
//! roster.insert(Record::new("Ivanov", "Ivan", "TM-100", 1234).with_describer(FirstYear));
//! roster.insert(Record::new("Petrov", "Egor", "TR-322", 4321));
//! roster.insert(Record::new("Sidorov", "Sidor", "TM-100", 9876).with_describer(SecondYear));
//! roster.insert(Record::new("Ivanov", "Petr", "PK-121", 2468));
//!
//! // Keys are `surname ++ id` compared as text.
//! let keys: Vec<String> = roster.iter().map(|r| r.derive_key()).collect();
//! assert_eq!(keys, ["Ivanov1234", "Ivanov2468", "Petrov4321", "Sidorov9876"]);
//!
//! for record in roster.enumerate_in_order() {
//!     println!("{record}");
//! }
//!
//! assert!(roster.remove("Nobody", 0).is_err());
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`
//! - **Pluggable descriptions** - Attach any [`Describe`] implementation to a record
//! - **Configurable ordering** - [`KeyOrder::SurnameThenId`] orders ids numerically
//! - **Logging** - Emits [`tracing`] events; the index itself never prints
//!
//! # Implementation
//!
//! Nodes live in an arena and link to their children by handle. Removing a node with two
//! children moves its in-order successor's record into it in place. Nothing in the crate
//! recurses over the tree, and dropping an index frees every node without walking it.

#![no_std]
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

mod config;
mod error;
mod ordered_index;
mod raw;
mod record;

pub use config::{IndexConfig, KeyOrder};
pub use error::{IndexError, Result};
pub use ordered_index::{Iter, OrderedIndex};
pub use record::{Describe, FirstYear, NO_CATEGORY_INFO, NO_DESCRIPTION, Record, RecordKey, SecondYear};
