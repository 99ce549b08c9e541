//! Core types and trait definitions for the Kin family-tree store.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! owns the domain model, the store abstractions, and the one piece of real
//! logic in the system: assembling a hierarchical family tree out of the
//! flat, directed relationship table.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod loader;
pub mod media;
pub mod person;
pub mod relationship;
pub mod store;
pub mod tree;

pub use error::{Error, Result};
pub use loader::{FlatPerson, load_flat_people};
pub use tree::{
  AnchorNotFound, ChildOrder, PersonSummary, SpouseSummary, TreeError,
  TreeNode, TreeOptions, build_family_tree, family_tree,
};
