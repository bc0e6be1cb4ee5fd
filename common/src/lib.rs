//! Shared data structures for jarmod.
//!
//! The only resident today is [`tree`], the arena-backed rooted tree used by
//! the module orderer.

pub mod tree;

pub use tree::{NodeId, Tree, TreeError};
