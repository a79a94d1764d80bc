// src/group/mod.rs

//! Execution groups: named units of concurrent work with cross-group
//! ordering.
//!
//! - [`execution_group`] holds a single group: outstanding counter, error
//!   slot, the `follows` barrier applied to every scheduled item, and
//!   [`batched`], which holds submissions back until the submitter suspends.
//! - [`registry`] is the name-to-group table shared by an engine, with
//!   implicit (`get_or_create`) and explicit (`make_group`) creation.

pub mod execution_group;
pub mod registry;

pub use execution_group::{batched, ExecutionGroup, GroupOptions};
pub use registry::GroupRegistry;

/// Name of the group `start` uses when none is given.
pub const DEFAULT_GROUP: &str = "";
