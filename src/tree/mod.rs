//! Pure operations over a task tree (`&[TaskNode]`).
//!
//! Nothing here touches storage. Lookups borrow; mutations are
//! copy-on-write and return a fresh `Vec<TaskNode>`, leaving the input as it
//! was. A root record's own fields are never part of the tree, so a target
//! that turns out to be the root is always handled by the caller.
//!
//! Ids are expected to be unique within one tree. When they are not, every
//! operation acts on the first match in depth-first pre-order; duplicates are
//! a caller bug and are not repaired here.

pub mod depth;
pub mod find;
pub mod mutate;

pub use depth::{DEFAULT_MAX_DEPTH, DepthPolicy};
pub use find::{count, depth_of, find};
pub use mutate::{Edit, insert, remove, update};
