//! Task Tree Sync Library
//!
//! Nested task trees stored as one encoded blob per root record, edited by
//! copy-on-write and kept in step with an optimistic client-side mirror.

pub mod cli;
pub mod codec;
pub mod config;
pub mod db;
pub mod error;
pub mod ids;
pub mod logging;
pub mod store;
pub mod sync;
pub mod tree;
pub mod types;
