//! Storage module.
//!
//! Key-value stores and the per-entity filter record layout written into
//! them.

pub mod backend;
pub mod file;
pub mod memory;
pub mod persistence;

pub use backend::*;
pub use file::*;
pub use memory::*;
pub use persistence::*;
