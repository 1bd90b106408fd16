//! Record field extraction module.
//!
//! Field path resolution and JSON value coercions used by the compilers.

pub mod field_path;

pub use field_path::*;
