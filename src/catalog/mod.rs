//! Filter catalog module.
//!
//! Static filter definitions supplied once by the list view.

pub mod definition;
pub mod registry;

pub use definition::*;
pub use registry::*;
