//! Active filter state module.
//!
//! Filter values and the per-view set of active filters.

pub mod active;
pub mod value;

pub use active::*;
pub use value::*;
