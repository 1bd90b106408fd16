//! Engine orchestration module.
//!
//! Binds the catalog, active state, persistence, address mirror and
//! compilers to one list view:
//! - `context` - engine identity for logging
//! - `channel` - output and upstream channels
//! - `controller` - the trigger-driven state machine

pub mod channel;
pub mod context;
pub mod controller;

pub use channel::*;
pub use context::*;
pub use controller::*;
