//! Query compilation module.
//!
//! Compiles active filters into an executable form:
//! - `client` - record predicates applied to an in-memory snapshot
//! - `server` - flat parameters for a remote list endpoint

pub mod client;
pub mod page;
pub mod server;
pub mod strategy;

pub use client::*;
pub use page::*;
pub use server::*;
pub use strategy::*;
