//! Structured logging with engine context.
//!
//! Provides logging macros and utilities that include the bound entity and
//! engine id in every log message for easy correlation.

pub mod structured;

pub use structured::*;
