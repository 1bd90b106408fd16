//! Address routing module.
//!
//! Mirrors removed filters out of the page address:
//! - `AddressBar` abstracts the page location
//! - `UrlSynchronizer` drops the segments of removed filters

pub mod address;
pub mod url_sync;

pub use address::*;
pub use url_sync::*;
