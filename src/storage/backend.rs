//! Key-value store abstraction.

use crate::error::Result;

/// Durable string store the persistence adapter writes through.
///
/// This trait handles the "how" of storage (memory vs. filesystem), while
/// [`PersistenceAdapter`](super::PersistenceAdapter) handles the "what"
/// (record layout, per-entity merging). Methods take `&self`; implementations
/// use interior mutability.
pub trait KeyValueStore {
    /// Read the raw value under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Deleting an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
