//! Address bar abstraction.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{FilterError, Result};

/// The page address the engine mirrors filter chips into.
pub trait AddressBar {
    fn current(&self) -> Result<String>;

    /// Replace the current address without adding a history entry.
    fn replace(&self, location: &str) -> Result<()>;
}

/// In-memory address bar. Clones share the same location.
#[derive(Debug, Clone, Default)]
pub struct MemoryAddressBar {
    location: Arc<Mutex<String>>,
    fail_replace: Arc<Mutex<bool>>,
}

impl MemoryAddressBar {
    pub fn new(location: &str) -> Self {
        Self {
            location: Arc::new(Mutex::new(location.to_string())),
            fail_replace: Arc::default(),
        }
    }

    pub fn location(&self) -> String {
        self.location.lock().clone()
    }

    /// Make every subsequent `replace` fail.
    pub fn set_fail_replace(&self, fail: bool) {
        *self.fail_replace.lock() = fail;
    }
}

impl AddressBar for MemoryAddressBar {
    fn current(&self) -> Result<String> {
        Ok(self.location())
    }

    fn replace(&self, location: &str) -> Result<()> {
        if *self.fail_replace.lock() {
            return Err(FilterError::Address("navigation rejected".to_string()));
        }
        *self.location.lock() = location.to_string();
        Ok(())
    }
}
