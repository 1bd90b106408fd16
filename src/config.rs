//! # Configuration
//!
//! Engine settings are plain JSON. Every key is optional and falls back to
//! its compiled default.
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `storage_key` | `filters` | Store entry holding every entity's persisted filters |
//! | `strategy` | `client` | `client` filters in memory, `server` emits query parameters |
//! | `url_sync` | `true` | Drop removed filters from the page address |
//! | `log_level` | `info` | Level for [`init_logger`](crate::init_logger) |

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FilterError, Result};
use crate::query::CompilationStrategy;

pub const DEFAULT_STORAGE_KEY: &str = "filters";

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_url_sync() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    #[serde(default)]
    pub strategy: CompilationStrategy,

    #[serde(default = "default_url_sync")]
    pub url_sync: bool,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            strategy: CompilationStrategy::default(),
            url_sync: default_url_sync(),
            log_level: default_log_level(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage_key.trim().is_empty() {
            return Err(FilterError::Config("storage_key must not be empty".to_string()));
        }
        self.level_filter()?;
        Ok(())
    }

    /// Parsed `log_level`.
    pub fn level_filter(&self) -> Result<log::LevelFilter> {
        self.log_level
            .parse()
            .map_err(|_| FilterError::Config(format!("unknown log level '{}'", self.log_level)))
    }
}
