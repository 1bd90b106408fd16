//! EntityFilter Core - Filter engine for entity list views
//!
//! This crate narrows a list view of entities (clusters, hosts, users,
//! audit records...) by user-chosen filters. The implementation prioritizes:
//!
//! 1. **Correctness** - Every output is derived from the unfiltered snapshot
//! 2. **Logging** - Every trigger logged with entity and engine context
//! 3. **Resilience** - Storage and address failures never block filtering
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `catalog` - Filter definitions available to a list view
//! - `state` - Active filters and their current values
//! - `storage` - Key-value stores and the persisted filter record
//! - `routing` - Page address synchronization on deactivation
//! - `query` - Client predicates and server query parameters
//! - `engine` - Controller state machine and output channel
//! - `extraction` - Record field paths and value coercion
//! - `config` - Engine settings
//! - `logging` - Structured logging with engine context

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod extraction;
pub mod logging;
pub mod query;
pub mod routing;
pub mod state;
pub mod storage;

pub use catalog::{FilterCatalog, FilterDefinition, FilterKind, FilterOption};
pub use config::EngineConfig;
pub use engine::{EngineOutput, EnginePhase, FilterEngineController, OutputChannel, UpstreamInbox};
pub use error::{FilterError, Result};
pub use query::{CompilationStrategy, QueryParams, ResultPage};
pub use routing::{AddressBar, MemoryAddressBar, UrlSynchronizer};
pub use state::{ActiveFilterState, DateRange, FilterValue};
pub use storage::{FileStore, KeyValueStore, MemoryStore, PersistenceAdapter};

/// Initialize the process-wide logger.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logger(level: log::LevelFilter) {
    let _ = env_logger::builder()
        .filter_level(level)
        .format_timestamp_millis()
        .try_init();
}
