//! Engine context management.
//!
//! Identifies one engine instance for logging and state tracking.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::logging::structured::LogContext;
use crate::query::CompilationStrategy;

/// Context for one engine bound to one list view.
#[derive(Debug, Clone)]
pub struct EngineContext {
    pub engine_id: String,
    pub entity: String,
    pub strategy: CompilationStrategy,
    pub created_at: DateTime<Utc>,
}

impl EngineContext {
    pub fn new(entity: &str, strategy: CompilationStrategy) -> Self {
        let engine_id = format!("engine-{}", &Uuid::new_v4().to_string()[..8]);

        Self {
            engine_id,
            entity: entity.to_string(),
            strategy,
            created_at: Utc::now(),
        }
    }

    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.entity, &self.engine_id)
    }
}
