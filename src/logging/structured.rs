//! Structured logging utilities.
//!
//! Provides context-aware logging with the bound entity and engine id
//! included in every log message.

use std::fmt;

/// Logging context for one engine instance.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub entity: String,
    pub engine_id: String,
    pub field: Option<String>,
}

impl LogContext {
    pub fn new(entity: &str, engine_id: &str) -> Self {
        Self {
            entity: entity.to_string(),
            engine_id: engine_id.to_string(),
            field: None,
        }
    }

    pub fn with_field(&self, field: &str) -> Self {
        Self {
            entity: self.entity.clone(),
            engine_id: self.engine_id.clone(),
            field: Some(field.to_string()),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(
                f,
                "[entity={}] [engine={}] [field={}]",
                self.entity, self.engine_id, field
            ),
            None => write!(f, "[entity={}] [engine={}]", self.entity, self.engine_id),
        }
    }
}

/// Log an info message with context.
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::info!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*) $(, $value)*)
        );
    };
}

/// Log a warning message with context.
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::warn!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*) $(, $value)*)
        );
    };
}

/// Log a debug message with context.
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::debug!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*) $(, $value)*)
        );
    };
}
