//! Compilation strategy selection.

use serde::{Deserialize, Serialize};

/// Where matching happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompilationStrategy {
    /// Filter an in-memory snapshot of the unfiltered results.
    #[default]
    #[serde(rename = "client")]
    ClientPredicate,
    /// Emit query parameters; the remote endpoint does the matching.
    #[serde(rename = "server")]
    ServerParams,
}

impl CompilationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompilationStrategy::ClientPredicate => "client",
            CompilationStrategy::ServerParams => "server",
        }
    }
}
