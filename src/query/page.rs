//! Result pages exchanged with the list loader.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A `{count, results}` payload.
///
/// Keys other than `count` and `results` (pagination links and the like)
/// are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultPage {
    pub count: u64,
    pub results: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResultPage {
    pub fn new(count: u64, results: Vec<Value>) -> Self {
        Self {
            count,
            results,
            extra: Map::new(),
        }
    }

    /// A page with every record of `results` and a matching count.
    pub fn from_results(results: Vec<Value>) -> Self {
        Self::new(results.len() as u64, results)
    }

    /// Copy of this page carrying a narrowed result set.
    pub fn narrowed(&self, results: Vec<Value>) -> Self {
        Self {
            count: results.len() as u64,
            results,
            extra: self.extra.clone(),
        }
    }
}
