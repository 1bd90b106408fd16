//! Client-side compilation.
//!
//! Turns the active filters into record predicates and applies them to the
//! unfiltered snapshot:
//! 1. Drop active filters whose value does not narrow (empty text, no
//!    option picked, date range missing a bound)
//! 2. Nothing left: return the snapshot unchanged, count included
//! 3. List filters: strict equality with the record field
//! 4. Input filters: case-insensitive substring of the record field
//! 5. Date filters: record instant strictly inside (start, end)
//!
//! A record lacking a targeted field never matches.

use serde_json::Value;

use crate::catalog::{FilterCatalog, FilterKind};
use crate::extraction::field_path::{value_to_datetime, value_to_text, FieldPath};
use crate::logging::structured::LogContext;
use crate::state::{DateRange, FilterSnapshot, FilterValue};
use crate::log_debug;

use super::page::ResultPage;

/// A compiled test against one record field.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals { path: FieldPath, value: Value },
    Contains { path: FieldPath, needle: String },
    Within { path: FieldPath, range: DateRange },
}

impl Predicate {
    /// Compile one active filter value; `None` when it does not narrow.
    pub fn compile(path: FieldPath, value: &FilterValue) -> Option<Self> {
        if !value.narrows() {
            return None;
        }
        match value {
            FilterValue::Enum(Some(v)) => Some(Predicate::Equals {
                path,
                value: v.clone(),
            }),
            FilterValue::Text(s) => Some(Predicate::Contains {
                path,
                needle: s.to_lowercase(),
            }),
            FilterValue::DateRange(range) => Some(Predicate::Within {
                path,
                range: *range,
            }),
            FilterValue::Enum(None) => None,
        }
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            Predicate::Equals { .. } => FilterKind::List,
            Predicate::Contains { .. } => FilterKind::Input,
            Predicate::Within { .. } => FilterKind::DateRange,
        }
    }

    fn phase(&self) -> u8 {
        match self.kind() {
            FilterKind::List => 0,
            FilterKind::Input => 1,
            FilterKind::DateRange => 2,
        }
    }

    pub fn matches(&self, record: &Value) -> bool {
        match self {
            Predicate::Equals { path, value } => path.resolve(record).is_ok_and(|v| v == value),
            Predicate::Contains { path, needle } => path
                .resolve(record)
                .ok()
                .and_then(value_to_text)
                .is_some_and(|text| text.to_lowercase().contains(needle.as_str())),
            Predicate::Within { path, range } => path
                .resolve(record)
                .ok()
                .and_then(value_to_datetime)
                .is_some_and(|instant| range.contains(&instant)),
        }
    }
}

/// Compile the narrowing filters of `snapshot`, list filters first, then
/// input, then date.
pub fn compile_predicates(
    snapshot: &FilterSnapshot,
    catalog: &FilterCatalog,
    ctx: &LogContext,
) -> Vec<Predicate> {
    let mut predicates: Vec<Predicate> = snapshot
        .narrowing()
        .filter_map(|(field, value)| {
            let Some(def) = catalog.by_field(field) else {
                log_debug!(ctx, "COMPILE_SKIP", field = field, reason = "not_in_catalog");
                return None;
            };
            let path = match FieldPath::parse(&def.field) {
                Ok(path) => path,
                Err(e) => {
                    log_debug!(ctx, "COMPILE_SKIP", field = field, reason = e.to_string());
                    return None;
                }
            };
            Predicate::compile(path, value)
        })
        .collect();
    predicates.sort_by_key(Predicate::phase);
    predicates
}

/// Apply the active filters to `backup`.
///
/// The result is always derived from `backup`, never from an earlier
/// output, and its records are a subsequence of `backup.results`.
pub fn compile_client(
    backup: &ResultPage,
    snapshot: &FilterSnapshot,
    catalog: &FilterCatalog,
    ctx: &LogContext,
) -> ResultPage {
    let predicates = compile_predicates(snapshot, catalog, ctx);

    if predicates.is_empty() {
        log_debug!(ctx, "COMPILE_CLIENT", filters = 0, count = backup.count);
        return backup.clone();
    }

    let results: Vec<Value> = backup
        .results
        .iter()
        .filter(|record| predicates.iter().all(|p| p.matches(record)))
        .cloned()
        .collect();

    log_debug!(
        ctx,
        "COMPILE_CLIENT",
        filters = predicates.len(),
        before = backup.results.len(),
        after = results.len()
    );

    backup.narrowed(results)
}
