//! Server-side compilation.
//!
//! Builds the flat parameter map sent to the remote list endpoint. Text and
//! list values pass through under their field name. A complete date range
//! becomes `<field>_after` / `<field>_before` ISO-8601 timestamps; the bare
//! field is never emitted for it.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::catalog::FilterCatalog;
use crate::extraction::field_path::value_to_string;
use crate::logging::structured::LogContext;
use crate::state::{FilterSnapshot, FilterValue};
use crate::storage::persistence::{AFTER_SUFFIX, BEFORE_SUFFIX};
use crate::log_debug;

/// Query parameters for the remote list endpoint, sorted by name.
pub type QueryParams = BTreeMap<String, String>;

/// Render an instant the way query parameters carry it.
pub fn iso_timestamp(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn compile_server(
    snapshot: &FilterSnapshot,
    catalog: &FilterCatalog,
    ctx: &LogContext,
) -> QueryParams {
    let mut params = QueryParams::new();

    for (field, value) in snapshot.narrowing() {
        if catalog.by_field(field).is_none() {
            log_debug!(ctx, "COMPILE_SKIP", field = field, reason = "not_in_catalog");
            continue;
        }
        match value {
            FilterValue::Text(s) => {
                params.insert(field.clone(), s.clone());
            }
            FilterValue::Enum(Some(v)) => {
                params.insert(field.clone(), value_to_string(v));
            }
            FilterValue::DateRange(range) => {
                if let (Some(start), Some(end)) = (range.start, range.end) {
                    params.insert(format!("{}{}", field, AFTER_SUFFIX), iso_timestamp(&start));
                    params.insert(format!("{}{}", field, BEFORE_SUFFIX), iso_timestamp(&end));
                }
            }
            FilterValue::Enum(None) => {}
        }
    }

    log_debug!(ctx, "COMPILE_SERVER", params = params.keys().collect::<Vec<_>>());
    params
}
