//! Address mirroring of active filters.
//!
//! The address after the view's base is a run of segments, each introduced
//! by `/`, `;`, `?` or `&`. When a filter is removed every segment whose text
//! mentions its field is dropped. The address is never read back into state.

use lazy_static::lazy_static;
use regex::Regex;

use super::address::AddressBar;
use crate::error::{FilterError, Result};
use crate::logging::structured::LogContext;
use crate::log_debug;

lazy_static! {
    static ref SEGMENT: Regex = Regex::new(r"([/;?&])([^/;?&]*)").unwrap();
}

pub struct UrlSynchronizer {
    base: String,
    address: Box<dyn AddressBar>,
}

impl UrlSynchronizer {
    pub fn new(base: &str, address: Box<dyn AddressBar>) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            address,
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Drop every segment mentioning `field` from the current address.
    pub fn on_deactivate(&self, field: &str, ctx: &LogContext) -> Result<()> {
        let current = self.address.current()?;
        let rewritten = strip_field_segments(&self.base, &current, field).ok_or_else(|| {
            FilterError::Address(format!(
                "location '{}' is outside base '{}'",
                current, self.base
            ))
        })?;

        if rewritten != current {
            log_debug!(ctx, "ADDRESS_REWRITTEN", from = current, to = rewritten);
            self.address.replace(&rewritten)?;
        }
        Ok(())
    }
}

/// Rewrite `location` without the segments that mention `field`.
///
/// Returns `None` when `location` does not start with `base`. If no
/// segments survive the address collapses to `base`.
pub fn strip_field_segments(base: &str, location: &str, field: &str) -> Option<String> {
    let suffix = location.strip_prefix(base)?;
    if suffix.is_empty() {
        return Some(base.to_string());
    }
    if !suffix.starts_with(['/', ';', '?', '&']) {
        return None;
    }

    let mut out = String::from(base);
    let mut in_query = false;
    for caps in SEGMENT.captures_iter(suffix) {
        let delim = &caps[1];
        let text = &caps[2];
        if text.is_empty() || text.contains(field) {
            continue;
        }
        match delim {
            "?" | "&" => {
                out.push(if in_query { '&' } else { '?' });
                in_query = true;
            }
            _ => out.push_str(delim),
        }
        out.push_str(text);
    }
    Some(out)
}
