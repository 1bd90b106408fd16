//! Filter values.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::catalog::FilterKind;

/// A start/end pair for date filters. Either bound may be unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn unset() -> Self {
        Self::default()
    }

    /// Both bounds at the current instant; the seed for a newly activated
    /// date filter.
    pub fn today() -> Self {
        let now = Utc::now();
        Self::new(now, now)
    }

    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    pub fn is_unset(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Open-interval membership. An incomplete range contains nothing.
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start < *instant && *instant < end,
            _ => false,
        }
    }

    /// Midnight UTC at the start of `date`.
    pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
        Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
    }

    /// The last millisecond of `date` (23:59:59.999 UTC).
    ///
    /// Day pickers use this for the end bound so the selected day is
    /// included; compilation itself never adjusts bounds.
    pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
        Self::start_of_day(date) + chrono::Duration::days(1) - chrono::Duration::milliseconds(1)
    }
}

/// The value held by an active filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Free text for `Input` filters.
    Text(String),
    /// Selected option value for `List` filters; `None` until one is picked.
    Enum(Option<Value>),
    DateRange(DateRange),
}

impl FilterValue {
    /// Value seeded on activation.
    pub fn initial_for(kind: FilterKind) -> Self {
        match kind {
            FilterKind::Input => FilterValue::Text(String::new()),
            FilterKind::List => FilterValue::Enum(None),
            FilterKind::DateRange => FilterValue::DateRange(DateRange::today()),
        }
    }

    /// Value after the user clears the input; the filter stays active.
    pub fn cleared_for(kind: FilterKind) -> Self {
        match kind {
            FilterKind::DateRange => FilterValue::DateRange(DateRange::unset()),
            other => Self::initial_for(other),
        }
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            FilterValue::Text(_) => FilterKind::Input,
            FilterValue::Enum(_) => FilterKind::List,
            FilterValue::DateRange(_) => FilterKind::DateRange,
        }
    }

    /// Whether this value narrows a result set at all.
    ///
    /// Empty text, an unpicked or blank option, and a date range missing
    /// either bound do not filter.
    pub fn narrows(&self) -> bool {
        match self {
            FilterValue::Text(s) => !s.is_empty(),
            FilterValue::Enum(None) | FilterValue::Enum(Some(Value::Null)) => false,
            FilterValue::Enum(Some(Value::String(s))) => !s.is_empty(),
            FilterValue::Enum(Some(_)) => true,
            FilterValue::DateRange(range) => range.is_complete(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<DateRange> for FilterValue {
    fn from(range: DateRange) -> Self {
        FilterValue::DateRange(range)
    }
}
