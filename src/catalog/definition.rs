//! Filter definitions supplied by the list view.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a filter's value is entered and matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    /// Pick one value from an enumerated set; matched by strict equality.
    #[serde(rename = "list")]
    List,
    /// Free text; matched as a case-insensitive substring.
    #[serde(rename = "input")]
    Input,
    /// A start/end pair; matched as an open interval.
    #[serde(rename = "datepicker")]
    DateRange,
}

impl FilterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::List => "list",
            FilterKind::Input => "input",
            FilterKind::DateRange => "datepicker",
        }
    }
}

/// One selectable value of a list filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOption {
    pub id: u32,
    pub name: String,
    pub display_name: String,
    pub value: Value,
}

impl FilterOption {
    pub fn new(id: u32, name: &str, display_name: &str, value: Value) -> Self {
        Self {
            id,
            name: name.to_string(),
            display_name: display_name.to_string(),
            value,
        }
    }
}

/// Static metadata describing one filterable field.
///
/// Serialized with the console's wire names (`filter_field`, `filter_type`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDefinition {
    pub id: u32,
    pub name: String,
    pub display_name: String,
    #[serde(rename = "filter_field")]
    pub field: String,
    #[serde(rename = "filter_type")]
    pub kind: FilterKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FilterOption>,
}

impl FilterDefinition {
    pub fn input(id: u32, name: &str, display_name: &str, field: &str) -> Self {
        Self::with_kind(id, name, display_name, field, FilterKind::Input)
    }

    pub fn list(
        id: u32,
        name: &str,
        display_name: &str,
        field: &str,
        options: Vec<FilterOption>,
    ) -> Self {
        Self {
            options,
            ..Self::with_kind(id, name, display_name, field, FilterKind::List)
        }
    }

    pub fn date_range(id: u32, name: &str, display_name: &str, field: &str) -> Self {
        Self::with_kind(id, name, display_name, field, FilterKind::DateRange)
    }

    fn with_kind(id: u32, name: &str, display_name: &str, field: &str, kind: FilterKind) -> Self {
        Self {
            id,
            name: name.to_string(),
            display_name: display_name.to_string(),
            field: field.to_string(),
            kind,
            options: Vec::new(),
        }
    }

    /// Find the option carrying `value`, if any.
    pub fn option_for(&self, value: &Value) -> Option<&FilterOption> {
        self.options.iter().find(|o| &o.value == value)
    }
}
