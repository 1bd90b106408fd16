//! Active filter state.
//!
//! Tracks which filters are active and the value each one holds. A field has
//! a value entry exactly when its definition's id is active; activation and
//! deactivation update both sides together.

use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::FilterDefinition;
use crate::error::{FilterError, Result};

use super::value::FilterValue;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActiveFilterState {
    active_ids: BTreeSet<u32>,
    values: BTreeMap<String, FilterValue>,
}

impl ActiveFilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate `def`, seeding its value. Returns `false` if it was already
    /// active, in which case nothing changes.
    pub fn activate(&mut self, def: &FilterDefinition) -> bool {
        if !self.active_ids.insert(def.id) {
            return false;
        }
        self.values
            .insert(def.field.clone(), FilterValue::initial_for(def.kind));
        true
    }

    /// Deactivate `def`, returning the value it held.
    pub fn deactivate(&mut self, def: &FilterDefinition) -> Option<FilterValue> {
        if !self.active_ids.remove(&def.id) {
            return None;
        }
        self.values.remove(&def.field)
    }

    /// Replace the value of an active filter.
    ///
    /// Rejects values whose kind disagrees with the definition, and values
    /// for filters that are not active. State is unchanged on error.
    pub fn set_value(&mut self, def: &FilterDefinition, value: FilterValue) -> Result<()> {
        if value.kind() != def.kind {
            return Err(FilterError::TypeMismatch {
                field: def.field.clone(),
                expected: def.kind.as_str(),
                actual: value.kind().as_str(),
            });
        }
        let inactive =
            || FilterError::UnknownFilterReference(format!("filter '{}' is not active", def.name));
        if !self.active_ids.contains(&def.id) {
            return Err(inactive());
        }
        let slot = self.values.get_mut(&def.field).ok_or_else(inactive)?;
        *slot = value;
        Ok(())
    }

    /// Reset an active filter's value without deactivating it.
    pub fn clear(&mut self, def: &FilterDefinition) -> Result<()> {
        self.set_value(def, FilterValue::cleared_for(def.kind))
    }

    pub fn is_active(&self, id: u32) -> bool {
        self.active_ids.contains(&id)
    }

    pub fn value(&self, field: &str) -> Option<&FilterValue> {
        self.values.get(field)
    }

    pub fn active_ids(&self) -> &BTreeSet<u32> {
        &self.active_ids
    }

    pub fn values(&self) -> &BTreeMap<String, FilterValue> {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.active_ids.is_empty()
    }

    /// Immutable copy for compilation.
    pub fn snapshot(&self) -> FilterSnapshot {
        FilterSnapshot {
            active_ids: self.active_ids.clone(),
            values: self.values.clone(),
        }
    }
}

/// Point-in-time copy of [`ActiveFilterState`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSnapshot {
    active_ids: BTreeSet<u32>,
    values: BTreeMap<String, FilterValue>,
}

impl FilterSnapshot {
    pub fn active_ids(&self) -> &BTreeSet<u32> {
        &self.active_ids
    }

    pub fn value(&self, field: &str) -> Option<&FilterValue> {
        self.values.get(field)
    }

    /// Active fields whose values narrow a result set, in field order.
    pub fn narrowing(&self) -> impl Iterator<Item = (&String, &FilterValue)> {
        self.values.iter().filter(|(_, v)| v.narrows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FilterOption;
    use crate::state::DateRange;
    use serde_json::json;

    fn username() -> FilterDefinition {
        FilterDefinition::input(1, "username", "Username", "username")
    }

    fn object_type() -> FilterDefinition {
        FilterDefinition::list(
            2,
            "object_type",
            "Object type",
            "object_type",
            vec![FilterOption::new(3, "cluster", "Cluster", json!("cluster"))],
        )
    }

    fn operation_time() -> FilterDefinition {
        FilterDefinition::date_range(6, "operation_time", "Operation time", "operation_time")
    }

    #[test]
    fn test_activate_seeds_value() {
        let mut state = ActiveFilterState::new();
        assert!(state.activate(&username()));
        assert!(state.activate(&object_type()));

        assert!(state.is_active(1));
        assert_eq!(state.value("username"), Some(&FilterValue::Text(String::new())));
        assert_eq!(state.value("object_type"), Some(&FilterValue::Enum(None)));
    }

    #[test]
    fn test_activate_twice_is_noop() {
        let mut state = ActiveFilterState::new();
        state.activate(&username());
        state.set_value(&username(), "adm".into()).unwrap();

        assert!(!state.activate(&username()));
        assert_eq!(state.value("username"), Some(&FilterValue::from("adm")));
    }

    #[test]
    fn test_activate_deactivate_round_trip() {
        let mut state = ActiveFilterState::new();
        state.activate(&username());
        let before = state.clone();

        state.activate(&operation_time());
        let removed = state.deactivate(&operation_time());

        assert!(matches!(removed, Some(FilterValue::DateRange(_))));
        assert_eq!(state, before);
    }

    #[test]
    fn test_type_mismatch_leaves_state_unchanged() {
        let mut state = ActiveFilterState::new();
        state.activate(&object_type());
        let before = state.clone();

        let err = state
            .set_value(&object_type(), FilterValue::Text("cluster".into()))
            .unwrap_err();
        assert!(matches!(
            err,
            FilterError::TypeMismatch { expected: "list", actual: "input", .. }
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn test_set_value_on_inactive_filter() {
        let mut state = ActiveFilterState::new();
        let err = state.set_value(&username(), "adm".into()).unwrap_err();
        assert!(matches!(err, FilterError::UnknownFilterReference(_)));
        assert!(state.values().is_empty());
    }

    #[test]
    fn test_clear_keeps_filter_active() {
        let mut state = ActiveFilterState::new();
        state.activate(&operation_time());
        state.clear(&operation_time()).unwrap();

        assert!(state.is_active(6));
        assert_eq!(
            state.value("operation_time"),
            Some(&FilterValue::DateRange(DateRange::unset()))
        );
    }

    #[test]
    fn test_snapshot_narrowing() {
        let mut state = ActiveFilterState::new();
        state.activate(&username());
        state.activate(&object_type());
        state
            .set_value(&object_type(), FilterValue::Enum(Some(json!("cluster"))))
            .unwrap();

        let snapshot = state.snapshot();
        let fields: Vec<_> = snapshot.narrowing().map(|(f, _)| f.as_str()).collect();
        assert_eq!(fields, vec!["object_type"]);

        // Snapshot is detached from later edits
        state.set_value(&username(), "adm".into()).unwrap();
        assert_eq!(snapshot.value("username"), Some(&FilterValue::Text(String::new())));
    }
}
