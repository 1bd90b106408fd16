//! Filter catalog.
//!
//! Immutable, ordered set of filter definitions with lookup by id, name and
//! record field. Lookups fail closed: unknown references return `None`.

use std::collections::{BTreeSet, HashMap};

use crate::error::{FilterError, Result};
use crate::extraction::field_path::FieldPath;

use super::definition::{FilterDefinition, FilterKind};

#[derive(Debug, Clone, Default)]
pub struct FilterCatalog {
    definitions: Vec<FilterDefinition>,
    by_id: HashMap<u32, usize>,
    by_name: HashMap<String, usize>,
    by_field: HashMap<String, usize>,
}

impl FilterCatalog {
    /// Build a catalog, validating that ids, names and fields are unique,
    /// that every field nests at most one level, and that only list filters
    /// carry options.
    pub fn new(definitions: Vec<FilterDefinition>) -> Result<Self> {
        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();
        let mut by_field = HashMap::new();

        for (idx, def) in definitions.iter().enumerate() {
            FieldPath::parse(&def.field)?;

            if def.kind != FilterKind::List && !def.options.is_empty() {
                return Err(FilterError::InvalidCatalog(format!(
                    "filter '{}' is {} but declares options",
                    def.name,
                    def.kind.as_str()
                )));
            }
            if by_id.insert(def.id, idx).is_some() {
                return Err(FilterError::InvalidCatalog(format!(
                    "duplicate filter id {}",
                    def.id
                )));
            }
            if by_name.insert(def.name.clone(), idx).is_some() {
                return Err(FilterError::InvalidCatalog(format!(
                    "duplicate filter name '{}'",
                    def.name
                )));
            }
            if by_field.insert(def.field.clone(), idx).is_some() {
                return Err(FilterError::InvalidCatalog(format!(
                    "duplicate filter field '{}'",
                    def.field
                )));
            }
        }

        Ok(Self {
            definitions,
            by_id,
            by_name,
            by_field,
        })
    }

    /// Load a catalog from a JSON array of definitions.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let definitions: Vec<FilterDefinition> = serde_json::from_str(json)?;
        Self::new(definitions)
    }

    pub fn list(&self) -> &[FilterDefinition] {
        &self.definitions
    }

    pub fn by_id(&self, id: u32) -> Option<&FilterDefinition> {
        self.by_id.get(&id).map(|&idx| &self.definitions[idx])
    }

    pub fn by_name(&self, name: &str) -> Option<&FilterDefinition> {
        self.by_name.get(name).map(|&idx| &self.definitions[idx])
    }

    pub fn by_field(&self, field: &str) -> Option<&FilterDefinition> {
        self.by_field.get(field).map(|&idx| &self.definitions[idx])
    }

    /// Resolve a persisted key to a definition: field first, then name.
    pub fn by_field_or_name(&self, key: &str) -> Option<&FilterDefinition> {
        self.by_field(key).or_else(|| self.by_name(key))
    }

    /// Every persisted key [`by_field_or_name`](Self::by_field_or_name)
    /// resolves to `def`: its field, and its name unless another filter
    /// claims that name as a field.
    pub fn persisted_keys<'a>(&self, def: &'a FilterDefinition) -> Vec<&'a str> {
        let mut keys = vec![def.field.as_str()];
        if def.name != def.field && self.by_field(&def.name).is_none() {
            keys.push(def.name.as_str());
        }
        keys
    }

    /// Whether a persisted key resolves to a date range filter.
    pub fn is_date_key(&self, key: &str) -> bool {
        self.by_field_or_name(key)
            .is_some_and(|def| def.kind == FilterKind::DateRange)
    }

    /// Definitions whose ids are in `ids`, in catalog order.
    pub fn select(&self, ids: &BTreeSet<u32>) -> Vec<&FilterDefinition> {
        self.definitions
            .iter()
            .filter(|d| ids.contains(&d.id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FilterOption;
    use serde_json::json;

    fn audit_catalog() -> FilterCatalog {
        FilterCatalog::new(vec![
            FilterDefinition::input(1, "username", "Username", "username"),
            FilterDefinition::input(2, "object_name", "Object name", "audit_object/object_name"),
            FilterDefinition::list(
                3,
                "object_type",
                "Object type",
                "object_type",
                vec![FilterOption::new(1, "cluster", "Cluster", json!("cluster"))],
            ),
            FilterDefinition::date_range(6, "operation_time", "Operation time", "operation_time"),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookups() {
        let catalog = audit_catalog();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.by_id(3).map(|d| d.name.as_str()), Some("object_type"));
        assert_eq!(catalog.by_name("username").map(|d| d.id), Some(1));
        assert_eq!(
            catalog.by_field("audit_object/object_name").map(|d| d.id),
            Some(2)
        );
        assert_eq!(catalog.by_field_or_name("object_name").map(|d| d.id), Some(2));
    }

    #[test]
    fn test_unknown_lookups_fail_closed() {
        let catalog = audit_catalog();
        assert!(catalog.by_id(99).is_none());
        assert!(catalog.by_name("nope").is_none());
        assert!(catalog.by_field("nope").is_none());
    }

    #[test]
    fn test_select_keeps_catalog_order() {
        let catalog = audit_catalog();
        let ids = BTreeSet::from([6, 1]);
        let names: Vec<_> = catalog.select(&ids).iter().map(|d| d.id).collect();
        assert_eq!(names, vec![1, 6]);
    }

    #[test]
    fn test_rejects_duplicates() {
        let err = FilterCatalog::new(vec![
            FilterDefinition::input(1, "a", "A", "a"),
            FilterDefinition::input(1, "b", "B", "b"),
        ])
        .unwrap_err();
        assert!(matches!(err, FilterError::InvalidCatalog(_)));

        let err = FilterCatalog::new(vec![
            FilterDefinition::input(1, "a", "A", "shared"),
            FilterDefinition::input(2, "b", "B", "shared"),
        ])
        .unwrap_err();
        assert!(matches!(err, FilterError::InvalidCatalog(_)));
    }

    #[test]
    fn test_rejects_deep_nesting() {
        let err = FilterCatalog::new(vec![FilterDefinition::input(1, "a", "A", "x/y/z")])
            .unwrap_err();
        assert!(matches!(err, FilterError::UnknownFilterReference(_)));
    }

    #[test]
    fn test_rejects_options_on_non_list() {
        let mut def = FilterDefinition::input(1, "a", "A", "a");
        def.options.push(FilterOption::new(1, "x", "X", json!("x")));
        assert!(FilterCatalog::new(vec![def]).is_err());
    }

    #[test]
    fn test_from_json() {
        let catalog = FilterCatalog::from_json_str(
            r#"[
                {"id": 1, "name": "username", "display_name": "Username",
                 "filter_field": "username", "filter_type": "input"},
                {"id": 5, "name": "operation_result", "display_name": "Operation result",
                 "filter_field": "operation_result", "filter_type": "list",
                 "options": [{"id": 1, "name": "success", "display_name": "Success", "value": "success"}]}
            ]"#,
        )
        .unwrap();

        assert_eq!(catalog.by_id(5).unwrap().kind, FilterKind::List);
        assert_eq!(catalog.by_id(5).unwrap().options.len(), 1);
    }

    #[test]
    fn test_persisted_keys() {
        let catalog = FilterCatalog::new(vec![
            FilterDefinition::input(1, "object_name", "Object name", "audit_object/object_name"),
            FilterDefinition::input(2, "user", "User", "username"),
            // Name collides with the field of filter 2.
            FilterDefinition::input(3, "username", "Login", "login"),
        ])
        .unwrap();

        assert_eq!(
            catalog.persisted_keys(catalog.by_id(1).unwrap()),
            vec!["audit_object/object_name", "object_name"]
        );
        assert_eq!(catalog.persisted_keys(catalog.by_id(2).unwrap()), vec!["username", "user"]);
        assert_eq!(catalog.persisted_keys(catalog.by_id(3).unwrap()), vec!["login"]);
    }

    #[test]
    fn test_is_date_key() {
        let catalog = FilterCatalog::new(vec![
            FilterDefinition::date_range(1, "time", "Time", "operation_time"),
            FilterDefinition::input(2, "created_before", "Created before", "created_before"),
        ])
        .unwrap();

        assert!(catalog.is_date_key("operation_time"));
        assert!(catalog.is_date_key("time"));
        assert!(!catalog.is_date_key("created_before"));
        assert!(!catalog.is_date_key("created"));
    }
}
