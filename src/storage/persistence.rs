//! Persisted filter records.
//!
//! All entities share one store entry holding a JSON object keyed by entity
//! name. Each entity maps field to value; date ranges are flattened into
//! `<field>_after` / `<field>_before` sibling keys holding ISO-8601
//! timestamps. Every mutation reads, modifies and writes the whole entry so
//! sibling entities are never clobbered.
//!
//! Keys are interpreted against the [`FilterCatalog`]: a stored key names a
//! filter by field or by name, and a suffixed key only folds into a date
//! range when the stripped key resolves to a date filter.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::catalog::{FilterCatalog, FilterDefinition, FilterKind};
use crate::error::{FilterError, Result};
use crate::extraction::field_path::parse_datetime;
use crate::logging::structured::LogContext;
use crate::state::{DateRange, FilterValue};
use crate::{log_debug, log_warn};

use super::backend::KeyValueStore;

pub const AFTER_SUFFIX: &str = "_after";
pub const BEFORE_SUFFIX: &str = "_before";

/// A persisted value, before it is matched against a definition's kind.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistedValue {
    Scalar(Value),
    DateRange(DateRange),
}

impl PersistedValue {
    pub fn from_filter_value(value: &FilterValue) -> Self {
        match value {
            FilterValue::Text(s) => PersistedValue::Scalar(Value::String(s.clone())),
            FilterValue::Enum(v) => PersistedValue::Scalar(v.clone().unwrap_or(Value::Null)),
            FilterValue::DateRange(range) => PersistedValue::DateRange(*range),
        }
    }

    /// Interpret this value for `def`. A value whose shape does not fit the
    /// definition's kind is a `TypeMismatch`.
    pub fn to_filter_value(&self, def: &FilterDefinition) -> Result<FilterValue> {
        let mismatch = |actual: &'static str| FilterError::TypeMismatch {
            field: def.field.clone(),
            expected: def.kind.as_str(),
            actual,
        };

        match (def.kind, self) {
            (FilterKind::Input, PersistedValue::Scalar(Value::String(s))) => {
                Ok(FilterValue::Text(s.clone()))
            }
            (FilterKind::Input, PersistedValue::Scalar(Value::Null)) => {
                Ok(FilterValue::Text(String::new()))
            }
            (FilterKind::Input, PersistedValue::Scalar(_)) => Err(mismatch("scalar")),
            (FilterKind::List, PersistedValue::Scalar(Value::Null)) => Ok(FilterValue::Enum(None)),
            (FilterKind::List, PersistedValue::Scalar(v)) => Ok(FilterValue::Enum(Some(v.clone()))),
            (FilterKind::DateRange, PersistedValue::DateRange(range)) => {
                Ok(FilterValue::DateRange(*range))
            }
            (_, PersistedValue::DateRange(_)) => Err(mismatch("datepicker")),
            (FilterKind::DateRange, PersistedValue::Scalar(_)) => Err(mismatch("scalar")),
        }
    }
}

/// One entity's persisted filters, keyed by logical field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedFilterRecord {
    pub fields: BTreeMap<String, PersistedValue>,
}

impl PersistedFilterRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: &str, value: PersistedValue) -> Self {
        self.fields.insert(field.to_string(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Flatten into the stored key layout.
    pub fn encode(&self) -> Map<String, Value> {
        let mut out = Map::new();
        for (field, value) in &self.fields {
            match value {
                PersistedValue::Scalar(v) => {
                    out.insert(field.clone(), v.clone());
                }
                PersistedValue::DateRange(range) => {
                    out.insert(format!("{}{}", field, AFTER_SUFFIX), encode_bound(range.start));
                    out.insert(format!("{}{}", field, BEFORE_SUFFIX), encode_bound(range.end));
                }
            }
        }
        out
    }

    /// Rebuild from the stored key layout.
    ///
    /// A key that resolves to a filter is kept as is. Otherwise an
    /// `_after`/`_before` key folds into a date range when its stripped key
    /// resolves to a date filter. A bound that is not a timestamp is read as
    /// unset. Anything else stays a scalar under its own key.
    pub fn decode(stored: &Map<String, Value>, catalog: &FilterCatalog) -> Self {
        let mut fields = BTreeMap::new();
        let mut ranges: BTreeMap<String, DateRange> = BTreeMap::new();
        for (key, value) in stored {
            if catalog.by_field_or_name(key).is_none() {
                if let Some(field) = date_prefix(catalog, key, AFTER_SUFFIX) {
                    ranges.entry(field.to_string()).or_default().start = decode_bound(value);
                    continue;
                }
                if let Some(field) = date_prefix(catalog, key, BEFORE_SUFFIX) {
                    ranges.entry(field.to_string()).or_default().end = decode_bound(value);
                    continue;
                }
            }
            fields.insert(key.clone(), PersistedValue::Scalar(value.clone()));
        }
        fields.extend(
            ranges
                .into_iter()
                .map(|(field, range)| (field, PersistedValue::DateRange(range))),
        );
        Self { fields }
    }
}

fn date_prefix<'a>(catalog: &FilterCatalog, key: &'a str, suffix: &str) -> Option<&'a str> {
    key.strip_suffix(suffix)
        .filter(|field| catalog.is_date_key(field))
}

fn encode_bound(bound: Option<DateTime<Utc>>) -> Value {
    bound
        .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)))
        .unwrap_or(Value::Null)
}

fn decode_bound(value: &Value) -> Option<DateTime<Utc>> {
    value.as_str().and_then(parse_datetime)
}

/// Reads and writes per-entity filter records in a [`KeyValueStore`].
pub struct PersistenceAdapter {
    store: Box<dyn KeyValueStore>,
    key: String,
}

impl PersistenceAdapter {
    pub fn new(store: Box<dyn KeyValueStore>, key: &str) -> Self {
        Self {
            store,
            key: key.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the record for `entity`.
    ///
    /// Missing, unreadable or corrupt data all load as `None`.
    pub fn load(
        &self,
        entity: &str,
        catalog: &FilterCatalog,
        ctx: &LogContext,
    ) -> Option<PersistedFilterRecord> {
        let entities = match self.read_entities() {
            Ok(entities) => entities,
            Err(e) => {
                log_warn!(ctx, "PERSISTED_RECORD_IGNORED", key = self.key, error = e.to_string());
                return None;
            }
        };

        match entities.get(entity) {
            Some(Value::Object(stored)) => Some(PersistedFilterRecord::decode(stored, catalog)),
            Some(other) => {
                log_warn!(
                    ctx,
                    "PERSISTED_RECORD_IGNORED",
                    key = self.key,
                    error = format!("not an object: {}", other)
                );
                None
            }
            None => None,
        }
    }

    /// Merge `record`'s fields into the entity's stored record. Any other
    /// key that stood for the same filter is replaced.
    pub fn save(
        &self,
        entity: &str,
        catalog: &FilterCatalog,
        record: &PersistedFilterRecord,
        ctx: &LogContext,
    ) -> Result<()> {
        let mut entities = self.read_entities_or_reset(ctx);

        let mut stored = match entities.remove(entity) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        for field in record.fields.keys() {
            for key in aliases(catalog, field) {
                remove_logical_field(&mut stored, &key, catalog);
            }
        }
        stored.extend(record.encode());

        if !stored.is_empty() {
            entities.insert(entity.to_string(), Value::Object(stored));
        }
        log_debug!(ctx, "PERSISTED_RECORD_SAVED", fields = record.fields.len());
        self.write_entities(entities)
    }

    /// Delete the filter stored under `field`: every key it can be stored
    /// under, each with its `_after`/`_before` pair. The entity is dropped
    /// once empty, and the store entry once no entities remain.
    pub fn remove_field(
        &self,
        entity: &str,
        catalog: &FilterCatalog,
        field: &str,
        ctx: &LogContext,
    ) -> Result<()> {
        self.remove_keys(entity, catalog, &aliases(catalog, field), ctx)
    }

    /// Delete exactly the logical keys in `keys`, with the same entity and
    /// store entry cleanup as [`remove_field`](Self::remove_field).
    pub fn remove_keys(
        &self,
        entity: &str,
        catalog: &FilterCatalog,
        keys: &[String],
        ctx: &LogContext,
    ) -> Result<()> {
        let mut entities = match self.read_entities() {
            Ok(entities) => entities,
            Err(e) => {
                log_warn!(ctx, "PERSISTED_RECORD_IGNORED", key = self.key, error = e.to_string());
                return Ok(());
            }
        };

        let Some(Value::Object(stored)) = entities.get_mut(entity) else {
            return Ok(());
        };
        let mut removed = false;
        for key in keys {
            removed |= remove_logical_field(stored, key, catalog);
        }
        if !removed {
            return Ok(());
        }
        if stored.is_empty() {
            entities.remove(entity);
        }
        log_debug!(ctx, "PERSISTED_KEYS_REMOVED", keys = keys);
        self.write_entities(entities)
    }

    fn read_entities(&self) -> Result<Map<String, Value>> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(Map::new());
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(FilterError::MalformedPersistedRecord(format!(
                "expected an object, found {}",
                other
            ))),
            Err(e) => Err(FilterError::MalformedPersistedRecord(e.to_string())),
        }
    }

    fn read_entities_or_reset(&self, ctx: &LogContext) -> Map<String, Value> {
        self.read_entities().unwrap_or_else(|e| {
            log_warn!(ctx, "PERSISTED_STORE_RESET", key = self.key, error = e.to_string());
            Map::new()
        })
    }

    fn write_entities(&self, entities: Map<String, Value>) -> Result<()> {
        if entities.is_empty() {
            return self.store.remove(&self.key);
        }
        let encoded = serde_json::to_string(&Value::Object(entities))?;
        self.store.set(&self.key, &encoded)
    }
}

/// Every key the filter behind `field` may be stored under; `field` alone
/// when no filter claims it.
fn aliases(catalog: &FilterCatalog, field: &str) -> Vec<String> {
    match catalog.by_field_or_name(field) {
        Some(def) => catalog
            .persisted_keys(def)
            .into_iter()
            .map(str::to_string)
            .collect(),
        None => vec![field.to_string()],
    }
}

/// Remove `key`, plus its date pair when it names a date filter. Returns
/// whether anything was removed.
fn remove_logical_field(stored: &mut Map<String, Value>, key: &str, catalog: &FilterCatalog) -> bool {
    let mut removed = stored.remove(key).is_some();
    if catalog.is_date_key(key) {
        removed |= stored.remove(&format!("{}{}", key, AFTER_SUFFIX)).is_some();
        removed |= stored.remove(&format!("{}{}", key, BEFORE_SUFFIX)).is_some();
    }
    removed
}
