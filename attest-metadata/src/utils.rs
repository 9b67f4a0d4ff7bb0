//! Helpers for reading metadata JSON.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{MetadataError, Result};

/// Drop every `null` member from objects, at any depth.
///
/// Metadata publishers use `null` and absence interchangeably.
pub fn filter_null_values(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, filter_null_values(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(filter_null_values).collect()),
        other => other,
    }
}

/// Top-level object of a metadata structure, with nulls removed.
pub(crate) fn object(value: &Value, what: &str) -> Result<Map<String, Value>> {
    match filter_null_values(value.clone()) {
        Value::Object(map) => Ok(map),
        _ => Err(MetadataError::StatementLoading(format!(
            "Invalid data. The {} shall be an object",
            what
        ))),
    }
}

pub(crate) fn require<'a>(map: &'a Map<String, Value>, key: &str) -> Result<&'a Value> {
    map.get(key).ok_or_else(|| {
        MetadataError::StatementLoading(format!(
            "Invalid data. The parameter \"{}\" is missing",
            key
        ))
    })
}

/// Typed read of an already-present field; the error names the field.
pub(crate) fn field<T: DeserializeOwned>(key: &str, value: &Value) -> Result<T> {
    serde_json::from_value(value.clone()).map_err(|e| {
        MetadataError::StatementLoading(format!(
            "Invalid data. The parameter \"{}\" is invalid: {}",
            key, e
        ))
    })
}

pub(crate) fn optional<T: DeserializeOwned>(
    map: &Map<String, Value>,
    key: &str,
) -> Result<Option<T>> {
    map.get(key).map(|value| field(key, value)).transpose()
}
