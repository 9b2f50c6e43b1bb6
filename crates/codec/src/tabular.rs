//! Tabular fit analysis.
//!
//! A sequence qualifies for the row-per-record form only when every element
//! is a mapping over the same key set and every field is a primitive. Anything
//! else goes through the general nested form so it stays round-trip exact.

use serde_json::Value;

/// Whether `value` is a primitive (string, number, boolean or null).
pub fn is_primitive(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

/// Whether `value` is a uniform array of flat objects.
///
/// Fails closed: non-arrays, empty arrays, non-object elements, a first
/// element without keys, differing key sets and nested fields all yield
/// `false`.
pub fn is_tabular(value: &Value) -> bool {
    match value {
        Value::Array(items) => is_tabular_items(items),
        _ => false,
    }
}

pub(crate) fn is_tabular_items(items: &[Value]) -> bool {
    let Some(Value::Object(first)) = items.first() else {
        return false;
    };
    if first.is_empty() {
        return false;
    }

    items.iter().all(|item| {
        let Value::Object(fields) = item else {
            return false;
        };
        fields.len() == first.len()
            && first
                .keys()
                .all(|key| fields.get(key).is_some_and(is_primitive))
    })
}
