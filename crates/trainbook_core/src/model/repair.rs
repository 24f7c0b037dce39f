//! Field-level repair helpers for persisted JSON payloads.
//!
//! Each helper coerces one key of a JSON object into the expected shape and
//! reports whether the object was modified.

use serde_json::{Map, Value};
use uuid::Uuid;

/// Generates a prefixed identifier such as `day_3f2a...`.
pub fn new_id(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

/// Non-string values become `""`.
pub(crate) fn ensure_string(map: &mut Map<String, Value>, key: &str) -> bool {
    if matches!(map.get(key), Some(Value::String(_))) {
        return false;
    }
    map.insert(key.to_string(), Value::String(String::new()));
    true
}

/// Numbers and booleans are stringified, anything else non-string becomes `""`.
pub(crate) fn ensure_text(map: &mut Map<String, Value>, key: &str) -> bool {
    match map.get_mut(key) {
        Some(value) => coerce_text(value),
        None => {
            map.insert(key.to_string(), Value::String(String::new()));
            true
        }
    }
}

/// In-place variant of [`ensure_text`] for array cells.
pub(crate) fn coerce_text(value: &mut Value) -> bool {
    let replacement = match value {
        Value::String(_) => return false,
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    };
    *value = Value::String(replacement);
    true
}

/// Missing, non-string or empty ids are regenerated.
pub(crate) fn ensure_id(map: &mut Map<String, Value>, key: &str, prefix: &str) -> bool {
    if matches!(map.get(key), Some(Value::String(id)) if !id.is_empty()) {
        return false;
    }
    map.insert(key.to_string(), Value::String(new_id(prefix)));
    true
}

/// Non-string or whitespace-only values are replaced by `fallback`.
pub(crate) fn ensure_title(map: &mut Map<String, Value>, key: &str, fallback: String) -> bool {
    if matches!(map.get(key), Some(Value::String(title)) if !title.trim().is_empty()) {
        return false;
    }
    map.insert(key.to_string(), Value::String(fallback));
    true
}

/// Non-array values become `[]`.
pub(crate) fn ensure_array(map: &mut Map<String, Value>, key: &str) -> bool {
    if matches!(map.get(key), Some(Value::Array(_))) {
        return false;
    }
    map.insert(key.to_string(), Value::Array(Vec::new()));
    true
}

/// Non-object values become `{}`.
pub(crate) fn ensure_object(map: &mut Map<String, Value>, key: &str) -> bool {
    if matches!(map.get(key), Some(Value::Object(_))) {
        return false;
    }
    map.insert(key.to_string(), Value::Object(Map::new()));
    true
}

/// Drops every non-object element of an array.
pub(crate) fn retain_objects(items: &mut Vec<Value>) -> bool {
    let before = items.len();
    items.retain(Value::is_object);
    items.len() != before
}

/// Reads a JSON number as a whole count, accepting integral floats.
///
/// Returns `None` for non-numbers and values below one.
pub(crate) fn positive_count(value: Option<&Value>) -> Option<u64> {
    let value = value?;
    if let Some(count) = value.as_u64() {
        return (count >= 1).then_some(count);
    }
    let float = value.as_f64()?;
    if float.is_finite() && float >= 1.0 {
        return Some(float.floor() as u64);
    }
    None
}

/// Lenient integer parse matching form input semantics: leading whitespace,
/// optional sign, then leading digits (`"3x"` parses as 3).
pub fn parse_leading_int(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let magnitude = rest[..digits_len].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}
