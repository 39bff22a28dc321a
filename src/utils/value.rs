use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Renders a JSON value as plain text: strings as-is, everything else as its
/// compact JSON form (`4`, `true`, `null`, `["a"]`).
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// An id sent either as a JSON integer or as a numeric string.
pub fn id_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `deserialize_with` helper: unreadable or missing ids become `None`
/// instead of failing the whole document.
pub fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(id_from_value))
}
