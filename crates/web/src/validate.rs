//! Email format check and value predicates.

use nestkit_core::Lookup;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@([A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,}$",
    )
    .expect("email pattern is valid")
});

/// Pattern test only; no DNS or mailbox lookup.
pub fn is_email(candidate: &str) -> bool {
    EMAIL.is_match(candidate)
}

/// False for the `Nothing` marker and for "empty" values.
///
/// `0` and `false` are real answers and count as acceptable.
pub fn is_acceptable(lookup: Lookup<'_, Value>) -> bool {
    match lookup {
        Lookup::Nothing => false,
        Lookup::Found(value) => is_acceptable_value(value),
    }
}

/// Rejects `null`, blank strings, and empty arrays or objects.
pub fn is_acceptable_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// JavaScript truthiness over JSON values.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
