//! JSON value helpers shared by the validator, the filter engine and the adapters

use serde_json::{Map, Value};
use std::cmp::Ordering;

/// A flat mapping of property (or column) name to value
pub type Record = Map<String, Value>;

/// Compare two values for ordering purposes.
///
/// Numbers compare numerically, strings lexicographically, booleans with
/// `false < true`. `null` sorts before everything else. Values of
/// unrelated types are not comparable.
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Less),
        (_, Value::Null) => Some(Ordering::Greater),
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn compare_numbers(a: &serde_json::Number, b: &serde_json::Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return Some(a.cmp(&b));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

/// Structural equality where numbers compare by numeric value (`1 == 1.0`)
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b) == Some(Ordering::Equal),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => left == right,
    }
}

/// Canonical string key for a value, used to index stored rows and to
/// group related records. Integral floats collapse onto integers and
/// strings stay quoted, so `1`, `1.0` and `"1"` map to `1`, `1`, `"1"`.
pub fn value_key(value: &Value) -> String {
    if let Value::Number(number) = value {
        if number.as_i64().is_none() && number.as_u64().is_none() {
            if let Some(float) = number.as_f64() {
                if float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
                    return (float as i64).to_string();
                }
            }
        }
    }
    value.to_string()
}

/// Short human readable description of a value for error messages
pub fn describe_value(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Array(_)) => "Array".to_string(),
        Some(Value::Object(_)) => "Object".to_string(),
        Some(other) => other.to_string(),
    }
}
