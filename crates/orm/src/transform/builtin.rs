//! Built-in string transformers. Non-string values pass through unchanged.

use modelkit_core::{ModelResult, TransformerContext};
use serde_json::Value;

fn map_string(value: Value, map: impl FnOnce(&str) -> String) -> Value {
    match value {
        Value::String(text) => Value::String(map(&text)),
        other => other,
    }
}

/// Registered as `trim`
pub fn trim(value: Value, _options: &Value, _context: &TransformerContext) -> ModelResult<Value> {
    Ok(map_string(value, |text| text.trim().to_string()))
}

/// Registered as `toUpperCase`
pub fn to_upper_case(
    value: Value,
    _options: &Value,
    _context: &TransformerContext,
) -> ModelResult<Value> {
    Ok(map_string(value, str::to_uppercase))
}

/// Registered as `toLowerCase`
pub fn to_lower_case(
    value: Value,
    _options: &Value,
    _context: &TransformerContext,
) -> ModelResult<Value> {
    Ok(map_string(value, str::to_lowercase))
}

/// Registered as `toTitleCase`: upper-cases the first letter of every word
/// and lower-cases the rest
pub fn to_title_case(
    value: Value,
    _options: &Value,
    _context: &TransformerContext,
) -> ModelResult<Value> {
    Ok(map_string(value, |text| {
        let mut output = String::with_capacity(text.len());
        let mut word_start = true;
        for ch in text.chars() {
            if ch.is_whitespace() {
                word_start = true;
                output.push(ch);
            } else if word_start {
                word_start = false;
                output.extend(ch.to_uppercase());
            } else {
                output.extend(ch.to_lowercase());
            }
        }
        output
    }))
}
