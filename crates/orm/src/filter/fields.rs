//! Fields clause: projection of records onto a subset of properties

use modelkit_core::{ModelError, ModelResult, Record};
use serde_json::Value;

/// Parse a property name or an array of property names
pub fn parse_fields(value: &Value) -> ModelResult<Option<Vec<String>>> {
    let invalid = |given: &Value| {
        ModelError::invalid_argument(format!(
            "The provided option \"fields\" should be a String or an Array of String, but {} given.",
            given
        ))
    };

    match value {
        Value::Null => Ok(None),
        Value::String(field) => Ok(Some(vec![field.clone()])),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(|| invalid(item)))
            .collect::<ModelResult<Vec<_>>>()
            .map(Some),
        other => Err(invalid(other)),
    }
}

/// Keep only the selected properties of a record plus any `always` keys
/// (the primary key, included relations). Selected properties missing from
/// the record stay missing.
pub fn project(record: Record, fields: &[String], always: &[&str]) -> Record {
    record
        .into_iter()
        .filter(|(key, _)| {
            fields.iter().any(|field| field == key) || always.contains(&key.as_str())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_short_and_full_forms_are_equivalent() {
        assert_eq!(parse_fields(&json!("a")).unwrap(), parse_fields(&json!(["a"])).unwrap());
        assert_eq!(parse_fields(&Value::Null).unwrap(), None);
        assert!(parse_fields(&json!([1])).is_err());
        assert!(parse_fields(&json!(true)).is_err());
    }

    #[test]
    fn test_project_keeps_primary_key() {
        let record = json!({"id": 1, "a": 1, "b": 2, "c": 3}).as_object().cloned().unwrap();
        let projected = project(record, &["a".to_string(), "z".to_string()], &["id"]);
        assert_eq!(Value::Object(projected), json!({"id": 1, "a": 1}));
    }
}
