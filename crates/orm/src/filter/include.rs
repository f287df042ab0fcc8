//! Include clause: relations to attach to returned records
//!
//! Accepted forms, all normalized to a list of [`IncludeSpec`]:
//! `"rel"`, `["a", "b"]`, `{"a": "nested"}`, `{"a": ["x", {"y": "z"}]}`,
//! `{"relation": "a", "scope": {..filter..}}` and arrays mixing them.

use super::Filter;
use modelkit_core::{ModelError, ModelResult};
use serde_json::Value;

/// A relation to include, with an optional filter applied to related records
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeSpec {
    pub relation: String,
    pub scope: Option<Filter>,
}

impl IncludeSpec {
    pub fn new(relation: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            scope: None,
        }
    }

    pub fn with_scope(relation: impl Into<String>, scope: Filter) -> Self {
        Self {
            relation: relation.into(),
            scope: Some(scope),
        }
    }

    /// Include clauses nested in the scope
    pub fn nested(&self) -> &[IncludeSpec] {
        self.scope
            .as_ref()
            .map(|scope| scope.include.as_slice())
            .unwrap_or_default()
    }
}

/// Parse any accepted include form
pub fn parse_include(value: &Value) -> ModelResult<Vec<IncludeSpec>> {
    match value {
        Value::Null | Value::Bool(true) => Ok(Vec::new()),
        Value::String(relation) => Ok(vec![IncludeSpec::new(relation.clone())]),
        Value::Array(items) => {
            let mut specs = Vec::new();
            for item in items {
                specs.extend(parse_include(item)?);
            }
            Ok(specs)
        }
        Value::Object(object) if object.contains_key("relation") => {
            let relation = object
                .get("relation")
                .and_then(Value::as_str)
                .filter(|relation| !relation.is_empty())
                .ok_or_else(|| {
                    ModelError::invalid_argument(format!(
                        "The provided option \"relation\" of the include clause should be a non-empty String, but {} given.",
                        value
                    ))
                })?;
            let scope = match object.get("scope") {
                None | Some(Value::Null) => None,
                Some(scope) => Some(Filter::from_json(scope)?),
            };
            Ok(vec![IncludeSpec {
                relation: relation.to_string(),
                scope,
            }])
        }
        Value::Object(object) => object
            .iter()
            .map(|(relation, nested)| {
                let include = parse_include(nested)?;
                Ok(if include.is_empty() {
                    IncludeSpec::new(relation.clone())
                } else {
                    IncludeSpec::with_scope(relation.clone(), Filter::new().include(include))
                })
            })
            .collect(),
        other => Err(ModelError::invalid_argument(format!(
            "The provided option \"include\" should have a String, an Array or an Object, but {} given.",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_and_array_forms() {
        assert_eq!(parse_include(&json!("a")).unwrap(), vec![IncludeSpec::new("a")]);
        assert_eq!(
            parse_include(&json!(["a", "b"])).unwrap(),
            vec![IncludeSpec::new("a"), IncludeSpec::new("b")]
        );
    }

    #[test]
    fn test_nested_object_form() {
        let specs = parse_include(&json!({"author": ["profile", {"posts": "comments"}]})).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].relation, "author");

        let nested = specs[0].nested();
        assert_eq!(nested[0], IncludeSpec::new("profile"));
        assert_eq!(nested[1].relation, "posts");
        assert_eq!(nested[1].nested(), &[IncludeSpec::new("comments")]);
    }

    #[test]
    fn test_scope_form() {
        let specs = parse_include(&json!({
            "relation": "posts",
            "scope": {"where": {"published": true}, "order": "title", "limit": 2, "include": "comments"}
        }))
        .unwrap();
        let scope = specs[0].scope.as_ref().unwrap();
        assert_eq!(scope.limit, Some(2));
        assert!(scope.where_clause.is_some());
        assert_eq!(specs[0].nested(), &[IncludeSpec::new("comments")]);
    }

    #[test]
    fn test_equivalent_forms() {
        assert_eq!(
            parse_include(&json!({"a": "b"})).unwrap(),
            parse_include(&json!([{"relation": "a", "scope": {"include": ["b"]}}])).unwrap()
        );
    }

    #[test]
    fn test_invalid_forms() {
        assert!(parse_include(&json!(5)).is_err());
        assert!(parse_include(&json!({"relation": 1})).is_err());
        assert!(parse_include(&json!({"relation": "a", "scope": {"limit": "x"}})).is_err());
    }
}
