//! Registry of named property validators

use crate::validators::{length, pattern};
use modelkit_core::{ModelError, ModelResult, ValidatorContext, ValidatorFn};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Name to validator mapping consulted for `PropertyValidator::Named`
#[derive(Clone)]
pub struct ValidatorRegistry {
    validators: HashMap<String, ValidatorFn>,
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.validators.keys().collect();
        names.sort();
        f.debug_struct("ValidatorRegistry")
            .field("validators", &names)
            .finish()
    }
}

impl ValidatorRegistry {
    /// Registry holding the built-in `minLength`, `maxLength` and `regexp` validators
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry
            .add_fn("minLength", length::min_length())
            .add_fn("maxLength", length::max_length())
            .add_fn("regexp", pattern::regexp());
        registry
    }

    /// Registry without built-in validators
    pub fn empty() -> Self {
        Self {
            validators: HashMap::new(),
        }
    }

    /// Register a validator, replacing one with the same name
    pub fn add<F>(&mut self, name: impl Into<String>, validator: F) -> &mut Self
    where
        F: Fn(&Value, &Value, &ValidatorContext<'_>) -> ModelResult<bool> + Send + Sync + 'static,
    {
        self.add_fn(name, Arc::new(validator))
    }

    /// Register an already shared validator
    pub fn add_fn(&mut self, name: impl Into<String>, validator: ValidatorFn) -> &mut Self {
        self.validators.insert(name.into(), validator);
        self
    }

    pub fn has(&self, name: &str) -> bool {
        self.validators.contains_key(name)
    }

    /// Look up a validator; an unknown name is a configuration error
    pub fn get(&self, name: &str) -> ModelResult<ValidatorFn> {
        self.validators.get(name).cloned().ok_or_else(|| {
            ModelError::invalid_argument(format!(
                "The property validator {:?} is not defined.",
                name
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtins_are_registered() {
        let registry = ValidatorRegistry::new();
        assert!(registry.has("minLength"));
        assert!(registry.has("maxLength"));
        assert!(registry.has("regexp"));
        assert!(!ValidatorRegistry::empty().has("regexp"));
    }

    #[test]
    fn test_custom_validator() {
        let mut registry = ValidatorRegistry::empty();
        registry.add("even", |value, _, _| {
            Ok(value.as_i64().is_some_and(|n| n % 2 == 0))
        });

        let context = ValidatorContext {
            model_name: "model",
            property_name: "foo",
        };
        let even = registry.get("even").unwrap();
        assert!(even(&json!(4), &Value::Null, &context).unwrap());
        assert!(!even(&json!(3), &Value::Null, &context).unwrap());
    }

    #[test]
    fn test_unknown_name() {
        let registry = ValidatorRegistry::new();
        let err = registry.get("missing").err().unwrap();
        assert_eq!(
            err.to_string(),
            "The property validator \"missing\" is not defined."
        );
    }
}
