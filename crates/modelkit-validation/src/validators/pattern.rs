//! Pattern-based validators using regular expressions

use modelkit_core::value::describe_value;
use modelkit_core::{ModelError, ModelResult, ValidatorContext, ValidatorFn};
use parking_lot::RwLock;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Validator for regular expression patterns
#[derive(Debug, Clone)]
pub struct PatternValidator {
    /// The regular expression pattern
    pattern: Regex,
}

impl PatternValidator {
    /// Create a new pattern validator
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// Create a case-insensitive pattern validator
    pub fn new_case_insensitive(pattern: &str) -> Result<Self, regex::Error> {
        Self::new(&format!("(?i){}", pattern))
    }

    /// Build from validator options: a pattern string or `{"pattern", "flags"}`
    pub fn from_options(options: &Value) -> ModelResult<Self> {
        let (pattern, flags) = match options {
            Value::String(pattern) => (pattern.as_str(), ""),
            Value::Object(object) => (
                object.get("pattern").and_then(Value::as_str).unwrap_or_default(),
                object.get("flags").and_then(Value::as_str).unwrap_or_default(),
            ),
            _ => ("", ""),
        };

        if pattern.is_empty() {
            return Err(ModelError::invalid_argument(format!(
                "The validator \"regexp\" requires a pattern option, but {} given.",
                options
            )));
        }

        let compiled = if flags.contains('i') {
            Self::new_case_insensitive(pattern)
        } else {
            Self::new(pattern)
        };
        compiled.map_err(|err| {
            ModelError::invalid_argument(format!(
                "The validator \"regexp\" has an invalid pattern {:?}: {}",
                pattern, err
            ))
        })
    }

    /// Check a value against the pattern. Empty values are accepted.
    pub fn check(&self, value: &Value, context: &ValidatorContext<'_>) -> ModelResult<bool> {
        match value {
            Value::Null => Ok(true),
            Value::String(text) => Ok(self.pattern.is_match(text)),
            other => Err(ModelError::invalid_argument(format!(
                "The property validator \"regexp\" requires a String value of the property {:?} of the model {:?}, but {} given.",
                context.property_name,
                context.model_name,
                describe_value(Some(other))
            ))),
        }
    }
}

/// Compiled validators keyed by their serialized options
#[derive(Debug, Default)]
pub(crate) struct PatternCache {
    compiled: RwLock<HashMap<String, PatternValidator>>,
}

impl PatternCache {
    /// Compile the pattern of the given options once and reuse it afterwards
    pub(crate) fn get(&self, options: &Value) -> ModelResult<PatternValidator> {
        let key = options.to_string();
        if let Some(validator) = self.compiled.read().get(&key) {
            return Ok(validator.clone());
        }

        let validator = PatternValidator::from_options(options)?;
        tracing::trace!("Compiled the \"regexp\" validator pattern {}", key);
        self.compiled.write().insert(key, validator.clone());
        Ok(validator)
    }

    pub(crate) fn len(&self) -> usize {
        self.compiled.read().len()
    }
}

/// Registered as `regexp`
pub fn regexp() -> ValidatorFn {
    let cache = PatternCache::default();
    Arc::new(move |value: &Value, options: &Value, context: &ValidatorContext<'_>| {
        cache.get(options)?.check(value, context)
    })
}
