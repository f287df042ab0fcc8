//! Length-based validators for strings and arrays

use modelkit_core::value::describe_value;
use modelkit_core::{ModelError, ModelResult, ValidatorContext, ValidatorFn};
use serde_json::Value;
use std::sync::Arc;

/// Validator for string/array length constraints
#[derive(Debug, Clone, Default)]
pub struct LengthValidator {
    /// Minimum length (inclusive)
    pub min: Option<usize>,
    /// Maximum length (inclusive)
    pub max: Option<usize>,
}

impl LengthValidator {
    /// Create a new length validator with no constraints
    pub fn new() -> Self {
        Self::default()
    }

    /// Set minimum length constraint
    pub fn min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    /// Set maximum length constraint
    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    /// Get the length of a value (supports strings and arrays)
    fn get_length(value: &Value) -> Option<usize> {
        match value {
            Value::String(s) => Some(s.chars().count()), // Unicode-aware length
            Value::Array(arr) => Some(arr.len()),
            _ => None,
        }
    }

    /// Check a value against the constraints. Empty values are accepted;
    /// required-ness is checked separately.
    pub fn check(
        &self,
        name: &str,
        value: &Value,
        context: &ValidatorContext<'_>,
    ) -> ModelResult<bool> {
        if value.is_null() {
            return Ok(true);
        }

        let length = Self::get_length(value).ok_or_else(|| {
            ModelError::invalid_argument(format!(
                "The property validator {:?} requires a String or an Array value of the property {:?} of the model {:?}, but {} given.",
                name,
                context.property_name,
                context.model_name,
                describe_value(Some(value))
            ))
        })?;

        let above_min = self.min.map_or(true, |min| length >= min);
        let below_max = self.max.map_or(true, |max| length <= max);
        Ok(above_min && below_max)
    }
}

fn length_option(name: &str, options: &Value) -> ModelResult<usize> {
    options
        .as_u64()
        .map(|length| length as usize)
        .ok_or_else(|| {
            ModelError::invalid_argument(format!(
                "The validator {:?} requires a non-negative integer option, but {} given.",
                name, options
            ))
        })
}

/// Registered as `minLength`; options: the minimum length
pub fn min_length() -> ValidatorFn {
    Arc::new(|value: &Value, options: &Value, context: &ValidatorContext<'_>| {
        let min = length_option("minLength", options)?;
        LengthValidator::new().min(min).check("minLength", value, context)
    })
}

/// Registered as `maxLength`; options: the maximum length
pub fn max_length() -> ValidatorFn {
    Arc::new(|value: &Value, options: &Value, context: &ValidatorContext<'_>| {
        let max = length_option("maxLength", options)?;
        LengthValidator::new().max(max).check("maxLength", value, context)
    })
}
