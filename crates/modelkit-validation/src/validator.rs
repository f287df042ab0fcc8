//! Model data validator
//!
//! Type-checks a record against its model declaration, recursing into
//! nested models, then runs the custom validators of each property.
//! Validation stops at the first error.

use crate::registry::ValidatorRegistry;
use modelkit_core::value::describe_value;
use modelkit_core::{
    DataType, ModelError, ModelResult, PropertyDefinition, PropertyValidator, Record, Schema,
    ValidatorContext,
};
use serde_json::Value;

/// Validates records against model declarations
#[derive(Debug, Clone, Copy)]
pub struct DataValidator<'a> {
    schema: &'a Schema,
    registry: &'a ValidatorRegistry,
}

impl<'a> DataValidator<'a> {
    pub fn new(schema: &'a Schema, registry: &'a ValidatorRegistry) -> Self {
        Self { schema, registry }
    }

    /// Validate a record of the given model.
    ///
    /// A full validation considers every declared property so that missing
    /// required properties are caught; a partial validation only considers
    /// the properties present in `data`.
    pub fn validate(&self, model_name: &str, data: &Record, is_partial: bool) -> ModelResult<()> {
        let mut path = Vec::new();
        self.validate_model(model_name, data, is_partial, &mut path)
    }

    fn validate_model(
        &self,
        model_name: &str,
        data: &Record,
        is_partial: bool,
        path: &mut Vec<String>,
    ) -> ModelResult<()> {
        if path.iter().any(|visited| visited == model_name) {
            path.push(model_name.to_string());
            return Err(ModelError::invalid_argument(format!(
                "The model {:?} references itself through nested models ({}).",
                model_name,
                path.join(" -> ")
            )));
        }

        tracing::trace!(
            "Validating {} data of the model {:?}",
            if is_partial { "partial" } else { "full" },
            model_name
        );

        let properties = self.schema.resolve_properties(model_name)?;
        path.push(model_name.to_string());

        for (name, property) in &properties {
            if is_partial && !data.contains_key(name) {
                continue;
            }
            self.validate_property(model_name, name, property, data.get(name), path)?;
        }

        path.pop();
        Ok(())
    }

    fn validate_property(
        &self,
        model_name: &str,
        property_name: &str,
        property: &PropertyDefinition,
        value: Option<&Value>,
        path: &mut Vec<String>,
    ) -> ModelResult<()> {
        let value = match value {
            Some(value) if !self.is_empty(property, value) => value,
            empty => {
                if property.required {
                    return Err(ModelError::invalid_argument(format!(
                        "The property {:?} of the model {:?} is required, but {} given.",
                        property_name,
                        model_name,
                        describe_value(empty)
                    )));
                }
                return Ok(());
            }
        };

        self.check_type(model_name, property_name, property, value, path)?;
        self.run_validators(model_name, property_name, &property.validate, value)
    }

    fn is_empty(&self, property: &PropertyDefinition, value: &Value) -> bool {
        self.schema
            .empty_values()
            .is_empty(property.data_type, Some(value))
    }

    fn check_type(
        &self,
        model_name: &str,
        property_name: &str,
        property: &PropertyDefinition,
        value: &Value,
        path: &mut Vec<String>,
    ) -> ModelResult<()> {
        if !property.data_type.matches(value) {
            return Err(ModelError::invalid_argument(format!(
                "The property {:?} of the model {:?} must have {}, but {} given.",
                property_name,
                model_name,
                property.data_type.with_article(),
                describe_value(Some(value))
            )));
        }

        match (property.data_type, value) {
            (DataType::Array, Value::Array(items)) => {
                for item in items {
                    if let Some(item_type) = property.item_type {
                        if !item_type.matches(item) {
                            return Err(ModelError::invalid_argument(format!(
                                "The array property {:?} of the model {:?} must have {} element, but {} given.",
                                property_name,
                                model_name,
                                item_type.with_article(),
                                describe_value(Some(item))
                            )));
                        }
                    }
                    if let (Some(item_model), Value::Object(item)) =
                        (property.item_model.as_deref(), item)
                    {
                        self.validate_model(item_model, item, false, path)?;
                    }
                }
            }
            (DataType::Object, Value::Object(nested)) => {
                if let Some(nested_model) = property.model.as_deref() {
                    self.validate_model(nested_model, nested, false, path)?;
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn run_validators(
        &self,
        model_name: &str,
        property_name: &str,
        validators: &[PropertyValidator],
        value: &Value,
    ) -> ModelResult<()> {
        let context = ValidatorContext {
            model_name,
            property_name,
        };

        for validator in validators {
            let (function, options) = match validator {
                PropertyValidator::Named { name, options } => (self.registry.get(name)?, options),
                PropertyValidator::Inline { function, .. } => (function.clone(), &Value::Null),
            };

            if !function(value, options, &context)? {
                return Err(ModelError::invalid_argument(format!(
                    "The property {:?} of the model {:?} has an invalid value {} that caught by the validator {:?}.",
                    property_name,
                    model_name,
                    describe_value(Some(value)),
                    validator.name()
                )));
            }
        }

        Ok(())
    }
}
