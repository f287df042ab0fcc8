//! Definition registry
//!
//! Holds validated model declarations together with the configuration and
//! empty-value rules every other component consults.

use super::empty_values::EmptyValues;
use super::model::ModelDefinition;
use crate::config::ModelConfig;
use crate::error::{ModelError, ModelResult};
use serde_json::Value;
use std::collections::HashMap;

/// Registry of model definitions
#[derive(Debug, Clone, Default)]
pub struct Schema {
    models: HashMap<String, ModelDefinition>,
    empty_values: EmptyValues,
    config: ModelConfig,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ModelConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn empty_values(&self) -> &EmptyValues {
        &self.empty_values
    }

    pub fn empty_values_mut(&mut self) -> &mut EmptyValues {
        &mut self.empty_values
    }

    /// Register a model, replacing any previous declaration with the same name
    pub fn define_model(&mut self, definition: ModelDefinition) -> ModelResult<&mut Self> {
        definition.validate()?;
        tracing::debug!("Defining model {:?}", definition.name);
        self.models.insert(definition.name.clone(), definition);
        Ok(self)
    }

    /// Parse and register a model from its JSON declaration
    pub fn define_model_json(&mut self, declaration: &Value) -> ModelResult<&mut Self> {
        self.define_model(ModelDefinition::from_json(declaration)?)
    }

    pub fn has_model(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn get_model(&self, name: &str) -> ModelResult<&ModelDefinition> {
        self.models
            .get(name)
            .ok_or_else(|| ModelError::model_not_defined(name))
    }

    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }
}
