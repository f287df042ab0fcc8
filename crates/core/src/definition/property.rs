//! Property definitions

use super::data_type::DataType;
use super::functions::{PropertyTransformer, PropertyValidator};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Default value of a property: a static value or a factory
#[derive(Clone)]
pub enum DefaultValue {
    Static(Value),
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    /// Produce the value to assign
    pub fn resolve(&self) -> Value {
        match self {
            DefaultValue::Static(value) => value.clone(),
            DefaultValue::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Static(value) => f.debug_tuple("Static").field(value).finish(),
            DefaultValue::Factory(_) => f.write_str("Factory"),
        }
    }
}

/// Uniqueness constraint of a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropertyUniqueness {
    #[default]
    NonUnique,
    /// Every value, empty ones included, must be unique
    Strict,
    /// Empty values are exempt from the check
    Sparse,
}

/// Declaration of a single model property
#[derive(Debug, Clone)]
pub struct PropertyDefinition {
    pub data_type: DataType,
    pub item_type: Option<DataType>,
    pub item_model: Option<String>,
    pub model: Option<String>,
    pub required: bool,
    pub default: Option<DefaultValue>,
    pub column_name: Option<String>,
    pub primary_key: bool,
    pub unique: PropertyUniqueness,
    pub validate: Vec<PropertyValidator>,
    pub transform: Vec<PropertyTransformer>,
}

impl PropertyDefinition {
    /// Create a property of the given type with no further constraints
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            item_type: None,
            item_model: None,
            model: None,
            required: false,
            default: None,
            column_name: None,
            primary_key: false,
            unique: PropertyUniqueness::NonUnique,
            validate: Vec::new(),
            transform: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn unique(mut self, uniqueness: PropertyUniqueness) -> Self {
        self.unique = uniqueness;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(DefaultValue::Static(value));
        self
    }

    pub fn default_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Factory(Arc::new(factory)));
        self
    }

    pub fn column_name(mut self, column: impl Into<String>) -> Self {
        self.column_name = Some(column.into());
        self
    }

    pub fn item_type(mut self, item_type: DataType) -> Self {
        self.item_type = Some(item_type);
        self
    }

    /// Array items are objects validated against another model
    pub fn item_model(mut self, model: impl Into<String>) -> Self {
        self.item_model = Some(model.into());
        self
    }

    /// Object value validated against another model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn validator(mut self, validator: PropertyValidator) -> Self {
        self.validate.push(validator);
        self
    }

    pub fn transformer(mut self, transformer: PropertyTransformer) -> Self {
        self.transform.push(transformer);
        self
    }

    /// Name of the nested model the value (or its items) must satisfy
    pub fn nested_model(&self) -> Option<&str> {
        match self.data_type {
            DataType::Object => self.model.as_deref(),
            DataType::Array => self.item_model.as_deref(),
            _ => None,
        }
    }
}

/// Short form: a bare type tag
impl From<DataType> for PropertyDefinition {
    fn from(data_type: DataType) -> Self {
        PropertyDefinition::new(data_type)
    }
}
