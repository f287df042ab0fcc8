//! Model definitions and their JSON declaration shape

use super::data_type::DataType;
use super::functions::{PropertyTransformer, PropertyValidator};
use super::property::{DefaultValue, PropertyDefinition, PropertyUniqueness};
use super::relation::{RelationDefinition, RelationType};
use crate::error::{ModelError, ModelResult};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

/// Declaration of a model
#[derive(Debug, Clone)]
pub struct ModelDefinition {
    pub name: String,
    /// Model whose properties and relations are inherited
    pub base: Option<String>,
    pub datasource: Option<String>,
    pub table_name: Option<String>,
    pub properties: BTreeMap<String, PropertyDefinition>,
    pub relations: BTreeMap<String, RelationDefinition>,
}

impl ModelDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            datasource: None,
            table_name: None,
            properties: BTreeMap::new(),
            relations: BTreeMap::new(),
        }
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn datasource(mut self, datasource: impl Into<String>) -> Self {
        self.datasource = Some(datasource.into());
        self
    }

    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn property(
        mut self,
        name: impl Into<String>,
        definition: impl Into<PropertyDefinition>,
    ) -> Self {
        self.properties.insert(name.into(), definition.into());
        self
    }

    pub fn relation(mut self, name: impl Into<String>, definition: RelationDefinition) -> Self {
        self.relations.insert(name.into(), definition);
        self
    }

    /// Check the declaration for configuration errors.
    ///
    /// Inherited members are not visible here; checks that span the
    /// hierarchy run when properties are resolved.
    pub fn validate(&self) -> ModelResult<()> {
        if self.name.trim().is_empty() {
            return Err(ModelError::invalid_argument(
                "A model definition requires a non-empty name.",
            ));
        }

        let mut primary_keys = Vec::new();
        let mut columns = HashSet::new();

        for (name, property) in &self.properties {
            if property.data_type == DataType::Array && property.item_type.is_none() {
                return Err(ModelError::invalid_argument(format!(
                    "The property {:?} of the model {:?} has the type ARRAY and requires an item type.",
                    name, self.name
                )));
            }
            if property.item_model.is_some() && property.item_type != Some(DataType::Object) {
                return Err(ModelError::invalid_argument(format!(
                    "The property {:?} of the model {:?} declares an item model, which requires the item type OBJECT.",
                    name, self.name
                )));
            }
            if property.model.is_some() && property.data_type != DataType::Object {
                return Err(ModelError::invalid_argument(format!(
                    "The property {:?} of the model {:?} declares a model, which requires the type OBJECT.",
                    name, self.name
                )));
            }
            if property.primary_key {
                primary_keys.push(name.as_str());
            }
            let column = property.column_name.as_deref().unwrap_or(name);
            if !columns.insert(column) {
                return Err(ModelError::invalid_argument(format!(
                    "The column {:?} of the model {:?} is mapped by more than one property.",
                    column, self.name
                )));
            }
        }

        if primary_keys.len() > 1 {
            return Err(ModelError::invalid_argument(format!(
                "The model {:?} has multiple primary keys: {}.",
                self.name,
                primary_keys.join(", ")
            )));
        }

        for (name, relation) in &self.relations {
            if relation.model.trim().is_empty() {
                return Err(ModelError::invalid_argument(format!(
                    "The relation {:?} of the model {:?} requires a target model name.",
                    name, self.name
                )));
            }
            relation.resolve_foreign_key(name)?;
        }

        Ok(())
    }

    /// Parse the JSON declaration shape.
    ///
    /// ```
    /// use modelkit_core::{DataType, ModelDefinition};
    /// use serde_json::json;
    ///
    /// let model = ModelDefinition::from_json(&json!({
    ///     "name": "model",
    ///     "properties": {
    ///         "title": "string",
    ///         "foo": {"type": "number", "default": 10},
    ///     },
    /// }))
    /// .unwrap();
    /// assert_eq!(model.properties["title"].data_type, DataType::String);
    /// ```
    pub fn from_json(value: &Value) -> ModelResult<Self> {
        let object = value.as_object().ok_or_else(|| {
            ModelError::invalid_argument("A model definition must be an Object.")
        })?;

        let name = required_str(object, "name", "model definition")?;
        let mut definition = ModelDefinition::new(name);
        definition.base = optional_str(object, "base")?;
        definition.datasource = optional_str(object, "datasource")?;
        definition.table_name = optional_str(object, "tableName")?;

        if let Some(properties) = object.get("properties") {
            let properties = properties.as_object().ok_or_else(|| {
                ModelError::invalid_argument(format!(
                    "The properties of the model {:?} must be an Object.",
                    definition.name
                ))
            })?;
            for (property_name, declaration) in properties {
                let property = parse_property(&definition.name, property_name, declaration)?;
                definition.properties.insert(property_name.clone(), property);
            }
        }

        if let Some(relations) = object.get("relations") {
            let relations = relations.as_object().ok_or_else(|| {
                ModelError::invalid_argument(format!(
                    "The relations of the model {:?} must be an Object.",
                    definition.name
                ))
            })?;
            for (relation_name, declaration) in relations {
                let relation = parse_relation(&definition.name, relation_name, declaration)?;
                definition.relations.insert(relation_name.clone(), relation);
            }
        }

        Ok(definition)
    }
}

fn required_str(object: &Map<String, Value>, key: &str, what: &str) -> ModelResult<String> {
    optional_str(object, key)?.ok_or_else(|| {
        ModelError::invalid_argument(format!("The {} requires the {:?} option.", what, key))
    })
}

fn optional_str(object: &Map<String, Value>, key: &str) -> ModelResult<Option<String>> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(ModelError::invalid_argument(format!(
            "The option {:?} must be a String, but {} given.",
            key, other
        ))),
    }
}

fn optional_bool(object: &Map<String, Value>, key: &str) -> ModelResult<bool> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(value)) => Ok(*value),
        Some(other) => Err(ModelError::invalid_argument(format!(
            "The option {:?} must be a Boolean, but {} given.",
            key, other
        ))),
    }
}

fn parse_data_type(value: &str) -> ModelResult<DataType> {
    value.parse()
}

fn parse_property(model: &str, name: &str, declaration: &Value) -> ModelResult<PropertyDefinition> {
    let object = match declaration {
        Value::String(tag) => return Ok(parse_data_type(tag)?.into()),
        Value::Object(object) => object,
        other => {
            return Err(ModelError::invalid_argument(format!(
                "The property {:?} of the model {:?} must be declared as a type name or an Object, but {} given.",
                name, model, other
            )))
        }
    };

    let what = format!("property {:?} of the model {:?}", name, model);
    let data_type = parse_data_type(&required_str(object, "type", &what)?)?;
    let mut property = PropertyDefinition::new(data_type);

    property.item_type = optional_str(object, "itemType")?
        .map(|tag| parse_data_type(&tag))
        .transpose()?;
    property.item_model = optional_str(object, "itemModel")?;
    property.model = optional_str(object, "model")?;
    property.column_name = optional_str(object, "columnName")?;
    property.required = optional_bool(object, "required")?;
    property.primary_key = optional_bool(object, "primaryKey")?;

    if let Some(default) = object.get("default") {
        property.default = Some(DefaultValue::Static(default.clone()));
    }

    property.unique = match object.get("unique") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => PropertyUniqueness::NonUnique,
        Some(Value::Bool(true)) => PropertyUniqueness::Strict,
        Some(Value::String(mode)) => match mode.as_str() {
            "strict" => PropertyUniqueness::Strict,
            "sparse" => PropertyUniqueness::Sparse,
            "nonUnique" => PropertyUniqueness::NonUnique,
            _ => {
                return Err(ModelError::invalid_argument(format!(
                    "The uniqueness mode {:?} of the {} is not supported.",
                    mode, what
                )))
            }
        },
        Some(other) => {
            return Err(ModelError::invalid_argument(format!(
                "The option \"unique\" of the {} must be a Boolean or a String, but {} given.",
                what, other
            )))
        }
    };

    if let Some(validate) = object.get("validate") {
        property.validate = parse_named_functions(validate, "validate", &what)?
            .into_iter()
            .map(|(name, options)| PropertyValidator::named_with(name, options))
            .collect();
    }

    if let Some(transform) = object.get("transform") {
        property.transform = parse_named_functions(transform, "transform", &what)?
            .into_iter()
            .map(|(name, options)| PropertyTransformer::named_with(name, options))
            .collect();
    }

    Ok(property)
}

/// Accepts `"name"`, `["a", {"b": options}]` and `{"a": options, "b": options}`
fn parse_named_functions(
    value: &Value,
    option: &str,
    what: &str,
) -> ModelResult<Vec<(String, Value)>> {
    let invalid = || {
        ModelError::invalid_argument(format!(
            "The option {:?} of the {} must be a String, an Array or an Object.",
            option, what
        ))
    };

    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(name) => Ok(vec![(name.clone(), Value::Null)]),
        Value::Object(entries) => Ok(entries
            .iter()
            .map(|(name, options)| (name.clone(), options.clone()))
            .collect()),
        Value::Array(items) => {
            let mut functions = Vec::new();
            for item in items {
                match item {
                    Value::String(_) | Value::Object(_) => {
                        functions.extend(parse_named_functions(item, option, what)?)
                    }
                    _ => return Err(invalid()),
                }
            }
            Ok(functions)
        }
        _ => Err(invalid()),
    }
}

fn parse_relation(model: &str, name: &str, declaration: &Value) -> ModelResult<RelationDefinition> {
    let object = declaration.as_object().ok_or_else(|| {
        ModelError::invalid_argument(format!(
            "The relation {:?} of the model {:?} must be an Object.",
            name, model
        ))
    })?;
    let what = format!("relation {:?} of the model {:?}", name, model);
    let relation_type: RelationType = required_str(object, "type", &what)?.parse()?;
    let target = required_str(object, "model", &what)?;

    let mut relation = RelationDefinition::new(relation_type, target);
    relation.foreign_key = optional_str(object, "foreignKey")?;
    Ok(relation)
}
