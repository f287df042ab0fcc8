//! Model definition utilities
//!
//! Hierarchy resolution, property/column name mapping, primary key
//! resolution and default values, all evaluated against a [`Schema`].

use super::data_type::DataType;
use super::model::ModelDefinition;
use super::property::PropertyDefinition;
use super::relation::RelationDefinition;
use super::schema::Schema;
use crate::error::{ModelError, ModelResult};
use crate::value::Record;
use std::collections::{BTreeMap, HashSet};

impl Schema {
    /// Definitions of a model and its ancestors, most-derived first
    pub fn hierarchy(&self, model_name: &str) -> ModelResult<Vec<&ModelDefinition>> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(model_name);

        while let Some(name) = current {
            if !visited.insert(name) {
                return Err(ModelError::invalid_argument(format!(
                    "The model {:?} has a circular base model reference through {:?}.",
                    model_name, name
                )));
            }
            let definition = self.get_model(name)?;
            chain.push(definition);
            current = definition.base.as_deref();
        }

        Ok(chain)
    }

    /// Properties of a model merged across its base hierarchy.
    /// A derived model's declaration wins over an ancestor's.
    pub fn resolve_properties(
        &self,
        model_name: &str,
    ) -> ModelResult<BTreeMap<String, PropertyDefinition>> {
        let mut properties = BTreeMap::new();
        for definition in self.hierarchy(model_name)?.into_iter().rev() {
            for (name, property) in &definition.properties {
                properties.insert(name.clone(), property.clone());
            }
        }

        let primary_keys: Vec<&str> = properties
            .iter()
            .filter(|(_, property)| property.primary_key)
            .map(|(name, _)| name.as_str())
            .collect();
        if primary_keys.len() > 1 {
            return Err(ModelError::invalid_argument(format!(
                "The model {:?} has multiple primary keys: {}.",
                model_name,
                primary_keys.join(", ")
            )));
        }

        Ok(properties)
    }

    /// Relations of a model merged across its base hierarchy
    pub fn resolve_relations(
        &self,
        model_name: &str,
    ) -> ModelResult<BTreeMap<String, RelationDefinition>> {
        let mut relations = BTreeMap::new();
        for definition in self.hierarchy(model_name)?.into_iter().rev() {
            for (name, relation) in &definition.relations {
                relations.insert(name.clone(), relation.clone());
            }
        }
        Ok(relations)
    }

    pub fn get_relation(
        &self,
        model_name: &str,
        relation_name: &str,
    ) -> ModelResult<RelationDefinition> {
        self.resolve_relations(model_name)?
            .remove(relation_name)
            .ok_or_else(|| {
                ModelError::invalid_argument(format!(
                    "The relation {:?} of the model {:?} is not defined.",
                    relation_name, model_name
                ))
            })
    }

    /// Storage table of a model: its own or inherited table name, else the model name
    pub fn table_name(&self, model_name: &str) -> ModelResult<String> {
        let declared = self
            .hierarchy(model_name)?
            .into_iter()
            .find_map(|definition| definition.table_name.clone());
        Ok(declared.unwrap_or_else(|| model_name.to_string()))
    }

    /// The property flagged as primary key, else the conventional name
    pub fn primary_key_property_name(&self, model_name: &str) -> ModelResult<String> {
        let properties = self.resolve_properties(model_name)?;
        let declared = properties
            .into_iter()
            .find(|(_, property)| property.primary_key)
            .map(|(name, _)| name);
        Ok(declared.unwrap_or_else(|| self.config().default_primary_key.clone()))
    }

    /// Storage column of the primary key
    pub fn primary_key_column_name(&self, model_name: &str) -> ModelResult<String> {
        let property = self.primary_key_property_name(model_name)?;
        self.property_name_to_column_name(model_name, &property)
    }

    /// Declared type of the primary key; an implicit primary key is ANY
    pub fn primary_key_type(&self, model_name: &str) -> ModelResult<DataType> {
        let name = self.primary_key_property_name(model_name)?;
        let properties = self.resolve_properties(model_name)?;
        Ok(properties
            .get(&name)
            .map(|property| property.data_type)
            .unwrap_or(DataType::Any))
    }

    /// Column name of a property; identity unless a column override is declared
    pub fn property_name_to_column_name(
        &self,
        model_name: &str,
        property_name: &str,
    ) -> ModelResult<String> {
        let properties = self.resolve_properties(model_name)?;
        Ok(properties
            .get(property_name)
            .and_then(|property| property.column_name.clone())
            .unwrap_or_else(|| property_name.to_string()))
    }

    /// Property name of a column; identity unless a property maps onto it
    pub fn column_name_to_property_name(
        &self,
        model_name: &str,
        column_name: &str,
    ) -> ModelResult<String> {
        let properties = self.resolve_properties(model_name)?;
        Ok(properties
            .iter()
            .find(|(_, property)| property.column_name.as_deref() == Some(column_name))
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| column_name.to_string()))
    }

    /// Re-key a property-named record by column names
    pub fn convert_property_names_to_column_names(
        &self,
        model_name: &str,
        record: Record,
    ) -> ModelResult<Record> {
        let properties = self.resolve_properties(model_name)?;
        Ok(record
            .into_iter()
            .map(|(key, value)| {
                let column = properties
                    .get(&key)
                    .and_then(|property| property.column_name.clone())
                    .unwrap_or(key);
                (column, value)
            })
            .collect())
    }

    /// Re-key a column-named record by property names
    pub fn convert_column_names_to_property_names(
        &self,
        model_name: &str,
        record: Record,
    ) -> ModelResult<Record> {
        let properties = self.resolve_properties(model_name)?;
        Ok(record
            .into_iter()
            .map(|(key, value)| {
                let property = properties
                    .iter()
                    .find(|(_, property)| property.column_name.as_deref() == Some(key.as_str()))
                    .map(|(name, _)| name.clone())
                    .unwrap_or(key);
                (property, value)
            })
            .collect())
    }

    /// Assign declared defaults to empty properties.
    ///
    /// With `only_provided` set, properties absent from the record are left
    /// absent (patch payloads); otherwise every declared property is
    /// considered (create/replace payloads and stored rows).
    pub fn apply_defaults(
        &self,
        model_name: &str,
        mut record: Record,
        only_provided: bool,
    ) -> ModelResult<Record> {
        let properties = self.resolve_properties(model_name)?;
        for (name, property) in &properties {
            let Some(default) = &property.default else {
                continue;
            };
            if only_provided && !record.contains_key(name) {
                continue;
            }
            if self
                .empty_values()
                .is_empty(property.data_type, record.get(name))
            {
                record.insert(name.clone(), default.resolve());
            }
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use serde_json::{json, Value};

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn schema() -> Schema {
        let mut schema = Schema::new();
        schema
            .define_model(
                ModelDefinition::new("entity")
                    .table_name("entities")
                    .property("createdAt", DataType::String)
                    .property("name", PropertyDefinition::new(DataType::String).required()),
            )
            .unwrap()
            .define_model(
                ModelDefinition::new("user")
                    .base("entity")
                    .property("name", DataType::Any)
                    .property(
                        "email",
                        PropertyDefinition::new(DataType::String).column_name("email_address"),
                    )
                    .property(
                        "score",
                        PropertyDefinition::new(DataType::Number).default_value(json!(10)),
                    ),
            )
            .unwrap();
        schema
    }

    #[test]
    fn test_resolve_properties_merges_hierarchy() {
        let schema = schema();
        let properties = schema.resolve_properties("user").unwrap();
        let names: Vec<_> = properties.keys().cloned().collect();
        assert_eq!(names, vec!["createdAt", "email", "name", "score"]);
        assert_eq!(properties["name"].data_type, DataType::Any);
        assert!(!properties["name"].required);
    }

    #[test]
    fn test_circular_base_is_rejected() {
        let mut schema = Schema::new();
        schema
            .define_model(ModelDefinition::new("a").base("b"))
            .unwrap()
            .define_model(ModelDefinition::new("b").base("a"))
            .unwrap();
        let err = schema.resolve_properties("a").unwrap_err();
        assert!(err.to_string().contains("circular"));
    }

    #[test]
    fn test_table_name_is_inherited() {
        let schema = schema();
        assert_eq!(schema.table_name("user").unwrap(), "entities");
    }

    #[test]
    fn test_primary_key_resolution() {
        let mut schema =
            Schema::with_config(ModelConfig::default().with_default_primary_key("_id"));
        schema
            .define_model(ModelDefinition::new("plain"))
            .unwrap()
            .define_model(
                ModelDefinition::new("keyed").property(
                    "code",
                    PropertyDefinition::new(DataType::String)
                        .primary_key()
                        .column_name("CODE"),
                ),
            )
            .unwrap();

        assert_eq!(schema.primary_key_property_name("plain").unwrap(), "_id");
        assert_eq!(schema.primary_key_type("plain").unwrap(), DataType::Any);
        assert_eq!(schema.primary_key_property_name("keyed").unwrap(), "code");
        assert_eq!(schema.primary_key_column_name("keyed").unwrap(), "CODE");
        assert_eq!(schema.primary_key_type("keyed").unwrap(), DataType::String);
    }

    #[test]
    fn test_column_name_round_trip() {
        let schema = schema();
        let input = record(json!({"email": "a@b.c", "score": 1, "extra": true}));

        let columns = schema
            .convert_property_names_to_column_names("user", input.clone())
            .unwrap();
        assert_eq!(columns.get("email_address"), Some(&json!("a@b.c")));
        assert!(!columns.contains_key("email"));

        let properties = schema
            .convert_column_names_to_property_names("user", columns)
            .unwrap();
        assert_eq!(properties, input);
    }

    #[test]
    fn test_apply_defaults() {
        let schema = schema();

        let filled = schema.apply_defaults("user", Record::new(), false).unwrap();
        assert_eq!(filled.get("score"), Some(&json!(10)));

        let kept = schema
            .apply_defaults("user", record(json!({"score": 5})), false)
            .unwrap();
        assert_eq!(kept.get("score"), Some(&json!(5)));

        let nulled = schema
            .apply_defaults("user", record(json!({"score": null})), false)
            .unwrap();
        assert_eq!(nulled.get("score"), Some(&json!(10)));
    }

    #[test]
    fn test_apply_defaults_partial_only_touches_provided() {
        let schema = schema();

        let untouched = schema.apply_defaults("user", Record::new(), true).unwrap();
        assert!(untouched.is_empty());

        let provided = schema
            .apply_defaults("user", record(json!({"score": null})), true)
            .unwrap();
        assert_eq!(provided.get("score"), Some(&json!(10)));
    }
}
