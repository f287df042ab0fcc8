//! Relation definitions used by the include evaluator

use crate::error::{ModelError, ModelResult};
use std::fmt;
use std::str::FromStr;

/// Kind of relation between two models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationType {
    /// The owner stores the target's primary key
    BelongsTo,
    /// The target stores the owner's primary key; at most one target
    HasOne,
    /// The target stores the owner's primary key; any number of targets
    HasMany,
    /// The owner stores an array of target primary keys
    ReferencesMany,
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelationType::BelongsTo => "belongsTo",
            RelationType::HasOne => "hasOne",
            RelationType::HasMany => "hasMany",
            RelationType::ReferencesMany => "referencesMany",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for RelationType {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        match s {
            "belongsTo" => Ok(RelationType::BelongsTo),
            "hasOne" => Ok(RelationType::HasOne),
            "hasMany" => Ok(RelationType::HasMany),
            "referencesMany" => Ok(RelationType::ReferencesMany),
            _ => Err(ModelError::invalid_argument(format!(
                "The relation type {:?} is not supported.",
                s
            ))),
        }
    }
}

/// Declaration of a relation on a model
#[derive(Debug, Clone, PartialEq)]
pub struct RelationDefinition {
    pub relation_type: RelationType,
    /// Target model name
    pub model: String,
    pub foreign_key: Option<String>,
}

impl RelationDefinition {
    pub fn belongs_to(model: impl Into<String>) -> Self {
        Self::new(RelationType::BelongsTo, model)
    }

    pub fn has_one(model: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self::new(RelationType::HasOne, model).foreign_key(foreign_key)
    }

    pub fn has_many(model: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self::new(RelationType::HasMany, model).foreign_key(foreign_key)
    }

    pub fn references_many(model: impl Into<String>) -> Self {
        Self::new(RelationType::ReferencesMany, model)
    }

    pub fn new(relation_type: RelationType, model: impl Into<String>) -> Self {
        Self {
            relation_type,
            model: model.into(),
            foreign_key: None,
        }
    }

    pub fn foreign_key(mut self, foreign_key: impl Into<String>) -> Self {
        self.foreign_key = Some(foreign_key.into());
        self
    }

    /// Foreign key property, applying the conventional default where one exists.
    ///
    /// belongsTo defaults to `<relation>Id` and referencesMany to
    /// `<relation>Ids`; hasOne and hasMany must declare theirs.
    pub fn resolve_foreign_key(&self, relation_name: &str) -> ModelResult<String> {
        if let Some(foreign_key) = &self.foreign_key {
            return Ok(foreign_key.clone());
        }
        match self.relation_type {
            RelationType::BelongsTo => Ok(format!("{}Id", relation_name)),
            RelationType::ReferencesMany => Ok(format!("{}Ids", relation_name)),
            RelationType::HasOne | RelationType::HasMany => {
                Err(ModelError::invalid_argument(format!(
                    "The relation {:?} of type {} requires a foreign key.",
                    relation_name, self.relation_type
                )))
            }
        }
    }
}
