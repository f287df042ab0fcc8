//! Closed set of property data types

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Data type of a declared property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DataType {
    Any,
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl DataType {
    /// All data types in declaration order
    pub const ALL: [DataType; 6] = [
        DataType::Any,
        DataType::String,
        DataType::Number,
        DataType::Boolean,
        DataType::Array,
        DataType::Object,
    ];

    /// Check whether a non-empty value has this type
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            DataType::Any => true,
            DataType::String => value.is_string(),
            DataType::Number => value.is_number(),
            DataType::Boolean => value.is_boolean(),
            DataType::Array => value.is_array(),
            DataType::Object => value.is_object(),
        }
    }

    /// Name with its indefinite article, for error messages
    pub fn with_article(&self) -> &'static str {
        match self {
            DataType::Any => "any value",
            DataType::String => "a String",
            DataType::Number => "a Number",
            DataType::Boolean => "a Boolean",
            DataType::Array => "an Array",
            DataType::Object => "an Object",
        }
    }

    /// Whether an identifier of this type can be generated automatically
    pub fn supports_generated_id(&self) -> bool {
        matches!(self, DataType::Any | DataType::Number)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Any => "ANY",
            DataType::String => "STRING",
            DataType::Number => "NUMBER",
            DataType::Boolean => "BOOLEAN",
            DataType::Array => "ARRAY",
            DataType::Object => "OBJECT",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for DataType {
    type Err = ModelError;

    fn from_str(s: &str) -> ModelResult<Self> {
        match s.to_lowercase().as_str() {
            "any" => Ok(DataType::Any),
            "string" => Ok(DataType::String),
            "number" => Ok(DataType::Number),
            "boolean" => Ok(DataType::Boolean),
            "array" => Ok(DataType::Array),
            "object" => Ok(DataType::Object),
            _ => Err(ModelError::invalid_argument(format!(
                "The data type {:?} is not supported.",
                s
            ))),
        }
    }
}

impl TryFrom<String> for DataType {
    type Error = ModelError;

    fn try_from(value: String) -> ModelResult<Self> {
        value.parse()
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.to_string().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("STRING".parse::<DataType>().unwrap(), DataType::String);
        assert_eq!("number".parse::<DataType>().unwrap(), DataType::Number);
        assert!("date".parse::<DataType>().is_err());
    }

    #[test]
    fn test_matches() {
        assert!(DataType::Any.matches(&json!({"a": 1})));
        assert!(DataType::Number.matches(&json!(1.5)));
        assert!(!DataType::Number.matches(&json!("1")));
        assert!(DataType::Object.matches(&json!({})));
        assert!(!DataType::Object.matches(&json!([])));
    }

    #[test]
    fn test_generated_id_support() {
        assert!(DataType::Number.supports_generated_id());
        assert!(DataType::Any.supports_generated_id());
        assert!(!DataType::String.supports_generated_id());
    }
}
