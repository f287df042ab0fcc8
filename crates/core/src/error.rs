//! Error types for the modelkit system
//!
//! Every failure is reported through [`ModelError`]: malformed input and
//! configuration problems are `InvalidArgument`, adapter methods that a
//! concrete adapter did not provide are `NotImplemented`.

use serde_json::Value;
use thiserror::Error;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// Error types for model operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Malformed clause, wrong property type, missing required property,
    /// duplicate key, unknown validator/transformer and similar problems
    #[error("{0}")]
    InvalidArgument(String),

    /// An adapter method was invoked on an adapter that does not provide it
    #[error("{adapter}.{method} is not implemented")]
    NotImplemented { adapter: String, method: String },
}

impl ModelError {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ModelError::InvalidArgument(message.into())
    }

    /// Create a not implemented error for the given adapter and method
    pub fn not_implemented(adapter: impl Into<String>, method: impl Into<String>) -> Self {
        ModelError::NotImplemented {
            adapter: adapter.into(),
            method: method.into(),
        }
    }

    /// Error for a model name that has no registered definition
    pub fn model_not_defined(model_name: &str) -> Self {
        Self::invalid_argument(format!("The model {:?} is not defined.", model_name))
    }

    /// Error for a lookup by an identifier that is not stored
    pub fn primary_key_not_found(model_name: &str, primary_key: &str, id: &Value) -> Self {
        Self::invalid_argument(format!(
            "The value {} of the primary key {:?} does not exist in the model {:?}.",
            id, primary_key, model_name
        ))
    }

    /// Error for an identifier that is already stored
    pub fn duplicate_primary_key(model_name: &str, primary_key: &str, id: &Value) -> Self {
        Self::invalid_argument(format!(
            "The value {} of the primary key {:?} already exists in the model {:?}.",
            id, primary_key, model_name
        ))
    }

    /// Check if this error is an invalid argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, ModelError::InvalidArgument(_))
    }

    /// Check if this error is a not implemented error
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, ModelError::NotImplemented { .. })
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::InvalidArgument(err.to_string())
    }
}
