//! Property validator and transformer declarations
//!
//! A property may reference registered functions by name or carry its own
//! function inline. Named references are resolved against the validator and
//! transformer registries when data is processed, not when the model is
//! declared.

use crate::error::ModelResult;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Where a validator is being applied
#[derive(Debug, Clone, Copy)]
pub struct ValidatorContext<'a> {
    pub model_name: &'a str,
    pub property_name: &'a str,
}

/// Synchronous validator: `Ok(true)` accepts the value, `Ok(false)` rejects it.
/// An `Err` reports a configuration problem such as malformed options.
pub type ValidatorFn =
    Arc<dyn Fn(&Value, &Value, &ValidatorContext<'_>) -> ModelResult<bool> + Send + Sync>;

/// A validator declared on a property
#[derive(Clone)]
pub enum PropertyValidator {
    /// Looked up in the validator registry
    Named { name: String, options: Value },
    /// Invoked directly
    Inline { name: String, function: ValidatorFn },
}

impl PropertyValidator {
    /// Reference a registered validator without options
    pub fn named(name: impl Into<String>) -> Self {
        PropertyValidator::Named {
            name: name.into(),
            options: Value::Null,
        }
    }

    /// Reference a registered validator with options
    pub fn named_with(name: impl Into<String>, options: Value) -> Self {
        PropertyValidator::Named {
            name: name.into(),
            options,
        }
    }

    /// Declare an inline validator
    pub fn inline<F>(name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&Value, &Value, &ValidatorContext<'_>) -> ModelResult<bool> + Send + Sync + 'static,
    {
        PropertyValidator::Inline {
            name: name.into(),
            function: Arc::new(function),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PropertyValidator::Named { name, .. } | PropertyValidator::Inline { name, .. } => name,
        }
    }
}

impl fmt::Debug for PropertyValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValidator::Named { name, options } => f
                .debug_struct("Named")
                .field("name", name)
                .field("options", options)
                .finish(),
            PropertyValidator::Inline { name, .. } => {
                f.debug_struct("Inline").field("name", name).finish()
            }
        }
    }
}

/// Where a transformer is being applied
#[derive(Debug, Clone)]
pub struct TransformerContext {
    pub model_name: String,
    pub property_name: String,
}

/// Value transformer. Transformers are asynchronous; a chain declared on
/// one property runs strictly in order.
#[async_trait]
pub trait Transformer: Send + Sync {
    async fn transform(
        &self,
        value: Value,
        options: &Value,
        context: &TransformerContext,
    ) -> ModelResult<Value>;
}

/// Adapts a synchronous closure to the [`Transformer`] trait
pub struct FnTransformer<F> {
    function: F,
}

impl<F> FnTransformer<F>
where
    F: Fn(Value, &Value, &TransformerContext) -> ModelResult<Value> + Send + Sync,
{
    pub fn new(function: F) -> Self {
        Self { function }
    }
}

#[async_trait]
impl<F> Transformer for FnTransformer<F>
where
    F: Fn(Value, &Value, &TransformerContext) -> ModelResult<Value> + Send + Sync,
{
    async fn transform(
        &self,
        value: Value,
        options: &Value,
        context: &TransformerContext,
    ) -> ModelResult<Value> {
        (self.function)(value, options, context)
    }
}

/// A transformer declared on a property
#[derive(Clone)]
pub enum PropertyTransformer {
    /// Looked up in the transformer registry
    Named { name: String, options: Value },
    /// Invoked directly
    Inline {
        name: String,
        transformer: Arc<dyn Transformer>,
    },
}

impl PropertyTransformer {
    /// Reference a registered transformer without options
    pub fn named(name: impl Into<String>) -> Self {
        PropertyTransformer::Named {
            name: name.into(),
            options: Value::Null,
        }
    }

    /// Reference a registered transformer with options
    pub fn named_with(name: impl Into<String>, options: Value) -> Self {
        PropertyTransformer::Named {
            name: name.into(),
            options,
        }
    }

    /// Declare an inline transformer
    pub fn inline<T: Transformer + 'static>(name: impl Into<String>, transformer: T) -> Self {
        PropertyTransformer::Inline {
            name: name.into(),
            transformer: Arc::new(transformer),
        }
    }

    /// Declare an inline synchronous transformer from a closure
    pub fn inline_fn<F>(name: impl Into<String>, function: F) -> Self
    where
        F: Fn(Value, &Value, &TransformerContext) -> ModelResult<Value> + Send + Sync + 'static,
    {
        Self::inline(name, FnTransformer::new(function))
    }

    pub fn name(&self) -> &str {
        match self {
            PropertyTransformer::Named { name, .. } | PropertyTransformer::Inline { name, .. } => {
                name
            }
        }
    }
}

impl fmt::Debug for PropertyTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyTransformer::Named { name, options } => f
                .debug_struct("Named")
                .field("name", name)
                .field("options", options)
                .finish(),
            PropertyTransformer::Inline { name, .. } => {
                f.debug_struct("Inline").field("name", name).finish()
            }
        }
    }
}
