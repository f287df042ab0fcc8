//! Registry of named property transformers

use super::builtin;
use modelkit_core::{FnTransformer, ModelError, ModelResult, Transformer, TransformerContext};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Name to transformer mapping consulted for `PropertyTransformer::Named`
#[derive(Clone)]
pub struct TransformerRegistry {
    transformers: HashMap<String, Arc<dyn Transformer>>,
}

impl Default for TransformerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.transformers.keys().collect();
        names.sort();
        f.debug_struct("TransformerRegistry")
            .field("transformers", &names)
            .finish()
    }
}

impl TransformerRegistry {
    /// Registry holding the built-in `trim`, `toUpperCase`, `toLowerCase`
    /// and `toTitleCase` transformers
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry
            .add_fn("trim", builtin::trim)
            .add_fn("toUpperCase", builtin::to_upper_case)
            .add_fn("toLowerCase", builtin::to_lower_case)
            .add_fn("toTitleCase", builtin::to_title_case);
        registry
    }

    pub fn empty() -> Self {
        Self {
            transformers: HashMap::new(),
        }
    }

    /// Register a transformer, replacing one with the same name
    pub fn add<T: Transformer + 'static>(
        &mut self,
        name: impl Into<String>,
        transformer: T,
    ) -> &mut Self {
        self.transformers.insert(name.into(), Arc::new(transformer));
        self
    }

    /// Register a synchronous closure as a transformer
    pub fn add_fn<F>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(Value, &Value, &TransformerContext) -> ModelResult<Value> + Send + Sync + 'static,
    {
        self.add(name, FnTransformer::new(function))
    }

    pub fn has(&self, name: &str) -> bool {
        self.transformers.contains_key(name)
    }

    /// Look up a transformer; an unknown name is a configuration error
    pub fn get(&self, name: &str) -> ModelResult<Arc<dyn Transformer>> {
        self.transformers.get(name).cloned().ok_or_else(|| {
            ModelError::invalid_argument(format!(
                "The property transformer {:?} is not defined.",
                name
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct Suffix;

    #[async_trait]
    impl Transformer for Suffix {
        async fn transform(
            &self,
            value: Value,
            options: &Value,
            _context: &TransformerContext,
        ) -> ModelResult<Value> {
            tokio::task::yield_now().await;
            let suffix = options.as_str().unwrap_or("!");
            Ok(json!(format!("{}{}", value.as_str().unwrap_or_default(), suffix)))
        }
    }

    fn context() -> TransformerContext {
        TransformerContext {
            model_name: "model".to_string(),
            property_name: "name".to_string(),
        }
    }

    #[tokio::test]
    async fn test_builtins_are_registered() {
        let registry = TransformerRegistry::new();
        let upper = registry.get("toUpperCase").unwrap();
        let value = upper.transform(json!("abc"), &Value::Null, &context()).await.unwrap();
        assert_eq!(value, json!("ABC"));
        assert!(registry.has("trim") && registry.has("toLowerCase") && registry.has("toTitleCase"));
    }

    #[tokio::test]
    async fn test_async_transformer() {
        let mut registry = TransformerRegistry::empty();
        registry.add("suffix", Suffix);
        let suffix = registry.get("suffix").unwrap();
        let value = suffix.transform(json!("a"), &json!("?"), &context()).await.unwrap();
        assert_eq!(value, json!("a?"));
    }

    #[test]
    fn test_unknown_name() {
        let err = TransformerRegistry::new().get("missing").err().unwrap();
        assert_eq!(err.to_string(), "The property transformer \"missing\" is not defined.");
    }
}
