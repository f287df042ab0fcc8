//! Model data transformer
//!
//! Threads each selected property value through its declared transformer
//! chain. One property's chain runs strictly in order; chains of different
//! properties run concurrently and may settle in any order.

use super::registry::TransformerRegistry;
use futures::future::try_join_all;
use modelkit_core::{ModelResult, PropertyTransformer, Record, Schema, TransformerContext};
use serde_json::Value;

/// Applies property transformers to records
#[derive(Debug, Clone, Copy)]
pub struct DataTransformer<'a> {
    schema: &'a Schema,
    registry: &'a TransformerRegistry,
}

impl<'a> DataTransformer<'a> {
    pub fn new(schema: &'a Schema, registry: &'a TransformerRegistry) -> Self {
        Self { schema, registry }
    }

    /// Transform a record of the given model.
    ///
    /// Property selection mirrors validation: a partial transformation only
    /// touches properties present in `data`. Empty values are left as is.
    pub async fn transform(
        &self,
        model_name: &str,
        mut data: Record,
        is_partial: bool,
    ) -> ModelResult<Record> {
        let properties = self.schema.resolve_properties(model_name)?;
        let empty_values = self.schema.empty_values();

        let mut chains = Vec::new();
        for (name, property) in &properties {
            if property.transform.is_empty() || (is_partial && !data.contains_key(name)) {
                continue;
            }
            if empty_values.is_empty(property.data_type, data.get(name)) {
                continue;
            }
            if let Some(value) = data.remove(name) {
                let context = TransformerContext {
                    model_name: model_name.to_string(),
                    property_name: name.clone(),
                };
                chains.push(self.run_chain(context, &property.transform, value));
            }
        }

        if chains.is_empty() {
            return Ok(data);
        }

        tracing::trace!("Transforming {} properties of the model {:?}", chains.len(), model_name);
        for (name, value) in try_join_all(chains).await? {
            data.insert(name, value);
        }
        Ok(data)
    }

    async fn run_chain(
        &self,
        context: TransformerContext,
        chain: &[PropertyTransformer],
        mut value: Value,
    ) -> ModelResult<(String, Value)> {
        for declared in chain {
            value = match declared {
                PropertyTransformer::Named { name, options } => {
                    let transformer = self.registry.get(name)?;
                    transformer.transform(value, options, &context).await?
                }
                PropertyTransformer::Inline { transformer, .. } => {
                    transformer.transform(value, &Value::Null, &context).await?
                }
            };
        }
        Ok((context.property_name, value))
    }
}
