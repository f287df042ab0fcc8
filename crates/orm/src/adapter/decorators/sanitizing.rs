//! Sanitizing stage

use crate::adapter::pipeline::{Call, Middleware, Next, NextFuture};
use crate::filter::IncludeSpec;
use modelkit_core::{ModelResult, Schema};

/// Rejects calls on undefined models and include clauses naming undefined
/// relations, and removes relation keys from write payloads since related
/// records are never stored embedded.
#[derive(Debug, Clone, Copy, Default)]
pub struct SanitizingStage;

impl Middleware for SanitizingStage {
    fn handle(&self, mut call: Call, next: Next) -> NextFuture<'static> {
        Box::pin(async move {
            let model = call.operation.model().to_string();
            call.schema().get_model(&model)?;
            tracing::trace!("SanitizingStage: {} on {:?}", call.operation.method(), model);

            if let Some(filter) = call.operation.filter() {
                check_include(call.schema(), &model, &filter.include)?;
            }

            let relations = call.schema().resolve_relations(&model)?;
            if let Some(data) = call.operation.data_mut() {
                data.retain(|key, _| !relations.contains_key(key));
            }

            next.run(call).await
        })
    }

    fn name(&self) -> &'static str {
        "SanitizingStage"
    }
}

fn check_include(schema: &Schema, model: &str, include: &[IncludeSpec]) -> ModelResult<()> {
    for spec in include {
        let relation = schema.get_relation(model, &spec.relation)?;
        relation.resolve_foreign_key(&spec.relation)?;
        schema.get_model(&relation.model)?;
        check_include(schema, &relation.model, spec.nested())?;
    }
    Ok(())
}
