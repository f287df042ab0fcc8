//! Transformation stage

use crate::adapter::pipeline::{Call, Middleware, Next, NextFuture};
use crate::transform::DataTransformer;

/// Runs property transformers on write payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformationStage;

impl Middleware for TransformationStage {
    fn handle(&self, mut call: Call, next: Next) -> NextFuture<'static> {
        Box::pin(async move {
            let context = call.context().clone();
            let model = call.operation.model().to_string();
            let partial = call.operation.is_partial();

            if let Some(data) = call.operation.data_mut() {
                let transformer = DataTransformer::new(&context.schema, &context.transformers);
                *data = transformer
                    .transform(&model, std::mem::take(data), partial)
                    .await?;
            }

            next.run(call).await
        })
    }

    fn name(&self) -> &'static str {
        "TransformationStage"
    }
}
