//! Validation stage

use crate::adapter::pipeline::{Call, Middleware, Next, NextFuture};
use modelkit_validation::DataValidator;

/// Validates write payloads. A rejected payload never reaches storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationStage;

impl Middleware for ValidationStage {
    fn handle(&self, call: Call, next: Next) -> NextFuture<'static> {
        Box::pin(async move {
            if let Some(data) = call.operation.data() {
                let context = call.context();
                DataValidator::new(&context.schema, &context.validators).validate(
                    call.operation.model(),
                    data,
                    call.operation.is_partial(),
                )?;
            }

            next.run(call).await
        })
    }

    fn name(&self) -> &'static str {
        "ValidationStage"
    }
}
