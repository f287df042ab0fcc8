//! Default values stage

use crate::adapter::pipeline::{Call, Middleware, Next, NextFuture};
use std::collections::HashSet;

/// Fills declared defaults into write payloads on the way in and into
/// returned records on the way out.
///
/// Patch payloads only get defaults for the properties they carry. When the
/// call selects fields, returned records only get defaults for the
/// selected ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValuesStage;

impl Middleware for DefaultValuesStage {
    fn handle(&self, mut call: Call, next: Next) -> NextFuture<'static> {
        Box::pin(async move {
            let schema = call.context().schema.clone();
            let model = call.operation.model().to_string();
            let partial = call.operation.is_partial();
            let fields = call.operation.filter().and_then(|filter| filter.fields.clone());

            if let Some(data) = call.operation.data_mut() {
                *data = schema.apply_defaults(&model, std::mem::take(data), partial)?;
            }

            let mut output = next.run(call).await?;
            for record in output.records_mut() {
                let present: HashSet<String> = record.keys().cloned().collect();
                let mut filled = schema.apply_defaults(&model, std::mem::take(record), false)?;
                if let Some(fields) = &fields {
                    filled.retain(|key, _| present.contains(key) || fields.contains(key));
                }
                *record = filled;
            }
            Ok(output)
        })
    }

    fn name(&self) -> &'static str {
        "DefaultValuesStage"
    }
}
