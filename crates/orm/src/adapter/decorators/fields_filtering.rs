//! Fields filtering stage

use crate::adapter::pipeline::{Call, Middleware, Next, NextFuture};
use crate::filter::project;

/// Projects returned records onto the selected fields.
///
/// The selection is taken out of the call so inner stages and storage see
/// whole records (inclusion needs the joining keys). The primary key and
/// included relations are always kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldsFilteringStage;

impl Middleware for FieldsFilteringStage {
    fn handle(&self, mut call: Call, next: Next) -> NextFuture<'static> {
        Box::pin(async move {
            let Some(fields) = call
                .operation
                .filter_mut()
                .and_then(|filter| filter.fields.take())
            else {
                return next.run(call).await;
            };

            let model = call.operation.model().to_string();
            let mut always = vec![call.schema().primary_key_property_name(&model)?];
            if let Some(filter) = call.operation.filter() {
                always.extend(filter.include.iter().map(|spec| spec.relation.clone()));
            }

            let mut output = next.run(call).await?;
            let always: Vec<&str> = always.iter().map(String::as_str).collect();
            for record in output.records_mut() {
                *record = project(std::mem::take(record), &fields, &always);
            }
            Ok(output)
        })
    }

    fn name(&self) -> &'static str {
        "FieldsFilteringStage"
    }
}
