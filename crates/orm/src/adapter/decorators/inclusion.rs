//! Inclusion stage and the include evaluator
//!
//! Related records are fetched with one `find` per relation through the
//! whole pipeline, so scopes get the same where/order/fields/include
//! treatment as a top-level call, then distributed to their owners.

use crate::adapter::operation::Operation;
use crate::adapter::pipeline::{Call, CallHandle, Middleware, Next, NextFuture};
use crate::filter::{slice, Filter, IncludeSpec, WhereClause};
use modelkit_core::value::value_key;
use modelkit_core::{ModelError, ModelResult, Record, RelationType};
use serde_json::Value;
use std::collections::HashMap;

/// Attaches related records named by the include clause to returned records
#[derive(Debug, Clone, Copy, Default)]
pub struct InclusionStage;

impl Middleware for InclusionStage {
    fn handle(&self, mut call: Call, next: Next) -> NextFuture<'static> {
        Box::pin(async move {
            let include = call
                .operation
                .filter_mut()
                .map(|filter| std::mem::take(&mut filter.include))
                .unwrap_or_default();
            if include.is_empty() {
                return next.run(call).await;
            }

            let model = call.operation.model().to_string();
            let max_depth = call.schema().config().max_include_depth;
            if call.depth() >= max_depth {
                return Err(ModelError::invalid_argument(format!(
                    "The include clause of the model {:?} is nested deeper than {} levels.",
                    model, max_depth
                )));
            }

            let handle = call.handle().clone();
            let mut output = next.run(call).await?;
            include_relations(&handle, &model, output.records_mut(), &include).await?;
            Ok(output)
        })
    }

    fn name(&self) -> &'static str {
        "InclusionStage"
    }
}

/// Attach every included relation to the given records of `model`
pub async fn include_relations(
    handle: &CallHandle,
    model: &str,
    records: &mut [Record],
    include: &[IncludeSpec],
) -> ModelResult<()> {
    if records.is_empty() {
        return Ok(());
    }
    for spec in include {
        include_relation(handle, model, records, spec).await?;
    }
    Ok(())
}

async fn include_relation(
    handle: &CallHandle,
    model: &str,
    records: &mut [Record],
    spec: &IncludeSpec,
) -> ModelResult<()> {
    let schema = handle.schema();
    let relation = schema.get_relation(model, &spec.relation)?;
    let foreign_key = relation.resolve_foreign_key(&spec.relation)?;
    let scope = spec.scope.clone().unwrap_or_default();
    tracing::trace!(
        "Including {} relation {:?} of the model {:?} into {} records",
        relation.relation_type,
        spec.relation,
        model,
        records.len()
    );

    match relation.relation_type {
        RelationType::BelongsTo => {
            let target_key = schema.primary_key_property_name(&relation.model)?;
            let ids = distinct(records.iter().filter_map(|record| record.get(&foreign_key)));
            let related = fetch(handle, &relation.model, &target_key, ids, &scope).await?;
            let by_id = index_by(related, &target_key);

            for record in records.iter_mut() {
                let found = record
                    .get(&foreign_key)
                    .and_then(|id| by_id.get(&value_key(id)))
                    .cloned();
                if let Some(found) = found {
                    record.insert(spec.relation.clone(), Value::Object(found));
                }
            }
        }
        RelationType::HasOne | RelationType::HasMany => {
            let owner_key = schema.primary_key_property_name(model)?;
            let ids = distinct(records.iter().filter_map(|record| record.get(&owner_key)));
            let related = fetch(handle, &relation.model, &foreign_key, ids, &scope).await?;
            let strip_key = scope
                .fields
                .as_ref()
                .is_some_and(|fields| !fields.contains(&foreign_key));

            let mut groups: HashMap<String, Vec<Record>> = HashMap::new();
            for mut item in related {
                let Some(owner) = item.get(&foreign_key).map(value_key) else {
                    continue;
                };
                if strip_key {
                    item.remove(&foreign_key);
                }
                groups.entry(owner).or_default().push(item);
            }

            for record in records.iter_mut() {
                let group = record
                    .get(&owner_key)
                    .and_then(|id| groups.get(&value_key(id)))
                    .cloned()
                    .unwrap_or_default();
                let group = slice(group, scope.skip, scope.limit);
                if relation.relation_type == RelationType::HasOne {
                    if let Some(first) = group.into_iter().next() {
                        record.insert(spec.relation.clone(), Value::Object(first));
                    }
                } else {
                    let items = group.into_iter().map(Value::Object).collect();
                    record.insert(spec.relation.clone(), Value::Array(items));
                }
            }
        }
        RelationType::ReferencesMany => {
            let target_key = schema.primary_key_property_name(&relation.model)?;
            let ids = distinct(
                records
                    .iter()
                    .filter_map(|record| record.get(&foreign_key))
                    .filter_map(Value::as_array)
                    .flatten(),
            );
            let related = fetch(handle, &relation.model, &target_key, ids, &scope).await?;
            let ordered_by_scope = !scope.order.is_empty();

            for record in records.iter_mut() {
                let referenced: Vec<String> = record
                    .get(&foreign_key)
                    .and_then(Value::as_array)
                    .map(|ids| ids.iter().map(value_key).collect())
                    .unwrap_or_default();

                let items: Vec<Record> = if ordered_by_scope {
                    related
                        .iter()
                        .filter(|item| {
                            item.get(&target_key)
                                .is_some_and(|id| referenced.contains(&value_key(id)))
                        })
                        .cloned()
                        .collect()
                } else {
                    referenced
                        .iter()
                        .filter_map(|key| {
                            related.iter().find(|item| {
                                item.get(&target_key).is_some_and(|id| &value_key(id) == key)
                            })
                        })
                        .cloned()
                        .collect()
                };

                let items = slice(items, scope.skip, scope.limit);
                record.insert(
                    spec.relation.clone(),
                    Value::Array(items.into_iter().map(Value::Object).collect()),
                );
            }
        }
    }

    Ok(())
}

/// Non-null values without duplicates, in first-seen order
fn distinct<'a>(values: impl Iterator<Item = &'a Value>) -> Vec<Value> {
    let mut seen = std::collections::HashSet::new();
    values
        .filter(|value| !value.is_null())
        .filter(|value| seen.insert(value_key(value)))
        .cloned()
        .collect()
}

fn index_by(records: Vec<Record>, key: &str) -> HashMap<String, Record> {
    records
        .into_iter()
        .filter_map(|record| Some((value_key(record.get(key)?), record)))
        .collect()
}

/// Fetch the related records whose `key` is one of `ids`, honouring the
/// scope's where, order, fields and nested include. Skip and limit apply
/// per owner and are left to the caller.
async fn fetch(
    handle: &CallHandle,
    model: &str,
    key: &str,
    ids: Vec<Value>,
    scope: &Filter,
) -> ModelResult<Vec<Record>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let key_clause = WhereClause::inq(key, ids);
    let filter = Filter {
        where_clause: Some(match &scope.where_clause {
            Some(clause) => key_clause.and(clause.clone()),
            None => key_clause,
        }),
        order: scope.order.clone(),
        fields: scope.fields.clone().map(|mut fields| {
            if !fields.iter().any(|field| field == key) {
                fields.push(key.to_string());
            }
            fields
        }),
        skip: None,
        limit: None,
        include: scope.include.clone(),
    };

    handle
        .run(Operation::Find {
            model: model.to_string(),
            filter: Some(filter),
        })
        .await?
        .into_records()
}
