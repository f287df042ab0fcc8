//! Uniqueness stage

use crate::adapter::operation::Operation;
use crate::adapter::pipeline::{Call, Middleware, Next, NextFuture};
use crate::adapter::Adapter;
use crate::filter::{Filter, Operator, WhereClause};
use modelkit_core::value::describe_value;
use modelkit_core::{DataType, ModelError, ModelResult, PropertyUniqueness, Record, Schema};
use serde_json::Value;

/// Rejects write payloads that would duplicate the value of a unique
/// property. Existing records are counted through the undecorated adapter;
/// the records being replaced or patched are excluded from the count.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniquenessStage;

struct UniqueProperty {
    name: String,
    uniqueness: PropertyUniqueness,
    data_type: DataType,
}

impl Middleware for UniquenessStage {
    fn handle(&self, call: Call, next: Next) -> NextFuture<'static> {
        Box::pin(async move {
            if call.operation.data().is_some() {
                let checker = UniquenessChecker::new(call.schema(), call.operation.model())?;
                if !checker.properties.is_empty() {
                    let storage = call.storage();
                    checker.check(storage.as_ref(), &call.operation).await?;
                }
            }

            next.run(call).await
        })
    }

    fn name(&self) -> &'static str {
        "UniquenessStage"
    }
}

struct UniquenessChecker<'a> {
    schema: &'a Schema,
    model: &'a str,
    primary_key: String,
    properties: Vec<UniqueProperty>,
}

impl<'a> UniquenessChecker<'a> {
    fn new(schema: &'a Schema, model: &'a str) -> ModelResult<Self> {
        let properties = schema
            .resolve_properties(model)?
            .into_iter()
            .filter(|(_, property)| property.unique != PropertyUniqueness::NonUnique)
            .map(|(name, property)| UniqueProperty {
                name,
                uniqueness: property.unique,
                data_type: property.data_type,
            })
            .collect();

        Ok(Self {
            schema,
            model,
            primary_key: schema.primary_key_property_name(model)?,
            properties,
        })
    }

    async fn check(&self, storage: &dyn Adapter, operation: &Operation) -> ModelResult<()> {
        match operation {
            Operation::Create { data, .. } => {
                self.check_data(storage, data, false, Vec::new()).await
            }
            Operation::ReplaceById { id, data, .. } => {
                self.check_data(storage, data, false, vec![id.clone()]).await
            }
            Operation::PatchById { id, data, .. } => {
                self.check_data(storage, data, true, vec![id.clone()]).await
            }
            Operation::ReplaceOrCreate { data, .. } => {
                let mut replaced = Vec::new();
                if let Some(id) = data.get(&self.primary_key).filter(|id| !id.is_null()) {
                    if storage.exists(self.model, id.clone()).await? {
                        replaced.push(id.clone());
                    }
                }
                self.check_data(storage, data, false, replaced).await
            }
            Operation::Patch {
                data, where_clause, ..
            } => self.check_patch(storage, data, where_clause.clone()).await,
            _ => Ok(()),
        }
    }

    /// Whether the property takes part in the check for this payload
    fn is_checked(&self, property: &UniqueProperty, data: &Record, partial: bool) -> bool {
        if partial && !data.contains_key(&property.name) {
            return false;
        }
        property.uniqueness == PropertyUniqueness::Strict
            || !self
                .schema
                .empty_values()
                .is_empty(property.data_type, data.get(&property.name))
    }

    async fn check_data(
        &self,
        storage: &dyn Adapter,
        data: &Record,
        partial: bool,
        excluded_ids: Vec<Value>,
    ) -> ModelResult<()> {
        for property in &self.properties {
            if !self.is_checked(property, data, partial) {
                continue;
            }

            let value = data.get(&property.name).cloned().unwrap_or(Value::Null);
            let mut clause = WhereClause::eq(property.name.clone(), value.clone());
            if !excluded_ids.is_empty() {
                clause = clause.and(WhereClause::condition(
                    self.primary_key.clone(),
                    Operator::Nin(excluded_ids.clone()),
                ));
            }

            if storage.count(self.model, Some(clause)).await? > 0 {
                return Err(ModelError::invalid_argument(format!(
                    "An existing document of the model {:?} already has the property {:?} with the value {} and should be unique.",
                    self.model,
                    property.name,
                    describe_value(Some(&value))
                )));
            }
        }
        Ok(())
    }

    async fn check_patch(
        &self,
        storage: &dyn Adapter,
        data: &Record,
        where_clause: Option<WhereClause>,
    ) -> ModelResult<()> {
        let touched: Vec<&UniqueProperty> = self
            .properties
            .iter()
            .filter(|property| self.is_checked(property, data, true))
            .collect();
        if touched.is_empty() {
            return Ok(());
        }

        let mut filter = Filter::new().fields([self.primary_key.clone()]);
        filter.where_clause = where_clause;
        let matched: Vec<Value> = storage
            .find(self.model, Some(filter))
            .await?
            .into_iter()
            .filter_map(|mut record| record.remove(&self.primary_key))
            .collect();

        match matched.len() {
            0 => Ok(()),
            1 => self.check_data(storage, data, true, matched).await,
            count => {
                let property = touched[0];
                Err(ModelError::invalid_argument(format!(
                    "The property {:?} of the model {:?} should be unique, but the patch would assign the value {} to {} documents.",
                    property.name,
                    self.model,
                    describe_value(data.get(&property.name)),
                    count
                )))
            }
        }
    }
}
