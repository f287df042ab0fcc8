//! In-memory storage adapter
//!
//! One ordered table per storage table name, created on the first write.
//! Rows are stored column-keyed under the canonical key of their primary
//! key value, alongside a per-table identifier counter.

use crate::adapter::Adapter;
use crate::filter::{project, Filter, WhereClause};
use async_trait::async_trait;
use indexmap::IndexMap;
use modelkit_core::value::value_key;
use modelkit_core::{ModelError, ModelResult, Record, Schema};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct Table {
    rows: IndexMap<String, Record>,
    last_id: i64,
}

/// Primary key naming of a model, resolved once per call
struct KeyNames {
    property: String,
    column: String,
}

/// Reference implementation of the adapter contract over process memory
#[derive(Debug)]
pub struct MemoryAdapter {
    schema: Arc<Schema>,
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryAdapter {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Number of rows stored for a model
    pub fn row_count(&self, model: &str) -> ModelResult<usize> {
        let table = self.schema.table_name(model)?;
        Ok(self.tables.read().get(&table).map_or(0, |table| table.rows.len()))
    }

    fn key_names(&self, model: &str) -> ModelResult<KeyNames> {
        Ok(KeyNames {
            property: self.schema.primary_key_property_name(model)?,
            column: self.schema.primary_key_column_name(model)?,
        })
    }

    /// Run a closure against the table of a model, creating it if needed
    fn with_table<R>(
        &self,
        model: &str,
        action: impl FnOnce(&mut Table) -> ModelResult<R>,
    ) -> ModelResult<R> {
        let name = self.schema.table_name(model)?;
        let mut tables = self.tables.write();
        let table = tables.entry(name).or_insert_with_key(|name| {
            tracing::debug!("Created the memory table {:?} for the model {:?}", name, model);
            Table::default()
        });
        action(table)
    }

    /// Property-keyed rows with defaults applied, paired with their row keys.
    /// Reading never creates a table.
    fn rows(&self, model: &str) -> ModelResult<Vec<(String, Record)>> {
        let name = self.schema.table_name(model)?;
        let tables = self.tables.read();
        match tables.get(&name) {
            Some(table) => self.table_rows(model, table),
            None => Ok(Vec::new()),
        }
    }

    fn table_rows(&self, model: &str, table: &Table) -> ModelResult<Vec<(String, Record)>> {
        table
            .rows
            .iter()
            .map(|(key, columns)| {
                let record = self.to_properties(model, columns.clone())?;
                Ok((key.clone(), record))
            })
            .collect()
    }

    fn to_properties(&self, model: &str, columns: Record) -> ModelResult<Record> {
        let record = self.schema.convert_column_names_to_property_names(model, columns)?;
        self.schema.apply_defaults(model, record, false)
    }

    /// Keys of the rows of a table matching a where clause, in storage order
    fn matching_keys(
        &self,
        model: &str,
        table: &Table,
        where_clause: Option<&WhereClause>,
    ) -> ModelResult<Vec<String>> {
        Ok(self
            .table_rows(model, table)?
            .into_iter()
            .filter(|(_, record)| where_clause.map_or(true, |clause| clause.matches(record)))
            .map(|(key, _)| key)
            .collect())
    }

    fn is_empty_id(id: Option<&Value>) -> bool {
        match id {
            None | Some(Value::Null) => true,
            Some(Value::Number(number)) => number.as_f64() == Some(0.0),
            Some(Value::String(text)) => text.is_empty(),
            Some(_) => false,
        }
    }

    /// Next free numeric identifier of a table
    fn generate_id(&self, model: &str, keys: &KeyNames, table: &mut Table) -> ModelResult<Value> {
        let key_type = self.schema.primary_key_type(model)?;
        if !key_type.supports_generated_id() {
            return Err(ModelError::invalid_argument(format!(
                "The memory adapter is able to generate only Number identifiers, but the primary key {:?} of the model {:?} is defined as {}. Do provide your own value for the {:?} property.",
                keys.property, model, key_type, keys.property
            )));
        }

        loop {
            table.last_id += 1;
            let id = Value::from(table.last_id);
            if !table.rows.contains_key(&value_key(&id)) {
                tracing::debug!("Generated the identifier {} for the model {:?}", id, model);
                return Ok(id);
            }
        }
    }

    fn insert(
        &self,
        model: &str,
        keys: &KeyNames,
        table: &mut Table,
        mut data: Record,
    ) -> ModelResult<Record> {
        let id = match data.get(&keys.property) {
            Some(id) if !Self::is_empty_id(Some(id)) => id.clone(),
            _ => self.generate_id(model, keys, table)?,
        };
        let key = value_key(&id);
        if table.rows.contains_key(&key) {
            return Err(ModelError::duplicate_primary_key(model, &keys.property, &id));
        }

        data.insert(keys.property.clone(), id);
        let columns = self
            .schema
            .convert_property_names_to_column_names(model, data)?;
        table.rows.insert(key, columns.clone());
        self.to_properties(model, columns)
    }

    fn replace(
        &self,
        model: &str,
        keys: &KeyNames,
        table: &mut Table,
        id: &Value,
        mut data: Record,
    ) -> ModelResult<Record> {
        let Some(stored) = table.rows.get_mut(&value_key(id)) else {
            return Err(ModelError::primary_key_not_found(model, &keys.property, id));
        };

        let stored_id = stored.get(&keys.column).cloned().unwrap_or_else(|| id.clone());
        data.insert(keys.property.clone(), stored_id);
        *stored = self
            .schema
            .convert_property_names_to_column_names(model, data)?;
        self.to_properties(model, stored.clone())
    }

    /// Merge column-keyed changes into a stored row; the primary key is kept
    fn merge(stored: &mut Record, changes: &Record, key_column: &str) {
        for (column, value) in changes {
            if column != key_column {
                stored.insert(column.clone(), value.clone());
            }
        }
    }

    fn find_rows(&self, model: &str, filter: Option<&Filter>) -> ModelResult<Vec<Record>> {
        let rows: Vec<Record> = self.rows(model)?.into_iter().map(|(_, record)| record).collect();
        let Some(filter) = filter else {
            return Ok(rows);
        };

        let rows = filter.apply(rows);
        match &filter.fields {
            Some(fields) => {
                let keys = self.key_names(model)?;
                Ok(rows
                    .into_iter()
                    .map(|row| project(row, fields, &[keys.property.as_str()]))
                    .collect())
            }
            None => Ok(rows),
        }
    }
}

#[async_trait]
impl Adapter for MemoryAdapter {
    async fn create(
        &self,
        model: &str,
        data: Record,
        _filter: Option<Filter>,
    ) -> ModelResult<Record> {
        let keys = self.key_names(model)?;
        self.with_table(model, |table| self.insert(model, &keys, table, data))
    }

    async fn replace_by_id(
        &self,
        model: &str,
        id: Value,
        data: Record,
        _filter: Option<Filter>,
    ) -> ModelResult<Record> {
        let keys = self.key_names(model)?;
        self.with_table(model, |table| self.replace(model, &keys, table, &id, data))
    }

    async fn replace_or_create(
        &self,
        model: &str,
        data: Record,
        _filter: Option<Filter>,
    ) -> ModelResult<Record> {
        let keys = self.key_names(model)?;
        self.with_table(model, |table| {
            let existing = data
                .get(&keys.property)
                .filter(|id| !Self::is_empty_id(Some(*id)))
                .filter(|id| table.rows.contains_key(&value_key(id)))
                .cloned();
            match existing {
                Some(id) => self.replace(model, &keys, table, &id, data),
                None => self.insert(model, &keys, table, data),
            }
        })
    }

    async fn patch(
        &self,
        model: &str,
        data: Record,
        where_clause: Option<WhereClause>,
    ) -> ModelResult<usize> {
        let keys = self.key_names(model)?;
        let changes = self
            .schema
            .convert_property_names_to_column_names(model, data)?;

        self.with_table(model, |table| {
            let matched = self.matching_keys(model, table, where_clause.as_ref())?;
            let mut patched = 0;
            for key in &matched {
                if let Some(stored) = table.rows.get_mut(key) {
                    Self::merge(stored, &changes, &keys.column);
                    patched += 1;
                }
            }
            Ok(patched)
        })
    }

    async fn patch_by_id(
        &self,
        model: &str,
        id: Value,
        data: Record,
        _filter: Option<Filter>,
    ) -> ModelResult<Record> {
        let keys = self.key_names(model)?;
        let changes = self
            .schema
            .convert_property_names_to_column_names(model, data)?;

        self.with_table(model, |table| {
            let Some(stored) = table.rows.get_mut(&value_key(&id)) else {
                return Err(ModelError::primary_key_not_found(model, &keys.property, &id));
            };
            Self::merge(stored, &changes, &keys.column);
            self.to_properties(model, stored.clone())
        })
    }

    async fn find(&self, model: &str, filter: Option<Filter>) -> ModelResult<Vec<Record>> {
        self.find_rows(model, filter.as_ref())
    }

    async fn find_by_id(
        &self,
        model: &str,
        id: Value,
        filter: Option<Filter>,
    ) -> ModelResult<Record> {
        let keys = self.key_names(model)?;
        let table = self.schema.table_name(model)?;
        let columns = self
            .tables
            .read()
            .get(&table)
            .and_then(|table| table.rows.get(&value_key(&id)).cloned())
            .ok_or_else(|| ModelError::primary_key_not_found(model, &keys.property, &id))?;

        let record = self.to_properties(model, columns)?;
        Ok(match filter.and_then(|filter| filter.fields) {
            Some(fields) => project(record, &fields, &[keys.property.as_str()]),
            None => record,
        })
    }

    async fn delete(&self, model: &str, where_clause: Option<WhereClause>) -> ModelResult<usize> {
        self.with_table(model, |table| {
            let matched = self.matching_keys(model, table, where_clause.as_ref())?;
            Ok(matched
                .iter()
                .filter(|key| table.rows.shift_remove(*key).is_some())
                .count())
        })
    }

    async fn delete_by_id(&self, model: &str, id: Value) -> ModelResult<bool> {
        self.with_table(model, |table| {
            Ok(table.rows.shift_remove(&value_key(&id)).is_some())
        })
    }

    async fn exists(&self, model: &str, id: Value) -> ModelResult<bool> {
        let table = self.schema.table_name(model)?;
        Ok(self
            .tables
            .read()
            .get(&table)
            .is_some_and(|table| table.rows.contains_key(&value_key(&id))))
    }

    async fn count(&self, model: &str, where_clause: Option<WhereClause>) -> ModelResult<usize> {
        let rows = self.rows(model)?;
        Ok(match where_clause {
            Some(clause) => rows.iter().filter(|(_, record)| clause.matches(record)).count(),
            None => rows.len(),
        })
    }
}
