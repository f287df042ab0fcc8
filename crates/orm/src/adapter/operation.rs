//! CRUD calls as values, so that middleware can inspect and rewrite them

use super::Adapter;
use crate::filter::{Filter, WhereClause};
use modelkit_core::{ModelError, ModelResult, Record};
use serde_json::Value;

/// One adapter call with its arguments
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Create {
        model: String,
        data: Record,
        filter: Option<Filter>,
    },
    ReplaceById {
        model: String,
        id: Value,
        data: Record,
        filter: Option<Filter>,
    },
    ReplaceOrCreate {
        model: String,
        data: Record,
        filter: Option<Filter>,
    },
    Patch {
        model: String,
        data: Record,
        where_clause: Option<WhereClause>,
    },
    PatchById {
        model: String,
        id: Value,
        data: Record,
        filter: Option<Filter>,
    },
    Find {
        model: String,
        filter: Option<Filter>,
    },
    FindById {
        model: String,
        id: Value,
        filter: Option<Filter>,
    },
    Delete {
        model: String,
        where_clause: Option<WhereClause>,
    },
    DeleteById {
        model: String,
        id: Value,
    },
    Exists {
        model: String,
        id: Value,
    },
    Count {
        model: String,
        where_clause: Option<WhereClause>,
    },
}

impl Operation {
    /// Adapter method name
    pub fn method(&self) -> &'static str {
        match self {
            Operation::Create { .. } => "create",
            Operation::ReplaceById { .. } => "replace_by_id",
            Operation::ReplaceOrCreate { .. } => "replace_or_create",
            Operation::Patch { .. } => "patch",
            Operation::PatchById { .. } => "patch_by_id",
            Operation::Find { .. } => "find",
            Operation::FindById { .. } => "find_by_id",
            Operation::Delete { .. } => "delete",
            Operation::DeleteById { .. } => "delete_by_id",
            Operation::Exists { .. } => "exists",
            Operation::Count { .. } => "count",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Operation::Create { model, .. }
            | Operation::ReplaceById { model, .. }
            | Operation::ReplaceOrCreate { model, .. }
            | Operation::Patch { model, .. }
            | Operation::PatchById { model, .. }
            | Operation::Find { model, .. }
            | Operation::FindById { model, .. }
            | Operation::Delete { model, .. }
            | Operation::DeleteById { model, .. }
            | Operation::Exists { model, .. }
            | Operation::Count { model, .. } => model,
        }
    }

    pub fn id(&self) -> Option<&Value> {
        match self {
            Operation::ReplaceById { id, .. }
            | Operation::PatchById { id, .. }
            | Operation::FindById { id, .. }
            | Operation::DeleteById { id, .. }
            | Operation::Exists { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Write payload, for operations that carry one
    pub fn data(&self) -> Option<&Record> {
        match self {
            Operation::Create { data, .. }
            | Operation::ReplaceById { data, .. }
            | Operation::ReplaceOrCreate { data, .. }
            | Operation::Patch { data, .. }
            | Operation::PatchById { data, .. } => Some(data),
            _ => None,
        }
    }

    pub fn data_mut(&mut self) -> Option<&mut Record> {
        match self {
            Operation::Create { data, .. }
            | Operation::ReplaceById { data, .. }
            | Operation::ReplaceOrCreate { data, .. }
            | Operation::Patch { data, .. }
            | Operation::PatchById { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Filter clause, for operations that take a full filter
    pub fn filter(&self) -> Option<&Filter> {
        match self {
            Operation::Create { filter, .. }
            | Operation::ReplaceById { filter, .. }
            | Operation::ReplaceOrCreate { filter, .. }
            | Operation::PatchById { filter, .. }
            | Operation::Find { filter, .. }
            | Operation::FindById { filter, .. } => filter.as_ref(),
            _ => None,
        }
    }

    pub fn filter_mut(&mut self) -> Option<&mut Filter> {
        match self {
            Operation::Create { filter, .. }
            | Operation::ReplaceById { filter, .. }
            | Operation::ReplaceOrCreate { filter, .. }
            | Operation::PatchById { filter, .. }
            | Operation::Find { filter, .. }
            | Operation::FindById { filter, .. } => filter.as_mut(),
            _ => None,
        }
    }

    /// Patch payloads only carry the properties to change
    pub fn is_partial(&self) -> bool {
        matches!(self, Operation::Patch { .. } | Operation::PatchById { .. })
    }

    /// Run the call against an adapter
    pub async fn dispatch(self, adapter: &dyn Adapter) -> ModelResult<Output> {
        Ok(match self {
            Operation::Create { model, data, filter } => {
                Output::Record(adapter.create(&model, data, filter).await?)
            }
            Operation::ReplaceById {
                model,
                id,
                data,
                filter,
            } => Output::Record(adapter.replace_by_id(&model, id, data, filter).await?),
            Operation::ReplaceOrCreate { model, data, filter } => {
                Output::Record(adapter.replace_or_create(&model, data, filter).await?)
            }
            Operation::Patch {
                model,
                data,
                where_clause,
            } => Output::Count(adapter.patch(&model, data, where_clause).await?),
            Operation::PatchById {
                model,
                id,
                data,
                filter,
            } => Output::Record(adapter.patch_by_id(&model, id, data, filter).await?),
            Operation::Find { model, filter } => {
                Output::Records(adapter.find(&model, filter).await?)
            }
            Operation::FindById { model, id, filter } => {
                Output::Record(adapter.find_by_id(&model, id, filter).await?)
            }
            Operation::Delete {
                model,
                where_clause,
            } => Output::Count(adapter.delete(&model, where_clause).await?),
            Operation::DeleteById { model, id } => {
                Output::Flag(adapter.delete_by_id(&model, id).await?)
            }
            Operation::Exists { model, id } => Output::Flag(adapter.exists(&model, id).await?),
            Operation::Count {
                model,
                where_clause,
            } => Output::Count(adapter.count(&model, where_clause).await?),
        })
    }
}

/// Result of an adapter call
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Record(Record),
    Records(Vec<Record>),
    Count(usize),
    Flag(bool),
}

impl Output {
    /// Returned records, empty for counts and flags
    pub fn records_mut(&mut self) -> &mut [Record] {
        match self {
            Output::Record(record) => std::slice::from_mut(record),
            Output::Records(records) => records.as_mut_slice(),
            Output::Count(_) | Output::Flag(_) => &mut [],
        }
    }

    pub fn into_record(self) -> ModelResult<Record> {
        match self {
            Output::Record(record) => Ok(record),
            other => Err(other.mismatch("a record")),
        }
    }

    pub fn into_records(self) -> ModelResult<Vec<Record>> {
        match self {
            Output::Records(records) => Ok(records),
            other => Err(other.mismatch("records")),
        }
    }

    pub fn into_count(self) -> ModelResult<usize> {
        match self {
            Output::Count(count) => Ok(count),
            other => Err(other.mismatch("a count")),
        }
    }

    pub fn into_flag(self) -> ModelResult<bool> {
        match self {
            Output::Flag(flag) => Ok(flag),
            other => Err(other.mismatch("a flag")),
        }
    }

    fn mismatch(&self, expected: &str) -> ModelError {
        ModelError::invalid_argument(format!(
            "The adapter pipeline returned {:?} where {} was expected.",
            self, expected
        ))
    }
}
