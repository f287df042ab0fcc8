//! Query Filter Engine
//!
//! A filter clause combines independent sub-clauses, each optional:
//!
//! - `where_clause`: predicate filtering
//! - `order`: stable multi-key sort
//! - `fields`: projection onto a subset of properties
//! - `skip` / `limit`: pagination (`limit: 0` means unlimited)
//! - `include`: related records to attach
//!
//! Every evaluator works on property-keyed records.

pub mod fields;
pub mod include;
pub mod order;
pub mod slice;
pub mod where_clause;

pub use fields::{parse_fields, project};
pub use include::{parse_include, IncludeSpec};
pub use order::{parse_order, sort_records, OrderDirection, OrderKey};
pub use slice::slice;
pub use where_clause::{Operator, Pattern, WhereClause};

use modelkit_core::{ModelError, ModelResult, Record};
use serde_json::Value;

const FILTER_KEYS: &[&str] = &["where", "order", "fields", "skip", "limit", "include"];

/// Combined where/order/fields/skip/limit/include request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub where_clause: Option<WhereClause>,
    pub order: Vec<OrderKey>,
    pub fields: Option<Vec<String>>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    pub include: Vec<IncludeSpec>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON shape `{where, order, fields, skip, limit, include}`
    pub fn from_json(value: &Value) -> ModelResult<Self> {
        let object = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(object) => object,
            other => {
                return Err(ModelError::invalid_argument(format!(
                    "The provided option \"filter\" should be an Object, but {} given.",
                    other
                )))
            }
        };

        if let Some(unknown) = object.keys().find(|key| !FILTER_KEYS.contains(&key.as_str())) {
            return Err(ModelError::invalid_argument(format!(
                "The provided option {:?} of the filter is not supported.",
                unknown
            )));
        }

        let option = |key: &str| object.get(key).unwrap_or(&Value::Null);
        Ok(Self {
            where_clause: match option("where") {
                Value::Null => None,
                clause => Some(WhereClause::from_json(clause)?),
            },
            order: parse_order(option("order"))?,
            fields: parse_fields(option("fields"))?,
            skip: slice::parse_count("skip", option("skip"))?,
            limit: slice::parse_count("limit", option("limit"))?,
            include: parse_include(option("include"))?,
        })
    }

    pub fn where_clause(mut self, clause: WhereClause) -> Self {
        self.where_clause = Some(clause);
        self
    }

    /// Append a sort key given as `"prop"` or `"prop DESC"`
    pub fn order_by(mut self, key: &str) -> ModelResult<Self> {
        self.order.push(OrderKey::parse(key)?);
        Ok(self)
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn include(mut self, include: Vec<IncludeSpec>) -> Self {
        self.include = include;
        self
    }

    /// Apply where, order and skip/limit to property-keyed records.
    /// Projection and inclusion are left to the caller.
    pub fn apply(&self, records: Vec<Record>) -> Vec<Record> {
        let mut records = match &self.where_clause {
            Some(clause) => clause.filter(records),
            None => records,
        };
        sort_records(&mut records, &self.order);
        slice(records, self.skip, self.limit)
    }
}
