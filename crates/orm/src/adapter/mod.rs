//! Adapter contract and decoration pipeline
//!
//! A concrete [`Adapter`] implements plain storage semantics. A
//! [`DecoratedAdapter`] wraps one and runs every CRUD call through an
//! ordered [`Pipeline`] of middleware stages before it reaches storage.

pub mod decorated;
pub mod decorators;
pub mod operation;
pub mod pipeline;

pub use decorated::{AdapterContext, DecoratedAdapter};
pub use operation::{Operation, Output};
pub use pipeline::{Call, CallHandle, Middleware, Next, NextFuture, Pipeline};

use crate::filter::{Filter, WhereClause};
use async_trait::async_trait;
use modelkit_core::{ModelError, ModelResult, Record};
use serde_json::Value;

/// Last path segment of a type name, without generic arguments
pub(crate) fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Storage adapter contract.
///
/// Every operation is unimplemented by default and fails with
/// [`ModelError::NotImplemented`] naming the adapter and the method, so an
/// adapter only provides what its storage supports. Records are keyed by
/// property names on both sides of the contract.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Name used in error messages, the type name by default
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Insert a record and return it as stored
    async fn create(
        &self,
        model: &str,
        data: Record,
        filter: Option<Filter>,
    ) -> ModelResult<Record> {
        let _ = (model, data, filter);
        Err(ModelError::not_implemented(self.name(), "create"))
    }

    /// Replace every stored property of an existing record
    async fn replace_by_id(
        &self,
        model: &str,
        id: Value,
        data: Record,
        filter: Option<Filter>,
    ) -> ModelResult<Record> {
        let _ = (model, id, data, filter);
        Err(ModelError::not_implemented(self.name(), "replace_by_id"))
    }

    /// Replace the record identified by the payload's primary key, or create it
    async fn replace_or_create(
        &self,
        model: &str,
        data: Record,
        filter: Option<Filter>,
    ) -> ModelResult<Record> {
        let _ = (model, data, filter);
        Err(ModelError::not_implemented(self.name(), "replace_or_create"))
    }

    /// Merge the given properties into every matching record, returning the count
    async fn patch(
        &self,
        model: &str,
        data: Record,
        where_clause: Option<WhereClause>,
    ) -> ModelResult<usize> {
        let _ = (model, data, where_clause);
        Err(ModelError::not_implemented(self.name(), "patch"))
    }

    /// Merge the given properties into an existing record
    async fn patch_by_id(
        &self,
        model: &str,
        id: Value,
        data: Record,
        filter: Option<Filter>,
    ) -> ModelResult<Record> {
        let _ = (model, id, data, filter);
        Err(ModelError::not_implemented(self.name(), "patch_by_id"))
    }

    async fn find(&self, model: &str, filter: Option<Filter>) -> ModelResult<Vec<Record>> {
        let _ = (model, filter);
        Err(ModelError::not_implemented(self.name(), "find"))
    }

    /// Find a record by primary key; a missing record is an error
    async fn find_by_id(
        &self,
        model: &str,
        id: Value,
        filter: Option<Filter>,
    ) -> ModelResult<Record> {
        let _ = (model, id, filter);
        Err(ModelError::not_implemented(self.name(), "find_by_id"))
    }

    /// Remove every matching record, returning the count
    async fn delete(&self, model: &str, where_clause: Option<WhereClause>) -> ModelResult<usize> {
        let _ = (model, where_clause);
        Err(ModelError::not_implemented(self.name(), "delete"))
    }

    /// Remove a record by primary key, returning whether it existed
    async fn delete_by_id(&self, model: &str, id: Value) -> ModelResult<bool> {
        let _ = (model, id);
        Err(ModelError::not_implemented(self.name(), "delete_by_id"))
    }

    async fn exists(&self, model: &str, id: Value) -> ModelResult<bool> {
        let _ = (model, id);
        Err(ModelError::not_implemented(self.name(), "exists"))
    }

    async fn count(&self, model: &str, where_clause: Option<WhereClause>) -> ModelResult<usize> {
        let _ = (model, where_clause);
        Err(ModelError::not_implemented(self.name(), "count"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BareAdapter;

    impl Adapter for BareAdapter {}

    struct Wrapper<T>(T);

    impl<T: Send + Sync> Adapter for Wrapper<T> {}

    #[tokio::test]
    async fn test_default_methods_are_not_implemented() {
        let adapter = BareAdapter;
        let err = adapter.create("model", Record::new(), None).await.unwrap_err();
        assert!(err.is_not_implemented());
        assert_eq!(err.to_string(), "BareAdapter.create is not implemented");

        let err = adapter.count("model", None).await.unwrap_err();
        assert_eq!(err.to_string(), "BareAdapter.count is not implemented");

        let err = adapter.delete_by_id("model", Value::Null).await.unwrap_err();
        assert_eq!(err.to_string(), "BareAdapter.delete_by_id is not implemented");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(Wrapper(1u8).name(), "Wrapper");
        assert_eq!(short_type_name("a::b::C<d::E>"), "C");
        assert_eq!(short_type_name("C"), "C");
    }
}
