//! Adapter decoration
//!
//! [`DecoratedAdapter`] fixes its list of stages at construction and
//! implements the [`Adapter`] contract by sending each call through them
//! down to a concrete adapter. The chain of [`Next`](super::Next) handlers
//! is assembled per call from that list.

use super::operation::{Operation, Output};
use super::pipeline::{Call, CallHandle, NextFuture, Pipeline};
use super::Adapter;
use crate::filter::{Filter, WhereClause};
use crate::transform::TransformerRegistry;
use async_trait::async_trait;
use modelkit_core::{ModelResult, Record, Schema};
use modelkit_validation::ValidatorRegistry;
use serde_json::Value;
use std::sync::Arc;

/// Declarations and function registries shared by the pipeline stages
#[derive(Debug, Clone)]
pub struct AdapterContext {
    pub schema: Arc<Schema>,
    pub validators: Arc<ValidatorRegistry>,
    pub transformers: Arc<TransformerRegistry>,
}

impl AdapterContext {
    /// Context with the built-in validators and transformers
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            validators: Arc::new(ValidatorRegistry::new()),
            transformers: Arc::new(TransformerRegistry::new()),
        }
    }

    pub fn with_validators(mut self, validators: ValidatorRegistry) -> Self {
        self.validators = Arc::new(validators);
        self
    }

    pub fn with_transformers(mut self, transformers: TransformerRegistry) -> Self {
        self.transformers = Arc::new(transformers);
        self
    }
}

/// State shared by every call of one decorated adapter
pub(crate) struct Runtime {
    context: AdapterContext,
    storage: Arc<dyn Adapter>,
    pipeline: Pipeline,
}

impl Runtime {
    pub(crate) fn context(&self) -> &AdapterContext {
        &self.context
    }

    pub(crate) fn storage(&self) -> Arc<dyn Adapter> {
        self.storage.clone()
    }

    /// Send an operation through the pipeline down to storage
    pub(crate) fn run(
        runtime: &Arc<Self>,
        operation: Operation,
        depth: usize,
    ) -> NextFuture<'static> {
        tracing::trace!(
            "{}.{} on the model {:?} (depth {})",
            runtime.storage.name(),
            operation.method(),
            operation.model(),
            depth
        );
        let storage = runtime.storage.clone();
        let call = Call::new(operation, CallHandle::new(runtime.clone(), depth));
        runtime.pipeline.execute(call, move |call: Call| {
            Box::pin(async move { call.operation.dispatch(storage.as_ref()).await })
                as NextFuture<'static>
        })
    }
}

/// A concrete adapter wrapped in a middleware pipeline
#[derive(Clone)]
pub struct DecoratedAdapter {
    runtime: Arc<Runtime>,
}

impl DecoratedAdapter {
    /// Decorate an adapter with the standard pipeline
    pub fn new<A: Adapter + 'static>(adapter: A, context: AdapterContext) -> Self {
        Self::with_pipeline(adapter, context, Pipeline::standard())
    }

    /// Decorate an adapter with a custom pipeline
    pub fn with_pipeline<A: Adapter + 'static>(
        adapter: A,
        context: AdapterContext,
        pipeline: Pipeline,
    ) -> Self {
        tracing::debug!(
            "Decorating the adapter {} with {} stages",
            adapter.name(),
            pipeline.len()
        );
        Self {
            runtime: Arc::new(Runtime {
                context,
                storage: Arc::new(adapter),
                pipeline,
            }),
        }
    }

    /// Names of the pipeline stages, outermost first
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.runtime.pipeline.names()
    }

    pub fn context(&self) -> &AdapterContext {
        &self.runtime.context
    }

    /// The undecorated adapter
    pub fn storage(&self) -> Arc<dyn Adapter> {
        self.runtime.storage()
    }

    /// Run an operation through the pipeline
    pub async fn execute(&self, operation: Operation) -> ModelResult<Output> {
        Runtime::run(&self.runtime, operation, 0).await
    }
}

impl std::fmt::Debug for DecoratedAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoratedAdapter")
            .field("storage", &self.runtime.storage.name())
            .field("stages", &self.stage_names())
            .finish()
    }
}

#[async_trait]
impl Adapter for DecoratedAdapter {
    fn name(&self) -> &str {
        self.runtime.storage.name()
    }

    async fn create(
        &self,
        model: &str,
        data: Record,
        filter: Option<Filter>,
    ) -> ModelResult<Record> {
        self.execute(Operation::Create {
            model: model.to_string(),
            data,
            filter,
        })
        .await?
        .into_record()
    }

    async fn replace_by_id(
        &self,
        model: &str,
        id: Value,
        data: Record,
        filter: Option<Filter>,
    ) -> ModelResult<Record> {
        self.execute(Operation::ReplaceById {
            model: model.to_string(),
            id,
            data,
            filter,
        })
        .await?
        .into_record()
    }

    async fn replace_or_create(
        &self,
        model: &str,
        data: Record,
        filter: Option<Filter>,
    ) -> ModelResult<Record> {
        self.execute(Operation::ReplaceOrCreate {
            model: model.to_string(),
            data,
            filter,
        })
        .await?
        .into_record()
    }

    async fn patch(
        &self,
        model: &str,
        data: Record,
        where_clause: Option<WhereClause>,
    ) -> ModelResult<usize> {
        self.execute(Operation::Patch {
            model: model.to_string(),
            data,
            where_clause,
        })
        .await?
        .into_count()
    }

    async fn patch_by_id(
        &self,
        model: &str,
        id: Value,
        data: Record,
        filter: Option<Filter>,
    ) -> ModelResult<Record> {
        self.execute(Operation::PatchById {
            model: model.to_string(),
            id,
            data,
            filter,
        })
        .await?
        .into_record()
    }

    async fn find(&self, model: &str, filter: Option<Filter>) -> ModelResult<Vec<Record>> {
        self.execute(Operation::Find {
            model: model.to_string(),
            filter,
        })
        .await?
        .into_records()
    }

    async fn find_by_id(
        &self,
        model: &str,
        id: Value,
        filter: Option<Filter>,
    ) -> ModelResult<Record> {
        self.execute(Operation::FindById {
            model: model.to_string(),
            id,
            filter,
        })
        .await?
        .into_record()
    }

    async fn delete(&self, model: &str, where_clause: Option<WhereClause>) -> ModelResult<usize> {
        self.execute(Operation::Delete {
            model: model.to_string(),
            where_clause,
        })
        .await?
        .into_count()
    }

    async fn delete_by_id(&self, model: &str, id: Value) -> ModelResult<bool> {
        self.execute(Operation::DeleteById {
            model: model.to_string(),
            id,
        })
        .await?
        .into_flag()
    }

    async fn exists(&self, model: &str, id: Value) -> ModelResult<bool> {
        self.execute(Operation::Exists {
            model: model.to_string(),
            id,
        })
        .await?
        .into_flag()
    }

    async fn count(&self, model: &str, where_clause: Option<WhereClause>) -> ModelResult<usize> {
        self.execute(Operation::Count {
            model: model.to_string(),
            where_clause,
        })
        .await?
        .into_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::pipeline::{Middleware, Next};
    use modelkit_core::{DataType, ModelDefinition};
    use parking_lot::Mutex;
    use serde_json::json;

    /// Counts rows in memory and records the calls it receives
    #[derive(Default)]
    struct RecordingAdapter {
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Adapter for RecordingAdapter {
        async fn count(&self, model: &str, _where: Option<WhereClause>) -> ModelResult<usize> {
            self.calls.lock().push(format!("count {}", model));
            Ok(7)
        }
    }

    #[derive(Debug)]
    struct Tag {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware for Tag {
        fn handle(&self, call: Call, next: Next) -> NextFuture<'static> {
            let name = self.name;
            let log = self.log.clone();
            Box::pin(async move {
                log.lock().push(format!("before {}", name));
                let output = next.run(call).await;
                log.lock().push(format!("after {}", name));
                output
            })
        }

        fn name(&self) -> &'static str {
            self.name
        }
    }

    fn context() -> AdapterContext {
        let mut schema = Schema::new();
        schema
            .define_model(ModelDefinition::new("model").property("foo", DataType::Number))
            .unwrap();
        AdapterContext::new(Arc::new(schema))
    }

    #[tokio::test]
    async fn test_first_middleware_is_outermost() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let adapter = RecordingAdapter {
            calls: log.clone(),
        };
        let pipeline = Pipeline::new()
            .add(Tag { name: "outer", log: log.clone() })
            .add(Tag { name: "inner", log: log.clone() });
        let decorated = DecoratedAdapter::with_pipeline(adapter, context(), pipeline);

        assert_eq!(decorated.count("model", None).await.unwrap(), 7);
        assert_eq!(
            *log.lock(),
            vec!["before outer", "before inner", "count model", "after inner", "after outer"]
        );
        assert_eq!(decorated.stage_names(), vec!["outer", "inner"]);
    }

    #[tokio::test]
    async fn test_unimplemented_storage_method_surfaces() {
        let decorated = DecoratedAdapter::new(RecordingAdapter::default(), context());
        let err = decorated
            .create("model", json!({"foo": 1}).as_object().cloned().unwrap(), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "RecordingAdapter.create is not implemented");
        assert_eq!(decorated.name(), "RecordingAdapter");
    }

    #[tokio::test]
    async fn test_unknown_model_is_rejected_by_the_standard_pipeline() {
        let decorated = DecoratedAdapter::new(RecordingAdapter::default(), context());
        let err = decorated.count("missing", None).await.unwrap_err();
        assert_eq!(err.to_string(), "The model \"missing\" is not defined.");
    }

    #[tokio::test]
    async fn test_stage_list_is_reused_across_calls() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let adapter = RecordingAdapter {
            calls: log.clone(),
        };
        let pipeline = Pipeline::new().add(Tag { name: "only", log: log.clone() });
        let decorated = DecoratedAdapter::with_pipeline(adapter, context(), pipeline);

        decorated.count("model", None).await.unwrap();
        decorated.count("other", None).await.unwrap();
        assert_eq!(
            *log.lock(),
            vec![
                "before only",
                "count model",
                "after only",
                "before only",
                "count other",
                "after only",
            ]
        );
        assert_eq!(decorated.stage_names(), vec!["only"]);
    }
}
